//! Encoding a [`BodyValue`] into a compressed request body.
//!
//! [`BodyEncoder::encode`] is the whole pipeline: the value is normalized into a byte
//! source, piped through a [`Compressor`], and only once the compressed frame is complete
//! are the envelope's headers, body and length written.

use std::borrow::Cow;
use std::io;
use std::io::{Cursor, Read, Write};

use bytes::Bytes;
use http::{HeaderValue, header};
use tracing::{debug, error, trace};

use crate::codec::compressor::{Compressor, Writer};
use crate::codec::{CompressionLevel, ContentEncoding};
use crate::protocol::{BodyError, BodyValue, Envelope, RequestBody};

/// Initial capacity of the buffer the compressed body accumulates in.
const DEFAULT_BUFFER_CAPACITY: usize = 4 * 1024;

pub(crate) const APPLICATION_JSON: HeaderValue = HeaderValue::from_static("application/json");

/// Compresses request bodies and installs them on an [`Envelope`].
///
/// The encoder is plain configuration, so one instance can be shared between threads and
/// used for any number of envelopes.
///
/// # Example
///
/// ```
/// use micro_search::codec::{BodyEncoder, ContentEncoding};
/// use micro_search::protocol::{BodyValue, RequestBody};
///
/// let encoder = BodyEncoder::builder().encoding(ContentEncoding::Gzip).build();
///
/// let mut request = http::Request::new(RequestBody::empty());
/// encoder.encode(&mut request, BodyValue::text("hello")).unwrap();
///
/// assert_eq!(request.headers()[http::header::CONTENT_ENCODING], "gzip");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyEncoder {
    encoding: ContentEncoding,
    level: CompressionLevel,
    buffer_capacity: usize,
}

impl Default for BodyEncoder {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl BodyEncoder {
    pub fn builder() -> BodyEncoderBuilder {
        BodyEncoderBuilder::new()
    }

    pub fn new(encoding: ContentEncoding) -> Self {
        Self::builder().encoding(encoding).build()
    }

    pub fn encoding(&self) -> ContentEncoding {
        self.encoding
    }

    pub fn level(&self) -> CompressionLevel {
        self.level
    }

    /// Encodes `value` and installs the result on `envelope`.
    ///
    /// On success the envelope carries the compressed body, `Content-Encoding`, the exact
    /// compressed length and, for structured values, `Content-Type: application/json`.
    /// On error the envelope is left untouched.
    ///
    /// # Errors
    ///
    /// * [`BodyError::Serialization`] if a structured value fails to serialize
    /// * [`BodyError::Encoding`] if reading the source or compressing fails
    pub fn encode<E>(&self, envelope: &mut E, value: BodyValue<'_>) -> Result<(), BodyError>
    where
        E: Envelope + ?Sized,
    {
        let encoded = self.encode_body(value)?;
        encoded.commit(envelope);
        Ok(())
    }

    /// Runs the pipeline without touching any envelope.
    pub fn encode_body(&self, value: BodyValue<'_>) -> Result<EncodedBody, BodyError> {
        let kind = value.kind();
        let (source, content_type) = normalize(value)?;

        let compressor = Compressor::new(self.encoding, self.level, Writer::with_capacity(self.buffer_capacity))
            .inspect_err(|e| error!(encoding = %self.encoding, cause = %e, "failed to open compressor"))?;

        let bytes = pipe(source, compressor)
            .inspect_err(|e| error!(encoding = %self.encoding, kind, cause = %e, "failed to compress request body"))?
            .freeze();

        debug!(encoding = %self.encoding, kind, size = bytes.len(), "encoded request body");
        Ok(EncodedBody { bytes, encoding: self.encoding, content_type })
    }
}

/// Turns a body value into a readable source, serializing structured values on the way.
fn normalize(value: BodyValue<'_>) -> Result<(Box<dyn Read + '_>, Option<HeaderValue>), BodyError> {
    let normalized: (Box<dyn Read + '_>, _) = match value {
        BodyValue::Text(Cow::Borrowed(text)) => (Box::new(text.as_bytes()), None),
        BodyValue::Text(Cow::Owned(text)) => (Box::new(Cursor::new(text)), None),
        BodyValue::Structured(structured) => {
            let json = structured
                .to_json()
                .inspect_err(|e| error!(cause = %e, "failed to serialize request body"))?;
            (Box::new(Cursor::new(json)), Some(APPLICATION_JSON))
        }
        BodyValue::Stream(reader) => (reader, None),
    };
    Ok(normalized)
}

/// Copies `source` into `compressor` and finishes the frame.
///
/// `source` is owned here, so it is dropped on every return path; on success that happens
/// before the compressor writes its trailer.
fn pipe<W: Write>(mut source: Box<dyn Read + '_>, mut compressor: Compressor<W>) -> io::Result<W> {
    let copied = io::copy(&mut source, &mut compressor)?;
    drop(source);
    trace!(copied, "request body source drained and released");

    compressor.finish()
}

/// A finished, compressed body waiting to be installed on an envelope.
#[derive(Debug, Clone)]
pub struct EncodedBody {
    bytes: Bytes,
    encoding: ContentEncoding,
    content_type: Option<HeaderValue>,
}

impl EncodedBody {
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn encoding(&self) -> ContentEncoding {
        self.encoding
    }

    pub fn content_type(&self) -> Option<&HeaderValue> {
        self.content_type.as_ref()
    }

    /// Writes headers, body and length to the envelope.
    pub fn commit<E: Envelope + ?Sized>(self, envelope: &mut E) {
        if let Some(content_type) = self.content_type {
            envelope.set_header(header::CONTENT_TYPE, content_type);
        }

        if let Some(previous) = envelope.header(&header::CONTENT_ENCODING) {
            trace!(?previous, encoding = %self.encoding, "replacing content-encoding");
        }
        envelope.set_header(header::CONTENT_ENCODING, self.encoding.header_value());

        let length = self.bytes.len() as u64;
        envelope.install_body(RequestBody::once(self.bytes));
        envelope.set_content_length(length);
    }
}

/// Builder for [`BodyEncoder`].
///
/// Defaults to gzip at the default level with a 4 KiB initial buffer.
#[derive(Debug, Clone, Copy)]
pub struct BodyEncoderBuilder {
    encoding: ContentEncoding,
    level: CompressionLevel,
    buffer_capacity: usize,
}

impl BodyEncoderBuilder {
    fn new() -> Self {
        Self { encoding: ContentEncoding::default(), level: CompressionLevel::default(), buffer_capacity: DEFAULT_BUFFER_CAPACITY }
    }

    pub fn encoding(mut self, encoding: ContentEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn level(mut self, level: CompressionLevel) -> Self {
        self.level = level;
        self
    }

    pub fn buffer_capacity(mut self, buffer_capacity: usize) -> Self {
        self.buffer_capacity = buffer_capacity;
        self
    }

    pub fn build(self) -> BodyEncoder {
        BodyEncoder { encoding: self.encoding, level: self.level, buffer_capacity: self.buffer_capacity }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::compressor::tests::{LimitedWriter, decompress};
    use crate::protocol::MockEnvelope;
    use http::Request;
    use mockall::predicate::eq;
    use serde::{Serialize, Serializer};
    use serde_json::{Value, json};
    use std::cell::Cell;
    use std::collections::HashMap;
    use std::rc::Rc;

    fn new_request() -> Request<RequestBody> {
        let mut request = Request::new(RequestBody::empty());
        request.headers_mut().insert(header::USER_AGENT, HeaderValue::from_static("micro-search/test"));
        request
    }

    fn body_bytes(request: &mut Request<RequestBody>) -> Bytes {
        request.body_mut().take().unwrap_or_default()
    }

    fn content_length(request: &Request<RequestBody>) -> u64 {
        request.headers()[header::CONTENT_LENGTH].to_str().unwrap().parse().unwrap()
    }

    /// A reader that records when it is dropped, optionally failing after `fail_after` bytes.
    struct TrackedReader {
        inner: Cursor<Vec<u8>>,
        fail_after: Option<u64>,
        released: Rc<Cell<u32>>,
    }

    impl TrackedReader {
        fn new(data: &[u8], released: &Rc<Cell<u32>>) -> Self {
            Self { inner: Cursor::new(data.to_vec()), fail_after: None, released: Rc::clone(released) }
        }

        fn failing(data: &[u8], fail_after: u64, released: &Rc<Cell<u32>>) -> Self {
            Self { inner: Cursor::new(data.to_vec()), fail_after: Some(fail_after), released: Rc::clone(released) }
        }
    }

    impl Read for TrackedReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.fail_after {
                Some(limit) if self.inner.position() >= limit => Err(io::Error::other("connection reset")),
                Some(limit) => {
                    let remaining = usize::try_from(limit - self.inner.position()).unwrap();
                    let end = buf.len().min(remaining);
                    self.inner.read(&mut buf[..end])
                }
                None => self.inner.read(buf),
            }
        }
    }

    impl Drop for TrackedReader {
        fn drop(&mut self) {
            self.released.set(self.released.get() + 1);
        }
    }

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("cycle detected"))
        }
    }

    #[test]
    fn text_hello() {
        let mut request = new_request();
        BodyEncoder::default().encode(&mut request, BodyValue::text("hello")).unwrap();

        assert_eq!(request.headers()[header::CONTENT_ENCODING], "gzip");
        assert!(request.headers().get(header::CONTENT_TYPE).is_none());

        let length = content_length(&request);
        let bytes = body_bytes(&mut request);
        assert!(length > 0);
        assert_eq!(length, bytes.len() as u64);
        assert_eq!(decompress(ContentEncoding::Gzip, &bytes), b"hello");
    }

    #[test]
    fn owned_text() {
        let text = "the quick brown fox ".repeat(100);
        let mut request = new_request();
        BodyEncoder::default().encode(&mut request, BodyValue::from(text.clone())).unwrap();

        let bytes = body_bytes(&mut request);
        assert!(bytes.len() < text.len());
        assert_eq!(decompress(ContentEncoding::Gzip, &bytes), text.as_bytes());
    }

    #[test]
    fn structured_map() {
        let mut query = HashMap::new();
        query.insert("q", "foo");

        let mut request = new_request();
        BodyEncoder::default().encode(&mut request, BodyValue::json(&query)).unwrap();

        assert_eq!(request.headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(request.headers()[header::CONTENT_ENCODING], "gzip");

        let length = content_length(&request);
        let bytes = body_bytes(&mut request);
        assert_eq!(length, bytes.len() as u64);

        let decoded: Value = serde_json::from_slice(&decompress(ContentEncoding::Gzip, &bytes)).unwrap();
        assert_eq!(decoded, json!({"q": "foo"}));
    }

    #[test]
    fn structured_struct() {
        #[derive(Serialize)]
        struct Search<'a> {
            index: &'a str,
            size: u32,
            terms: Vec<&'a str>,
        }

        let search = Search { index: "docs", size: 10, terms: vec!["rust", "http"] };
        let mut request = new_request();
        BodyEncoder::new(ContentEncoding::Zstd).encode(&mut request, BodyValue::json(search)).unwrap();

        assert_eq!(request.headers()[header::CONTENT_ENCODING], "zstd");
        let bytes = body_bytes(&mut request);
        let decoded: Value = serde_json::from_slice(&decompress(ContentEncoding::Zstd, &bytes)).unwrap();
        assert_eq!(decoded, json!({"index": "docs", "size": 10, "terms": ["rust", "http"]}));
    }

    #[test]
    fn empty_body_is_still_compressed() {
        let mut request = new_request();
        BodyEncoder::default().encode(&mut request, BodyValue::empty()).unwrap();

        assert_eq!(request.headers()[header::CONTENT_ENCODING], "gzip");

        let length = content_length(&request);
        let bytes = body_bytes(&mut request);
        assert_eq!(length, 20);
        assert_eq!(length, bytes.len() as u64);
        assert!(decompress(ContentEncoding::Gzip, &bytes).is_empty());
    }

    #[test]
    fn empty_stream_is_still_compressed() {
        for encoding in ContentEncoding::ALL {
            let mut request = new_request();
            BodyEncoder::new(encoding).encode(&mut request, BodyValue::stream(io::empty())).unwrap();

            assert_eq!(request.headers()[header::CONTENT_ENCODING], encoding.as_str());
            let length = content_length(&request);
            let bytes = body_bytes(&mut request);
            assert!(length > 0);
            assert_eq!(length, bytes.len() as u64);
            assert!(decompress(encoding, &bytes).is_empty());
        }
    }

    #[test]
    fn every_encoding_round_trips() {
        let payload = r#"{"query":{"match":{"title":"rust"}}}"#.repeat(20);
        for encoding in ContentEncoding::ALL {
            let encoder = BodyEncoder::builder().encoding(encoding).level(CompressionLevel::Precise(5)).buffer_capacity(16).build();
            let mut request = new_request();
            encoder.encode(&mut request, BodyValue::text(payload.as_str())).unwrap();

            assert_eq!(request.headers()[header::CONTENT_ENCODING], encoding.as_str());
            let length = content_length(&request);
            let bytes = body_bytes(&mut request);
            assert_eq!(length, bytes.len() as u64);
            assert_eq!(decompress(encoding, &bytes), payload.as_bytes());
        }
    }

    #[test]
    fn stream_is_released_on_success() {
        let released = Rc::new(Cell::new(0));
        let reader = TrackedReader::new(b"streamed body", &released);

        let mut request = new_request();
        BodyEncoder::default().encode(&mut request, BodyValue::stream(reader)).unwrap();

        assert_eq!(released.get(), 1);
        let bytes = body_bytes(&mut request);
        assert_eq!(decompress(ContentEncoding::Gzip, &bytes), b"streamed body");
    }

    #[test]
    fn stream_is_released_on_read_failure() {
        let released = Rc::new(Cell::new(0));
        let reader = TrackedReader::failing(b"partial body that breaks", 7, &released);

        let mut request = new_request();
        let err = BodyEncoder::default().encode(&mut request, BodyValue::stream(reader)).unwrap_err();

        assert!(err.is_encoding());
        assert_eq!(err.to_string(), "encoding error: connection reset");
        assert_eq!(released.get(), 1);

        assert!(request.headers().get(header::CONTENT_ENCODING).is_none());
        assert!(request.headers().get(header::CONTENT_LENGTH).is_none());
        assert!(request.body().is_empty());
    }

    #[test]
    fn stream_is_released_on_sink_failure() {
        struct BrokenWriter;

        impl Write for BrokenWriter {
            fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
                Err(io::Error::other("sink closed"))
            }

            fn flush(&mut self) -> io::Result<()> {
                Err(io::Error::other("sink closed"))
            }
        }

        let released = Rc::new(Cell::new(0));
        let compressor = Compressor::new(ContentEncoding::Gzip, CompressionLevel::Default, BrokenWriter).unwrap();
        let result = pipe(Box::new(TrackedReader::new(&[b'x'; 64 * 1024], &released)), compressor);

        assert_eq!(result.err().unwrap().to_string(), "sink closed");
        assert_eq!(released.get(), 1);
    }

    #[test]
    fn stream_is_released_when_finishing_fails() {
        let payload = b"{\"title\":\"micro search\"}\n".repeat(32);
        for encoding in ContentEncoding::ALL {
            let released = Rc::new(Cell::new(0));
            let compressor = Compressor::new(encoding, CompressionLevel::Default, LimitedWriter::unlimited()).unwrap();
            let full = pipe(Box::new(TrackedReader::new(&payload, &released)), compressor).unwrap().accepted;
            assert_eq!(released.get(), 1);

            // the copy fits, the trailer does not
            let released = Rc::new(Cell::new(0));
            let compressor =
                Compressor::new(encoding, CompressionLevel::Default, LimitedWriter::with_limit(full.len() - 1)).unwrap();
            let result = pipe(Box::new(TrackedReader::new(&payload, &released)), compressor);

            let err = result.err().unwrap_or_else(|| panic!("{encoding} accepted a truncated frame"));
            assert_eq!(err.to_string(), "sink closed");
            assert_eq!(released.get(), 1, "{encoding} source not released exactly once");
        }
    }

    #[test]
    fn serialization_failure_leaves_request_untouched() {
        let mut request = new_request();
        let err = BodyEncoder::default().encode(&mut request, BodyValue::json(Unserializable)).unwrap_err();

        assert!(err.is_serialization());
        assert!(err.to_string().contains("cycle detected"));

        assert_eq!(request.headers().len(), 1);
        assert_eq!(request.headers()[header::USER_AGENT], "micro-search/test");
        assert!(request.body().is_empty());
    }

    #[test]
    fn non_string_map_keys_fail_to_serialize() {
        let mut bad = HashMap::new();
        bad.insert(vec![1, 2], "value");

        let err = BodyEncoder::default().encode_body(BodyValue::json(bad)).unwrap_err();
        assert!(err.is_serialization());
    }

    #[test]
    fn failed_encode_never_touches_envelope() {
        let mut envelope = MockEnvelope::new();
        envelope.expect_header().never();
        envelope.expect_set_header().never();
        envelope.expect_install_body().never();
        envelope.expect_set_content_length().never();

        let err = BodyEncoder::default().encode(&mut envelope, BodyValue::json(Unserializable)).unwrap_err();
        assert!(err.is_serialization());
    }

    #[test]
    fn commit_sets_headers_then_body_and_length() {
        let encoded = BodyEncoder::new(ContentEncoding::Brotli).encode_body(BodyValue::json(json!({"q": "foo"}))).unwrap();
        let length = encoded.len() as u64;
        assert_eq!(encoded.encoding(), ContentEncoding::Brotli);
        assert_eq!(encoded.content_type(), Some(&APPLICATION_JSON));

        let mut envelope = MockEnvelope::new();
        envelope.expect_header().with(eq(header::CONTENT_ENCODING)).times(1).return_const(None::<HeaderValue>);
        envelope
            .expect_set_header()
            .with(eq(header::CONTENT_TYPE), eq(APPLICATION_JSON))
            .times(1)
            .return_const(());
        envelope
            .expect_set_header()
            .with(eq(header::CONTENT_ENCODING), eq(HeaderValue::from_static("br")))
            .times(1)
            .return_const(());
        envelope.expect_install_body().withf(move |body| body.len() as u64 == length).times(1).return_const(());
        envelope.expect_set_content_length().with(eq(length)).times(1).return_const(());

        encoded.commit(&mut envelope);
    }

    #[test]
    fn encoded_body_reports_its_length() {
        let encoded = BodyEncoder::default().encode_body(BodyValue::text("hello")).unwrap();
        assert!(!encoded.is_empty());
        assert_eq!(encoded.len(), encoded.bytes().len());
        assert_eq!(encoded.content_type(), None);
        assert_eq!(decompress(ContentEncoding::Gzip, encoded.bytes()), b"hello");
    }

    #[test]
    fn encoder_is_shareable_across_threads() {
        let encoder = BodyEncoder::new(ContentEncoding::Deflate);
        let handles: Vec<_> = (0..4)
            .map(|i| {
                std::thread::spawn(move || {
                    let mut request = Request::new(RequestBody::empty());
                    encoder.encode(&mut request, BodyValue::from(format!("body {i}"))).unwrap();
                    let bytes = request.body_mut().take().unwrap();
                    decompress(ContentEncoding::Deflate, &bytes)
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.join().unwrap(), format!("body {i}").into_bytes());
        }
    }

    #[test]
    fn builder_defaults() {
        let encoder = BodyEncoder::default();
        assert_eq!(encoder.encoding(), ContentEncoding::Gzip);
        assert_eq!(encoder.level(), CompressionLevel::Default);
        assert_eq!(encoder, BodyEncoder::new(ContentEncoding::Gzip));
    }
}
