//! Outgoing request body types.
//!
//! - [`RequestBody`]: the body installed on an envelope once encoding has finished
//! - [`BodyValue`]: the payload handed to the encoder, in one of three shapes

use std::borrow::Cow;
use std::convert::Infallible;
use std::fmt;
use std::io::Read;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use http_body::{Body as HttpBody, Frame, SizeHint};
use serde::Serialize;

/// The body of an outgoing request.
///
/// A `RequestBody` is a single-consumption stream: polling it yields the whole buffer as one
/// data frame and then ends. Cloning the underlying [`Bytes`] is cheap, so every call to
/// [`RequestBody::once`] gives an independent view over the same buffer.
#[derive(Debug, Default)]
pub struct RequestBody {
    inner: Option<Bytes>,
}

impl RequestBody {
    pub fn empty() -> Self {
        Self { inner: None }
    }

    pub fn once(bytes: Bytes) -> Self {
        if bytes.is_empty() { Self::empty() } else { Self { inner: Some(bytes) } }
    }

    /// Number of bytes left to read, zero once the body has been consumed.
    pub fn len(&self) -> usize {
        self.inner.as_ref().map_or(0, Bytes::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Takes the remaining bytes out of the body, leaving it consumed.
    pub fn take(&mut self) -> Option<Bytes> {
        self.inner.take()
    }
}

impl From<Bytes> for RequestBody {
    fn from(bytes: Bytes) -> Self {
        Self::once(bytes)
    }
}

impl From<()> for RequestBody {
    fn from((): ()) -> Self {
        Self::empty()
    }
}

impl HttpBody for RequestBody {
    type Data = Bytes;
    type Error = Infallible;

    fn poll_frame(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        Poll::Ready(self.get_mut().inner.take().map(|bytes| Ok(Frame::data(bytes))))
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_none()
    }

    fn size_hint(&self) -> SizeHint {
        SizeHint::with_exact(self.len() as u64)
    }
}

/// A value that can render itself as JSON text.
///
/// Implemented for every [`Serialize`] type so that [`BodyValue::Structured`] can hold any of
/// them behind a trait object; serialization is deferred until the body is encoded.
pub trait ToJson {
    fn to_json(&self) -> serde_json::Result<Vec<u8>>;
}

impl<T: Serialize + ?Sized> ToJson for T {
    fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

/// The payload of a request, before encoding.
///
/// # Variants
///
/// * `Text` - sent verbatim as its UTF-8 bytes
/// * `Structured` - serialized to JSON when the body is encoded
/// * `Stream` - an open reader; dropping it releases whatever resource backs it
pub enum BodyValue<'a> {
    Text(Cow<'a, str>),
    Structured(Box<dyn ToJson + 'a>),
    Stream(Box<dyn Read + 'a>),
}

impl<'a> BodyValue<'a> {
    /// The absent body. It is still compressed into a valid, empty frame.
    pub fn empty() -> Self {
        Self::Text(Cow::Borrowed(""))
    }

    pub fn text<S: Into<Cow<'a, str>>>(text: S) -> Self {
        Self::Text(text.into())
    }

    pub fn json<T: Serialize + 'a>(value: T) -> Self {
        Self::Structured(Box::new(value))
    }

    pub fn stream<R: Read + 'a>(reader: R) -> Self {
        Self::Stream(Box::new(reader))
    }

    /// Returns the variant name, used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            BodyValue::Text(_) => "text",
            BodyValue::Structured(_) => "structured",
            BodyValue::Stream(_) => "stream",
        }
    }
}

impl fmt::Debug for BodyValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BodyValue::Text(text) => f.debug_tuple("Text").field(text).finish(),
            BodyValue::Structured(_) => f.write_str("Structured(..)"),
            BodyValue::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

impl<'a> From<&'a str> for BodyValue<'a> {
    fn from(value: &'a str) -> Self {
        Self::Text(Cow::Borrowed(value))
    }
}

impl From<String> for BodyValue<'_> {
    fn from(value: String) -> Self {
        Self::Text(Cow::Owned(value))
    }
}

impl From<serde_json::Value> for BodyValue<'_> {
    fn from(value: serde_json::Value) -> Self {
        Self::json(value)
    }
}
