//! The capability set the body encoder needs from an outgoing request.

use http::{HeaderName, HeaderValue, Request, header};

use crate::protocol::RequestBody;

/// An outgoing request under construction.
///
/// The encoder only ever reads and writes headers, installs a body and declares its length,
/// so anything offering those four operations can be encoded into. Header names are
/// case-insensitive and a later [`set_header`](Envelope::set_header) replaces earlier values.
#[cfg_attr(test, mockall::automock)]
pub trait Envelope {
    fn header(&self, name: &HeaderName) -> Option<HeaderValue>;

    fn set_header(&mut self, name: HeaderName, value: HeaderValue);

    /// Replaces the body with an already encoded one.
    fn install_body(&mut self, body: RequestBody);

    fn set_content_length(&mut self, length: u64);
}

/// A plain `http::Request` is an envelope; its declared length lives in the `Content-Length` header.
impl Envelope for Request<RequestBody> {
    fn header(&self, name: &HeaderName) -> Option<HeaderValue> {
        self.headers().get(name).cloned()
    }

    fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers_mut().insert(name, value);
    }

    fn install_body(&mut self, body: RequestBody) {
        *self.body_mut() = body;
    }

    fn set_content_length(&mut self, length: u64) {
        self.headers_mut().insert(header::CONTENT_LENGTH, length.into());
    }
}
