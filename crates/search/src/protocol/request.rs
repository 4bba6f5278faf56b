//! Search service request construction.
//!
//! [`SearchRequest`] wraps an `http::Request<RequestBody>` and stamps it with the headers every
//! call to the search service carries. Bodies are attached through the [`BodyEncoder`], so a
//! request with a body is always compressed.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use http::{HeaderMap, HeaderName, HeaderValue, Method, Request, Uri, header};

use crate::codec::BodyEncoder;
use crate::codec::body_encoder::APPLICATION_JSON;
use crate::ensure;
use crate::protocol::{BodyValue, Envelope, RequestBody, RequestError};

/// The `User-Agent` sent with every request, `micro-search/<version> (<os>-<arch>)`.
pub fn user_agent() -> String {
    format!("micro-search/{} ({}-{})", env!("CARGO_PKG_VERSION"), std::env::consts::OS, std::env::consts::ARCH)
}

/// An outgoing request to the search service.
///
/// The declared content length lives only in the `Content-Length` header, so edits made
/// through [`headers_mut`](SearchRequest::headers_mut) are what [`content_length`](SearchRequest::content_length) reports.
#[derive(Debug)]
pub struct SearchRequest {
    inner: Request<RequestBody>,
}

impl AsRef<Request<RequestBody>> for SearchRequest {
    fn as_ref(&self) -> &Request<RequestBody> {
        &self.inner
    }
}

impl AsMut<Request<RequestBody>> for SearchRequest {
    fn as_mut(&mut self) -> &mut Request<RequestBody> {
        &mut self.inner
    }
}

impl SearchRequest {
    /// Creates a request with the identification headers set:
    /// - `User-Agent`: see [`user_agent`]
    /// - `Accept`: `application/json`
    /// - `Content-Type`: `application/json`
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::Build`] if the method or uri is invalid.
    pub fn new<M, U>(method: M, uri: U) -> Result<Self, RequestError>
    where
        M: TryInto<Method>,
        <M as TryInto<Method>>::Error: Into<http::Error>,
        U: TryInto<Uri>,
        <U as TryInto<Uri>>::Error: Into<http::Error>,
    {
        let inner = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::USER_AGENT, user_agent())
            .header(header::ACCEPT, APPLICATION_JSON)
            .header(header::CONTENT_TYPE, APPLICATION_JSON)
            .body(RequestBody::empty())?;

        Ok(Self { inner })
    }

    pub fn method(&self) -> &Method {
        self.inner.method()
    }

    pub fn uri(&self) -> &Uri {
        self.inner.uri()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        self.inner.headers_mut()
    }

    /// The content type, if the header holds a parsable media type.
    pub fn content_type(&self) -> Option<mime::Mime> {
        self.headers().get(header::CONTENT_TYPE)?.to_str().ok()?.parse().ok()
    }

    /// The declared body length, `None` until a body has been set or if the
    /// `Content-Length` header does not hold a number.
    pub fn content_length(&self) -> Option<u64> {
        self.headers().get(header::CONTENT_LENGTH)?.to_str().ok()?.parse().ok()
    }

    pub fn body(&self) -> &RequestBody {
        self.inner.body()
    }

    pub fn body_mut(&mut self) -> &mut RequestBody {
        self.inner.body_mut()
    }

    pub fn into_inner(self) -> Request<RequestBody> {
        self.inner
    }

    /// Sets `Authorization: Basic ...` for the given credentials.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::InvalidCredentials`] if the user name contains a `:`, which
    /// would make the encoded pair ambiguous.
    pub fn set_basic_auth(&mut self, username: &str, password: &str) -> Result<(), RequestError> {
        ensure!(!username.contains(':'), RequestError::invalid_credentials("username must not contain ':'"));

        let encoded = STANDARD.encode(format!("{username}:{password}"));
        let mut value = HeaderValue::try_from(format!("Basic {encoded}")).map_err(RequestError::invalid_header)?;
        value.set_sensitive(true);

        self.inner.headers_mut().insert(header::AUTHORIZATION, value);
        Ok(())
    }

    /// Compresses `value` with the default encoder (gzip) and installs it as the body.
    ///
    /// To put an already encoded [`RequestBody`] in place, use [`Envelope::install_body`].
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::Body`] if encoding fails; the request is left unchanged.
    pub fn set_body<'a, B: Into<BodyValue<'a>>>(&mut self, value: B) -> Result<(), RequestError> {
        self.set_body_with(&BodyEncoder::default(), value)
    }

    /// Like [`set_body`](Self::set_body) with a caller supplied encoder.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::Body`] if encoding fails; the request is left unchanged.
    pub fn set_body_with<'a, B: Into<BodyValue<'a>>>(&mut self, encoder: &BodyEncoder, value: B) -> Result<(), RequestError> {
        encoder.encode(self, value.into())?;
        Ok(())
    }
}

impl Envelope for SearchRequest {
    fn header(&self, name: &HeaderName) -> Option<HeaderValue> {
        self.inner.header(name)
    }

    fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.inner.set_header(name, value);
    }

    fn install_body(&mut self, body: RequestBody) {
        self.inner.install_body(body);
    }

    fn set_content_length(&mut self, length: u64) {
        self.inner.set_content_length(length);
    }
}
