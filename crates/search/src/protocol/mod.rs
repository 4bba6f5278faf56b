//! Types describing an outgoing search request.
//!
//! # Architecture
//!
//! - **Envelope** ([`Envelope`]): the capability set the body encoder writes through
//!   - implemented for `http::Request<RequestBody>` and for [`SearchRequest`]
//!
//! - **Bodies** ([`body`]): what goes in and what comes out of encoding
//!   - [`BodyValue`]: raw text, a structured value, or an open byte stream
//!   - [`RequestBody`]: the compressed, single-consumption body installed on the envelope
//!
//! - **Request** ([`SearchRequest`]): an `http::Request` carrying the identification headers
//!
//! - **Errors** ([`error`]): [`BodyError`], [`RequestError`], [`UnsupportedEncoding`]

pub mod body;
pub use body::BodyValue;
pub use body::RequestBody;
pub use body::ToJson;

mod envelope;
pub use envelope::Envelope;
#[cfg(test)]
pub(crate) use envelope::MockEnvelope;

mod request;
pub use request::SearchRequest;
pub use request::user_agent;

pub mod error;
pub use error::BodyError;
pub use error::RequestError;
pub use error::UnsupportedEncoding;
