use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("build request error: {source}")]
    Build {
        #[from]
        source: http::Error,
    },

    #[error("invalid header: {reason}")]
    InvalidHeader { reason: String },

    #[error("invalid credentials: {reason}")]
    InvalidCredentials { reason: String },

    #[error("body error: {source}")]
    Body {
        #[from]
        source: BodyError,
    },
}

impl RequestError {
    pub fn invalid_header<S: ToString>(str: S) -> Self {
        Self::InvalidHeader { reason: str.to_string() }
    }

    pub fn invalid_credentials<S: ToString>(str: S) -> Self {
        Self::InvalidCredentials { reason: str.to_string() }
    }
}

/// Errors raised while turning a [`BodyValue`](crate::protocol::BodyValue) into a compressed body.
///
/// Both variants abort the encode before anything is written to the envelope.
#[derive(Error, Debug)]
pub enum BodyError {
    #[error("serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },

    #[error("encoding error: {source}")]
    Encoding {
        #[from]
        source: io::Error,
    },
}

impl BodyError {
    pub fn encoding<E: Into<io::Error>>(e: E) -> Self {
        Self::Encoding { source: e.into() }
    }

    pub fn is_serialization(&self) -> bool {
        matches!(self, BodyError::Serialization { .. })
    }

    pub fn is_encoding(&self) -> bool {
        matches!(self, BodyError::Encoding { .. })
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported content encoding: {name}")]
pub struct UnsupportedEncoding {
    pub name: String,
}

impl UnsupportedEncoding {
    pub fn new<S: ToString>(str: S) -> Self {
        Self { name: str.to_string() }
    }
}
