//! Request construction and body encoding for search service clients
//!
//! This crate prepares outgoing requests for a remote search/document service. It does not
//! send anything: it stamps requests with identification headers, turns the body into bytes
//! and compresses it, leaving a request that the surrounding HTTP client can transmit as is.
//!
//! # Features
//!
//! - Identification headers (`User-Agent`, `Accept`, `Content-Type`) on every request
//! - Three body shapes: raw text, any `serde::Serialize` value (sent as JSON), or a reader
//! - Transparent gzip, deflate, zstd or brotli compression of the body
//! - `Content-Encoding` and `Content-Length` kept in sync with the compressed bytes
//! - All-or-nothing updates: a failed encode leaves the request untouched
//!
//! # Example
//!
//! ```
//! use std::io::Read;
//!
//! use flate2::read::GzDecoder;
//! use micro_search::protocol::SearchRequest;
//! use serde_json::json;
//!
//! let mut request = SearchRequest::new("POST", "http://127.0.0.1:9200/docs/_search").unwrap();
//! request.set_basic_auth("elastic", "changeme").unwrap();
//! request.set_body(json!({"query": {"match": {"title": "rust"}}})).unwrap();
//!
//! assert_eq!(request.headers()[http::header::CONTENT_ENCODING], "gzip");
//! assert_eq!(request.content_length(), Some(request.body().len() as u64));
//!
//! let compressed = request.body_mut().take().unwrap();
//! let mut json = String::new();
//! GzDecoder::new(&compressed[..]).read_to_string(&mut json).unwrap();
//! assert_eq!(json, r#"{"query":{"match":{"title":"rust"}}}"#);
//! ```
//!
//! # Architecture
//!
//! - [`protocol`]: request, body and envelope types, and errors
//! - [`codec`]: the body encoder and compression schemes
//!
//! ## Envelopes
//!
//! The encoder writes through the [`protocol::Envelope`] trait rather than a concrete request
//! type. Any request representation offering header access, a settable body and a settable
//! length can be encoded into; `http::Request<RequestBody>` and [`protocol::SearchRequest`]
//! are provided.
//!
//! ## Error Handling
//!
//! - [`protocol::BodyError`]: serialization or compression failures
//! - [`protocol::RequestError`]: request construction failures, wrapping `BodyError`
//!
//! # Limitations
//!
//! - Encoding is synchronous and buffers the whole compressed body in memory
//! - Bodies are always compressed, including empty ones

pub mod codec;
pub mod protocol;

mod utils;
pub(crate) use utils::ensure;
