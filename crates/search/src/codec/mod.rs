//! Body encoding and compression.
//!
//! - [`BodyEncoder`]: normalizes a [`BodyValue`](crate::protocol::BodyValue), compresses it and
//!   installs the result on an [`Envelope`](crate::protocol::Envelope)
//! - [`ContentEncoding`]: the compression schemes and their `Content-Encoding` identifiers
//! - [`CompressionLevel`]: speed/ratio trade-off, mapped per algorithm
//!
//! # Features
//!
//! - gzip, deflate (zlib), zstd and brotli
//! - empty bodies still produce a complete compressed frame
//! - the envelope is only written once the frame is finished

pub(crate) mod body_encoder;
mod compressor;
mod encoding;

pub use body_encoder::BodyEncoder;
pub use body_encoder::BodyEncoderBuilder;
pub use body_encoder::EncodedBody;
pub use encoding::CompressionLevel;
pub use encoding::ContentEncoding;
