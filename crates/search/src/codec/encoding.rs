use std::fmt;
use std::str::FromStr;

use http::HeaderValue;

use crate::protocol::UnsupportedEncoding;

/// Compression schemes a request body can be sent with.
///
/// The identifier returned by [`ContentEncoding::as_str`] is what goes into the
/// `Content-Encoding` header, so it must match what the server decompresses with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ContentEncoding {
    /// Gzip encoding.
    #[default]
    Gzip,
    /// Deflate encoding, zlib framed.
    Deflate,
    /// Zstd encoding.
    Zstd,
    /// Brotli encoding.
    Brotli,
}

impl ContentEncoding {
    pub const ALL: [ContentEncoding; 4] =
        [ContentEncoding::Gzip, ContentEncoding::Deflate, ContentEncoding::Zstd, ContentEncoding::Brotli];

    /// Returns the name of the encoding.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentEncoding::Gzip => "gzip",
            ContentEncoding::Deflate => "deflate",
            ContentEncoding::Zstd => "zstd",
            ContentEncoding::Brotli => "br",
        }
    }

    pub fn header_value(&self) -> HeaderValue {
        HeaderValue::from_static(self.as_str())
    }
}

impl fmt::Display for ContentEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentEncoding {
    type Err = UnsupportedEncoding;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            s if s.eq_ignore_ascii_case("gzip") || s.eq_ignore_ascii_case("x-gzip") => Ok(ContentEncoding::Gzip),
            s if s.eq_ignore_ascii_case("deflate") => Ok(ContentEncoding::Deflate),
            s if s.eq_ignore_ascii_case("zstd") => Ok(ContentEncoding::Zstd),
            s if s.eq_ignore_ascii_case("br") => Ok(ContentEncoding::Brotli),
            other => Err(UnsupportedEncoding::new(other)),
        }
    }
}

/// Compression level configuration.
///
/// `Precise` values are algorithm specific and get clamped into range:
/// - gzip/deflate: 0-9
/// - brotli: 0-11
/// - zstd: 1-22
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionLevel {
    /// Fastest compression (lowest ratio).
    Fastest,
    /// Best compression (highest ratio, slowest).
    Best,
    /// Default compression level for each algorithm.
    #[default]
    Default,
    /// Precise compression level (algorithm-specific value).
    Precise(u32),
}

impl CompressionLevel {
    pub(crate) fn flate2(self) -> u32 {
        match self {
            CompressionLevel::Fastest => 1,
            CompressionLevel::Best => 9,
            CompressionLevel::Default => 6,
            CompressionLevel::Precise(n) => n.min(9),
        }
    }

    pub(crate) fn brotli(self) -> u32 {
        match self {
            CompressionLevel::Fastest => 0,
            CompressionLevel::Best => 11,
            CompressionLevel::Default => 4,
            CompressionLevel::Precise(n) => n.min(11),
        }
    }

    pub(crate) fn zstd(self) -> i32 {
        match self {
            CompressionLevel::Fastest => 1,
            CompressionLevel::Best => 22,
            CompressionLevel::Default => 3,
            CompressionLevel::Precise(n) => i32::try_from(n.clamp(1, 22)).unwrap_or(22),
        }
    }
}
