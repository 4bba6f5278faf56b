//! The compressing sink used by the body encoder.
//!
//! A [`Compressor`] wraps an in-memory [`Writer`] with one of the supported compression
//! algorithms. Bytes written to it are compressed into the buffer; [`Compressor::finish`]
//! writes the trailer and hands the buffer back.

use std::io;
use std::io::Write;

use bytes::{Bytes, BytesMut};
use flate2::Compression;
use flate2::write::{GzEncoder, ZlibEncoder};
use tracing::trace;
use zstd::stream::write::Encoder as ZstdEncoder;

use crate::codec::{CompressionLevel, ContentEncoding};

/// brotli internal buffer size
const BROTLI_BUFFER_SIZE: usize = 32 * 1024;
/// brotli window size, `BROTLI_PARAM_LGWIN`
const BROTLI_LG_WINDOW: u32 = 22;

/// The accumulation buffer behind a [`Compressor`].
#[derive(Debug)]
pub(crate) struct Writer {
    buf: BytesMut,
}

impl Writer {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self { buf: BytesMut::with_capacity(capacity) }
    }

    pub(crate) fn freeze(self) -> Bytes {
        self.buf.freeze()
    }
}

impl io::Write for Writer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A compressing sink, one variant per [`ContentEncoding`].
pub(crate) enum Compressor<W: Write = Writer> {
    Gzip(GzEncoder<W>),
    Deflate(ZlibEncoder<W>),
    Zstd(ZstdEncoder<'static, W>),
    /// brotli only reports trailer errors through `into_inner`'s swallowed result, so it
    /// compresses into a [`Writer`] and the finished frame is handed to `W` in `finish`.
    Br(Box<brotli::CompressorWriter<Writer>>, W),
}

impl<W: Write> Compressor<W> {
    /// Opens a sink over `writer`.
    ///
    /// Only zstd can fail here, when its compression context cannot be created.
    pub(crate) fn new(encoding: ContentEncoding, level: CompressionLevel, writer: W) -> io::Result<Self> {
        let compressor = match encoding {
            ContentEncoding::Gzip => Self::Gzip(GzEncoder::new(writer, Compression::new(level.flate2()))),
            ContentEncoding::Deflate => Self::Deflate(ZlibEncoder::new(writer, Compression::new(level.flate2()))),
            ContentEncoding::Zstd => Self::Zstd(ZstdEncoder::new(writer, level.zstd())?),
            ContentEncoding::Brotli => Self::Br(
                Box::new(brotli::CompressorWriter::new(
                    Writer::with_capacity(BROTLI_BUFFER_SIZE),
                    BROTLI_BUFFER_SIZE,
                    level.brotli(),
                    BROTLI_LG_WINDOW,
                )),
                writer,
            ),
        };
        Ok(compressor)
    }

    pub(crate) fn encoding(&self) -> ContentEncoding {
        match self {
            Compressor::Gzip(_) => ContentEncoding::Gzip,
            Compressor::Deflate(_) => ContentEncoding::Deflate,
            Compressor::Zstd(_) => ContentEncoding::Zstd,
            Compressor::Br(..) => ContentEncoding::Brotli,
        }
    }

    /// Writes the frame trailer and returns the underlying writer.
    ///
    /// Must be called even when nothing was written, otherwise the output is not a valid frame.
    pub(crate) fn finish(self) -> io::Result<W> {
        match self {
            Self::Gzip(encoder) => encoder.finish(),
            Self::Deflate(encoder) => encoder.finish(),
            Self::Zstd(encoder) => encoder.finish(),
            Self::Br(encoder, mut writer) => {
                // writes to `Writer` never fail, so nothing is lost in `into_inner`
                let frame = encoder.into_inner();
                writer.write_all(&frame.buf)?;
                writer.flush()?;
                Ok(writer)
            }
        }
    }
}

impl<W: Write> io::Write for Compressor<W> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let encoding = self.encoding();
        let result = match self {
            Self::Gzip(encoder) => encoder.write(data),
            Self::Deflate(encoder) => encoder.write(data),
            Self::Zstd(encoder) => encoder.write(data),
            Self::Br(encoder, _) => encoder.write(data),
        };
        if let Err(err) = &result {
            trace!(%encoding, "error compressing body: {}", err);
        }
        result
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Gzip(encoder) => encoder.flush(),
            Self::Deflate(encoder) => encoder.flush(),
            Self::Zstd(encoder) => encoder.flush(),
            Self::Br(encoder, _) => encoder.flush(),
        }
    }
}
