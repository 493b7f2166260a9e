//! Transparent compression for CSV metadata tables.
//!
//! Codecs are picked by file extension (`metadata.csv.gz`, `shard.csv.zst`), falling
//! back to magic bytes on read so a compressed file with a plain `.csv` name still
//! loads. Each built-in codec sits behind its own cargo feature:
//! - **Gzip** (`.gz`) - `compression-gzip`
//! - **Zstd** (`.zst`) - `compression-zstd`
//!
//! With no codec features enabled both entry points are buffered pass-throughs.

use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::debug;

/// A compression algorithm usable for metadata tables.
pub trait CompressionCodec: Send + Sync {
    /// Short codec name used in log lines.
    fn name(&self) -> &str;

    /// File suffixes (with leading dot) that select this codec.
    fn extensions(&self) -> &[&str];

    /// Leading bytes of a stream written by this codec.
    fn magic_bytes(&self) -> Option<&[u8]>;

    fn wrap_reader_dyn(&self, reader: Box<dyn Read>) -> io::Result<Box<dyn Read>>;

    fn wrap_writer_dyn(&self, writer: Box<dyn Write>) -> io::Result<Box<dyn FinishWrite>>;
}

/// A writer that has to be finished explicitly.
///
/// `finish` writes any compression trailer and flushes the underlying file, so
/// errors there reach the caller instead of being dropped.
pub trait FinishWrite: Write {
    /// # Errors
    /// Failures writing the trailer or flushing.
    fn finish(self: Box<Self>) -> io::Result<()>;
}

impl<W: Write> FinishWrite for BufWriter<W> {
    fn finish(self: Box<Self>) -> io::Result<()> {
        let mut inner = self.into_inner().map_err(io::IntoInnerError::into_error)?;
        inner.flush()
    }
}

#[cfg(feature = "compression-gzip")]
impl<W: Write> FinishWrite for flate2::write::GzEncoder<W> {
    fn finish(self: Box<Self>) -> io::Result<()> {
        let mut inner = flate2::write::GzEncoder::finish(*self)?;
        inner.flush()
    }
}

#[cfg(feature = "compression-zstd")]
impl<W: Write> FinishWrite for zstd::stream::write::Encoder<'static, W> {
    fn finish(self: Box<Self>) -> io::Result<()> {
        let mut inner = zstd::stream::write::Encoder::finish(*self)?;
        inner.flush()
    }
}

fn codecs() -> Vec<Box<dyn CompressionCodec>> {
    vec![
        #[cfg(feature = "compression-gzip")]
        Box::new(GzipCodec),
        #[cfg(feature = "compression-zstd")]
        Box::new(ZstdCodec),
    ]
}

/// Every extension handled by an enabled codec, e.g. `[".gz", ".zst"]`.
#[must_use]
pub fn compressed_extensions() -> Vec<&'static str> {
    let mut out = Vec::new();
    #[cfg(feature = "compression-gzip")]
    out.push(".gz");
    #[cfg(feature = "compression-zstd")]
    out.push(".zst");
    out
}

fn detect_from_extension(path: &Path) -> Option<Box<dyn CompressionCodec>> {
    let name = path.to_string_lossy().to_lowercase();
    codecs()
        .into_iter()
        .find(|c| c.extensions().iter().any(|ext| name.ends_with(ext)))
}

fn detect_from_magic<R: BufRead>(reader: &mut R) -> Option<Box<dyn CompressionCodec>> {
    let buf = reader.fill_buf().ok()?;
    if buf.is_empty() {
        return None;
    }
    codecs()
        .into_iter()
        .find(|c| c.magic_bytes().is_some_and(|m| buf.starts_with(m)))
}

/// Wrap `reader` with the decompressor matching `path_hint`'s extension, or its magic bytes.
///
/// # Errors
/// Propagates failures from constructing the decoder.
pub fn auto_detect_reader<R: Read + 'static>(
    reader: R,
    path_hint: impl AsRef<Path>,
) -> io::Result<Box<dyn Read>> {
    if let Some(codec) = detect_from_extension(path_hint.as_ref()) {
        debug!(codec = codec.name(), path = %path_hint.as_ref().display(), "decompressing");
        return codec.wrap_reader_dyn(Box::new(reader));
    }

    let mut buf_reader = BufReader::new(reader);
    if let Some(codec) = detect_from_magic(&mut buf_reader) {
        debug!(codec = codec.name(), path = %path_hint.as_ref().display(), "decompressing (magic bytes)");
        return codec.wrap_reader_dyn(Box::new(buf_reader));
    }
    Ok(Box::new(buf_reader))
}

/// Wrap `writer` with the compressor matching `path_hint`'s extension.
///
/// Call [`FinishWrite::finish`] when done; dropping the writer loses trailer errors.
///
/// # Errors
/// Propagates failures from constructing the encoder.
pub fn auto_detect_writer<W: Write + 'static>(
    writer: W,
    path_hint: impl AsRef<Path>,
) -> io::Result<Box<dyn FinishWrite>> {
    if let Some(codec) = detect_from_extension(path_hint.as_ref()) {
        debug!(codec = codec.name(), path = %path_hint.as_ref().display(), "compressing");
        return codec.wrap_writer_dyn(Box::new(BufWriter::new(writer)));
    }
    Ok(Box::new(BufWriter::new(writer)))
}

#[cfg(feature = "compression-gzip")]
struct GzipCodec;

#[cfg(feature = "compression-gzip")]
impl CompressionCodec for GzipCodec {
    fn name(&self) -> &str {
        "gzip"
    }

    fn extensions(&self) -> &[&str] {
        &[".gz"]
    }

    fn magic_bytes(&self) -> Option<&[u8]> {
        Some(&[0x1f, 0x8b])
    }

    fn wrap_reader_dyn(&self, reader: Box<dyn Read>) -> io::Result<Box<dyn Read>> {
        use flate2::read::MultiGzDecoder;
        Ok(Box::new(MultiGzDecoder::new(reader)))
    }

    fn wrap_writer_dyn(&self, writer: Box<dyn Write>) -> io::Result<Box<dyn FinishWrite>> {
        use flate2::Compression;
        use flate2::write::GzEncoder;
        Ok(Box::new(GzEncoder::new(writer, Compression::default())))
    }
}

#[cfg(feature = "compression-zstd")]
struct ZstdCodec;

#[cfg(feature = "compression-zstd")]
impl CompressionCodec for ZstdCodec {
    fn name(&self) -> &str {
        "zstd"
    }

    fn extensions(&self) -> &[&str] {
        &[".zst"]
    }

    fn magic_bytes(&self) -> Option<&[u8]> {
        Some(&[0x28, 0xb5, 0x2f, 0xfd])
    }

    fn wrap_reader_dyn(&self, reader: Box<dyn Read>) -> io::Result<Box<dyn Read>> {
        zstd::stream::read::Decoder::new(reader).map(|d| Box::new(d) as Box<dyn Read>)
    }

    fn wrap_writer_dyn(&self, writer: Box<dyn Write>) -> io::Result<Box<dyn FinishWrite>> {
        zstd::stream::write::Encoder::new(writer, 3).map(|e| Box::new(e) as Box<dyn FinishWrite>)
    }
}
