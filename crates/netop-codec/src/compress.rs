//! Gzip for request bodies and responses.

use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;

use crate::error::{DecodeError, EncodeError, Result};

/// Gzip `body` when `should_compress` is set, otherwise hand it back as is.
///
/// A compression failure is returned, never swallowed.
pub fn maybe_compress(body: Vec<u8>, should_compress: bool) -> Result<Vec<u8>> {
    if should_compress { compress(&body) } else { Ok(body) }
}

pub fn compress(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(bytes.len() / 2 + 32), Compression::default());
    encoder.write_all(bytes).map_err(EncodeError::Compression)?;
    encoder.finish().map_err(EncodeError::Compression)
}

pub fn decompress(bytes: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let mut out = Vec::with_capacity(bytes.len() * 2);
    GzDecoder::new(bytes).read_to_end(&mut out).map_err(DecodeError::Gzip)?;
    Ok(out)
}

/// Whether a `Content-Encoding` header value names gzip.
pub fn is_gzip_encoding(content_encoding: &str) -> bool {
    content_encoding
        .split(',')
        .map(str::trim)
        .any(|coding| coding.eq_ignore_ascii_case("gzip") || coding.eq_ignore_ascii_case("x-gzip"))
}
