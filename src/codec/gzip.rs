//! Gzip Envelope
//!
//! Stateless compress/decompress/detect functions over byte slices.

use std::borrow::Cow;
use std::io::{Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use super::GZIP_MAGIC;
use crate::error::{CacheError, Result};

// == Compress ==
/// Compresses `data` into a gzip envelope.
///
/// The output always starts with [`GZIP_MAGIC`].
pub fn compress(data: &[u8]) -> Result<Vec<u8>> {
    let buffer = Vec::with_capacity(data.len() / 2 + 32);
    let mut encoder = GzEncoder::new(buffer, Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| CacheError::serialization("Unable to compress data", e))?;
    encoder
        .finish()
        .map_err(|e| CacheError::serialization("Unable to compress data", e))
}

// == Decompress ==
/// Decompresses a gzip envelope, passing anything else through unchanged.
///
/// Inputs shorter than two bytes, or not starting with the magic header, are
/// returned borrowed as-is.
pub fn decompress(data: &[u8]) -> Result<Cow<'_, [u8]>> {
    if !is_compressed(data) {
        return Ok(Cow::Borrowed(data));
    }

    let mut decoder = GzDecoder::new(data);
    let mut out = Vec::with_capacity(data.len() * 2);
    decoder
        .read_to_end(&mut out)
        .map_err(|e| CacheError::serialization("Unable to decompress data", e))?;
    Ok(Cow::Owned(out))
}

// == Is Compressed ==
/// Returns true when `data` begins with the gzip magic header.
pub fn is_compressed(data: &[u8]) -> bool {
    data.len() >= GZIP_MAGIC.len() && data[..2] == GZIP_MAGIC
}
