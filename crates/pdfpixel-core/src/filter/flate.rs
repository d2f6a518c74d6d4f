//! FlateDecode (zlib, with a raw deflate fallback)

use std::io::Read;

use flate2::read::{DeflateDecoder, ZlibDecoder};
use log::warn;

use crate::error::{Error, Result};

/// Inflate a zlib stream. Output produced before a corrupt tail is kept.
pub fn decode(data: &[u8]) -> Result<Vec<u8>> {
    decode_with_limit(data, usize::MAX)
}

/// Inflate at most `limit` bytes; the rest of the stream is not read
pub fn decode_with_limit(data: &[u8], limit: usize) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(data.len().saturating_mul(4).min(limit));
    let limit = u64::try_from(limit).unwrap_or(u64::MAX);
    match ZlibDecoder::new(data).take(limit).read_to_end(&mut out) {
        Ok(_) => return Ok(out),
        Err(err) if !out.is_empty() => {
            warn!("FlateDecode stream damaged after {} bytes: {err}", out.len());
            return Ok(out);
        }
        Err(_) => {}
    }

    // Some producers omit the zlib header
    out.clear();
    match DeflateDecoder::new(data).take(limit).read_to_end(&mut out) {
        Ok(_) => Ok(out),
        Err(err) if !out.is_empty() => {
            warn!("raw deflate stream damaged after {} bytes: {err}", out.len());
            Ok(out)
        }
        Err(err) => Err(Error::filter("FlateDecode", err.to_string())),
    }
}
