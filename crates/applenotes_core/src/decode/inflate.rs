//! Blob decompression.
//!
//! Note bodies are stored gzip-compressed; some older exports carry a bare
//! zlib stream. Both are inflated with `flate2`.

use super::{DecodeError, DecodeResult};
use flate2::read::{GzDecoder, ZlibDecoder};
use std::io::Read;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const ZLIB_METHOD_DEFLATE: u8 = 0x78;

/// Inflates one compressed blob into a fresh buffer.
pub fn inflate(bytes: &[u8]) -> DecodeResult<Vec<u8>> {
    let mut out = Vec::with_capacity(bytes.len().saturating_mul(4));
    let result = match bytes {
        [a, b, ..] if [*a, *b] == GZIP_MAGIC => GzDecoder::new(bytes).read_to_end(&mut out),
        [a, b, ..] if *a == ZLIB_METHOD_DEFLATE && is_zlib_header(*a, *b) => {
            ZlibDecoder::new(bytes).read_to_end(&mut out)
        }
        [] => return Err(DecodeError::Decompression("blob is empty".to_string())),
        _ => {
            return Err(DecodeError::Decompression(
                "unrecognized compression header".to_string(),
            ))
        }
    };

    result.map_err(|err| DecodeError::Decompression(err.to_string()))?;
    Ok(out)
}

fn is_zlib_header(cmf: u8, flg: u8) -> bool {
    ((u16::from(cmf) << 8) | u16::from(flg)) % 31 == 0
}
