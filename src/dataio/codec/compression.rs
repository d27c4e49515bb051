//! Decompression of record streams.
//!
//! Compressed documents store each record stream as raw deflate data
//! (no zlib header, no checksum). Uncompressed streams pass through.

use std::io::Read;

use flate2::read::DeflateDecoder;
use log::{debug, trace};

use crate::dataio::types::error::{DataioError, Result};

/// Wraps `reader` so that it yields decompressed bytes when `compressed` is set.
///
/// Decompression errors surface lazily as `std::io::Error`s from `read`, which
/// the cursor turns into `DataioError::Io`.
pub fn open_stream<'a, R: Read + 'a>(reader: R, compressed: bool) -> Box<dyn Read + 'a> {
    if compressed {
        debug!("Opening raw-deflate record stream");
        Box::new(DeflateDecoder::new(reader))
    } else {
        trace!("Opening uncompressed record stream");
        Box::new(reader)
    }
}

/// Inflates a whole raw-deflate payload into memory.
pub fn inflate(payload: &[u8]) -> Result<Vec<u8>> {
    let mut output = Vec::with_capacity(payload.len() * 2);
    DeflateDecoder::new(payload)
        .read_to_end(&mut output)
        .map_err(|e| DataioError::Decompression(format!("Raw deflate decompression failed: {}", e)))?;
    trace!("Inflated {} bytes -> {} bytes", payload.len(), output.len());
    Ok(output)
}
