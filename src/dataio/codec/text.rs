//! Best-effort UTF-16LE text decoding.
//!
//! Real-world documents contain corrupted strings (unpaired surrogates, odd
//! byte counts). Decoding never fails on them: each malformed span becomes a
//! single U+FFFD and is logged with its absolute byte range.

use std::io::Read;
use std::ops::Range;

use byteorder::{ByteOrder, LittleEndian};
use encoding_rs::{DecoderResult, UTF_16LE};
use log::{trace, warn};

use crate::dataio::cursor::StreamCursor;
use crate::dataio::types::error::Result;

/// Decoded text plus the absolute byte ranges that had to be replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    pub text: String,
    pub malformed: Vec<Range<u64>>,
}

/// Decodes `bytes` as UTF-16LE, replacing each malformed span with U+FFFD.
///
/// `offset` is the stream offset of `bytes[0]`, used only for diagnostics.
pub fn decode_utf16le(bytes: &[u8], offset: u64) -> DecodedText {
    let mut decoder = UTF_16LE.new_decoder_without_bom_handling();
    let initial = decoder
        .max_utf8_buffer_length_without_replacement(bytes.len())
        .unwrap_or(bytes.len() * 2);
    let mut text = String::with_capacity(initial);
    let mut malformed = Vec::new();
    let mut consumed = 0usize;

    loop {
        let (result, read) =
            decoder.decode_to_string_without_replacement(&bytes[consumed..], &mut text, true);
        consumed += read;
        match result {
            DecoderResult::InputEmpty => break,
            DecoderResult::OutputFull => {
                let remaining = bytes.len() - consumed;
                let needed = decoder
                    .max_utf8_buffer_length_without_replacement(remaining)
                    .unwrap_or(remaining * 2);
                text.reserve(needed.max(4));
            }
            DecoderResult::Malformed(bad, good) => {
                let end = consumed.saturating_sub(good as usize);
                let start = end.saturating_sub(bad as usize);
                let range = (offset + start as u64)..(offset + end as u64);
                warn!(
                    "Malformed UTF-16LE at bytes {}..{} ({:02x?}), substituting U+FFFD",
                    range.start,
                    range.end,
                    &bytes[start..end]
                );
                text.push(char::REPLACEMENT_CHARACTER);
                malformed.push(range);
            }
        }
    }

    DecodedText { text, malformed }
}

/// Reads a `UInt16` code-unit count followed by that many UTF-16LE code units.
///
/// A zero count returns an empty string without touching the stream further.
pub fn read_bstr<R: Read>(cursor: &mut StreamCursor<R>) -> Result<DecodedText> {
    let units = LittleEndian::read_u16(&cursor.read_array::<2>()?) as usize;
    if units == 0 {
        return Ok(DecodedText { text: String::new(), malformed: Vec::new() });
    }
    let offset = cursor.position();
    let bytes = cursor.read_exact(units * 2)?;
    trace!("BSTR: {} code units at offset {}", units, offset);
    Ok(decode_utf16le(&bytes, offset))
}
