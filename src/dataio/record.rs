//! Record framing for record streams.
//!
//! A record stream is a flat sequence of records, each introduced by a 32-bit
//! header:
//!
//! ```text
//! bits  0..=9   tag_id
//! bits 10..=19  level   (nesting depth relative to the previous record)
//! bits 20..=31  size    (payload bytes; 0xFFF means "see next UInt32")
//! [4 bytes]     extended size, only when size == 0xFFF
//! [size bytes]  payload
//! ```
//!
//! The header itself is described with the schema builders and decoded by the
//! regular driver.

use std::io::Read;
use std::sync::{Arc, OnceLock};

use log::{debug, trace, warn};

use super::cursor::StreamCursor;
use super::decoder;
use super::schema::flags::flags;
use super::schema::structure::{self, StructBuilder};
use super::types::context::Context;
use super::types::descriptor::{BitGroup, Descriptor, StructDescriptor};
use super::types::error::{DataioError, Result};
use super::types::models::Primitive;
use super::types::value::{StructValue, Value};

/// Value of the 12-bit size group signalling an extended size field.
pub const EXTENDED_SIZE: i64 = 0xFFF;

static RECORD_HEADER: OnceLock<Arc<StructDescriptor>> = OnceLock::new();

/// Descriptor of the record header: a flags word plus the optional extended size.
pub fn record_header() -> &'static Arc<StructDescriptor> {
    RECORD_HEADER.get_or_init(|| {
        let bits = flags(
            "RecordHeaderBits",
            Primitive::UInt32,
            vec![
                BitGroup::new("tag_id", 0, 9),
                BitGroup::new("level", 10, 19),
                BitGroup::new("size", 20, 31),
            ],
        )
        .expect("Invalid record header flags definition");

        StructBuilder::new("RecordHeader")
            .field("bits", bits)
            .resolved_field("extended_size", |attrs, _ctx| {
                let size = attrs.get("bits").and_then(|bits| bits.get("size")).and_then(Value::as_int);
                Ok((size == Some(EXTENDED_SIZE)).then_some(Descriptor::Primitive(Primitive::UInt32)))
            })
            .build()
            .expect("Invalid record header struct definition")
    })
}

/// One framed record with its raw payload.
#[derive(Debug, Clone)]
pub struct Record {
    /// Stream offset of the record header.
    pub offset: u64,
    pub tag_id: u16,
    pub level: u16,
    pub payload: Vec<u8>,
    /// Decoded header attributes.
    pub header: StructValue,
    payload_offset: u64,
}

impl Record {
    /// Stream offset of the first payload byte.
    pub fn payload_offset(&self) -> u64 {
        self.payload_offset
    }

    pub fn size(&self) -> usize {
        self.payload.len()
    }

    /// Decodes the payload with `descriptor`.
    ///
    /// The record header's flattened attributes (`tag_id`, `level`, `size`, ...)
    /// are attached to the context as its parent, so field resolvers can see them.
    /// Trailing payload bytes left undecoded are logged, not rejected.
    pub fn decode(&self, descriptor: &Descriptor, context: &Context) -> Result<Value> {
        let context = context.clone().with_parent(self.header.flattened());
        let mut cursor = StreamCursor::with_position(self.payload.as_slice(), self.payload_offset);
        let value = decoder::decode(descriptor, &mut cursor, &context)?;

        let end = self.payload_offset + self.payload.len() as u64;
        if cursor.position() < end {
            debug!(
                "Record tag {} at offset {}: {} trailing bytes not covered by {}",
                self.tag_id,
                self.offset,
                end - cursor.position(),
                descriptor.name()
            );
        }
        Ok(value)
    }
}

/// Iterator over the records of a stream.
///
/// Stops cleanly when the stream ends on a record boundary. Truncation inside
/// a header or payload yields one `EndOfStream` error, after which the iterator
/// is exhausted.
pub struct RecordReader<R> {
    cursor: StreamCursor<R>,
    context: Context,
    finished: bool,
}

impl<R: Read> RecordReader<R> {
    pub fn new(reader: R, context: Context) -> Self {
        Self::from_cursor(StreamCursor::new(reader), context)
    }

    pub fn from_cursor(cursor: StreamCursor<R>, context: Context) -> Self {
        Self { cursor, context, finished: false }
    }

    /// Offset of the next record header.
    pub fn position(&self) -> u64 {
        self.cursor.position()
    }

    fn read_record(&mut self) -> Result<Option<Record>> {
        let offset = self.cursor.position();
        let Some(first) = self.cursor.next_byte()? else {
            trace!("Record stream ended cleanly at offset {}", offset);
            return Ok(None);
        };

        // Re-feed the probe byte so the header decodes through the driver.
        let prefix = [first];
        let header = {
            let mut chained =
                StreamCursor::with_position(prefix.as_slice().chain(&mut self.cursor), offset);
            structure::decode_struct(record_header(), &mut chained, &self.context)?
        };

        let (tag_id, level, size) = header_fields(&header)?;
        let payload_offset = self.cursor.position();
        let payload = self.cursor.read_exact(size)?;
        trace!(
            "Record tag={} level={} size={} at offset {}",
            tag_id, level, size, offset
        );

        Ok(Some(Record { offset, tag_id, level, payload, header, payload_offset }))
    }
}

fn header_fields(header: &StructValue) -> Result<(u16, u16, usize)> {
    let group = |name: &str| {
        header
            .get("bits")
            .and_then(|bits| bits.get(name))
            .and_then(Value::as_int)
            .ok_or_else(|| DataioError::InvalidSchema(format!("record header lacks `{}`", name)))
    };
    let tag_id = group("tag_id")? as u16;
    let level = group("level")? as u16;
    let mut size = group("size")?;
    if size == EXTENDED_SIZE {
        size = header
            .get("extended_size")
            .and_then(Value::as_int)
            .ok_or_else(|| DataioError::InvalidSchema("record header lacks `extended_size`".to_string()))?;
        if size < EXTENDED_SIZE {
            warn!("Extended record size {} could have used the short form", size);
        }
    }
    Ok((tag_id, level, size as usize))
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.read_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}
