//! Fixed-width primitive decoders.

use std::io::Read;

use byteorder::{ByteOrder, LittleEndian};
use log::trace;

use super::text;
use crate::dataio::cursor::StreamCursor;
use crate::dataio::types::error::{DataioError, Result};
use crate::dataio::types::models::{ColorRef, Primitive};
use crate::dataio::types::value::Value;

/// Decodes one primitive, consuming exactly its width (plus the payload for `Bstr`).
pub fn decode<R: Read>(primitive: Primitive, cursor: &mut StreamCursor<R>) -> Result<Value> {
    let value = match primitive {
        Primitive::Bstr => Value::Text(text::read_bstr(cursor)?.text),
        Primitive::Double => Value::Float(LittleEndian::read_f64(&cursor.read_array::<8>()?)),
        Primitive::ColorRef => {
            Value::Color(ColorRef(LittleEndian::read_u32(&cursor.read_array::<4>()?)))
        }
        integer => Value::Int(read_integer(integer, cursor)?),
    };
    trace!("{} = {}", primitive, value);
    Ok(value)
}

/// Reads an integer primitive as `i64`.
///
/// Used directly by flags, enumerations and array counts, which need the raw
/// number rather than a [`Value`].
pub fn read_integer<R: Read>(primitive: Primitive, cursor: &mut StreamCursor<R>) -> Result<i64> {
    let value = match primitive {
        Primitive::Int8 => cursor.read_array::<1>()?[0] as i8 as i64,
        Primitive::UInt8 => cursor.read_array::<1>()?[0] as i64,
        Primitive::Int16 => LittleEndian::read_i16(&cursor.read_array::<2>()?) as i64,
        Primitive::UInt16 | Primitive::WChar => {
            LittleEndian::read_u16(&cursor.read_array::<2>()?) as i64
        }
        Primitive::Int32 => LittleEndian::read_i32(&cursor.read_array::<4>()?) as i64,
        Primitive::UInt32 => LittleEndian::read_u32(&cursor.read_array::<4>()?) as i64,
        other => {
            return Err(DataioError::InvalidSchema(format!(
                "{} is not an integer primitive",
                other
            )))
        }
    };
    Ok(value)
}
