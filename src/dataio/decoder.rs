//! Decode driver: the single entry point for turning bytes into values.

use std::io::Read;

use super::codec::primitive;
use super::cursor::StreamCursor;
use super::schema::{array, enumeration, flags, structure};
use super::types::context::Context;
use super::types::descriptor::Descriptor;
use super::types::error::Result;
use super::types::value::Value;

/// Decodes one value of shape `descriptor` from `cursor`.
///
/// Dispatches on the descriptor kind; arrays and structs recurse back here for
/// their elements and fields. `context` is passed through untouched.
pub fn decode<R: Read>(
    descriptor: &Descriptor,
    cursor: &mut StreamCursor<R>,
    context: &Context,
) -> Result<Value> {
    match descriptor {
        Descriptor::Primitive(kind) => primitive::decode(*kind, cursor),
        Descriptor::Flags(desc) => flags::decode(desc, cursor),
        Descriptor::Enum(desc) => enumeration::decode(desc, cursor),
        Descriptor::Array(desc) => array::decode(desc, cursor, context),
        Descriptor::Struct(desc) => structure::decode(desc, cursor, context),
    }
}

/// Convenience wrapper decoding from an in-memory buffer.
pub fn decode_bytes(descriptor: &Descriptor, bytes: &[u8], context: &Context) -> Result<Value> {
    decode(descriptor, &mut StreamCursor::new(bytes), context)
}
