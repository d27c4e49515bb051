//! # dataio-reader
//!
//! A typed decoder for binary document records.
//!
//! Record shapes are described once with schema builders (primitives, bit-field
//! flags, enumerations, arrays, structs) and decoded from any forward-only byte
//! stream into typed values.
//!
//! ```
//! use dataio_reader::{decode_bytes, structure, Context, Primitive};
//!
//! let point = structure("Point", [("x", Primitive::Int16), ("y", Primitive::Int16)]).unwrap();
//! let value = decode_bytes(&point.into(), &[0x01, 0x00, 0xFF, 0xFF], &Context::new()).unwrap();
//! assert_eq!(value.get("x").and_then(|v| v.as_int()), Some(1));
//! assert_eq!(value.get("y").and_then(|v| v.as_int()), Some(-1));
//! ```
pub mod dataio;

// Re-export the main types for convenience
pub use dataio::{
    codec::compression::{inflate, open_stream},
    codec::text::{decode_utf16le, DecodedText},
    cursor::StreamCursor,
    decoder::{decode, decode_bytes},
    record::{record_header, Record, RecordReader},
    schema::{
        array::{counted_array, fixed_array},
        enumeration::enumeration,
        flags::flags,
        primitive,
        structure::{structure, StructBuilder},
    },
    types::{
        context::Context,
        descriptor::{
            ArrayDescriptor, ArrayLength, BitGroup, Descriptor, EnumDescriptor, Field, FieldType,
            FlagsDescriptor, GroupType, Resolver, StructDescriptor,
        },
        error::{DataioError, Result},
        models::{ColorRef, FormatVersion, Primitive},
        value::{AttributeMap, EnumValue, FlagsValue, StructValue, Value},
    },
};
