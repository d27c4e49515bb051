//! Schema definition surface.
//!
//! Builders used by the record-type layer to describe each binary shape once,
//! at startup:
//!
//! - [`primitive`]: wrap a [`Primitive`] tag
//! - [`flags`](flags::flags): named bit groups over an integer
//! - [`enumeration`](enumeration::enumeration): named integer constants
//! - [`fixed_array`](array::fixed_array) / [`counted_array`](array::counted_array)
//! - [`structure`](structure::structure) / [`StructBuilder`](structure::StructBuilder)

pub mod array;
pub mod enumeration;
pub mod flags;
pub mod structure;

use crate::dataio::types::descriptor::Descriptor;
use crate::dataio::types::models::Primitive;

pub fn primitive(kind: Primitive) -> Descriptor {
    Descriptor::Primitive(kind)
}
