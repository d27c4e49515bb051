//! Core typed binary decoder.
//!
//! # Module Organization
//!
//! - [`types`]: descriptors, decoded values, context, errors
//! - [`cursor`]: forward-only byte source
//! - [`codec`]: primitives, UTF-16LE text, compressed streams
//! - [`schema`]: builders for flags, enumerations, arrays and structs
//! - [`decoder`]: the recursive decode driver
//! - [`record`]: record framing on top of the driver
//!
//! ```text
//! decode(descriptor, cursor, ctx)
//!   ├─ Primitive ─→ codec::primitive
//!   ├─ Flags     ─→ schema::flags      ─→ codec::primitive
//!   ├─ Enum      ─→ schema::enumeration ─→ codec::primitive
//!   ├─ Array     ─→ schema::array      ─→ decode(element) × N
//!   └─ Struct    ─→ schema::structure  ─→ decode(field) for each field
//! ```

pub mod codec;
pub mod cursor;
pub mod decoder;
pub mod record;
pub mod schema;
pub mod types;
