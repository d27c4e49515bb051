//! Codec layer for byte-level decoding.
//!
//! # Submodules
//!
//! - [`primitive`][]: Fixed-width little-endian primitives
//! - [`text`][]: Length-prefixed UTF-16LE strings with malformed-input recovery
//! - [`compression`][]: Raw-deflate record streams

pub mod compression;
pub mod primitive;
pub mod text;
