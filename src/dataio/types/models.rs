//! Core data structures shared by every decoder.
//!
//! This module defines:
//! - The fixed set of primitive type tags and their binary layout
//! - Format versions as stored in document headers
//! - Colour references

use std::fmt;
use std::str::FromStr;

use super::error::{DataioError, Result};

/// Fixed-width primitive types. All multi-byte values are little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    /// IEEE-754 double precision float.
    Double,
    /// A single UTF-16 code unit.
    WChar,
    /// `0x00BBGGRR` colour value.
    ColorRef,
    /// UTF-16LE text prefixed by its length in code units (`UInt16`).
    Bstr,
}

impl Primitive {
    /// Returns the number of bytes this primitive occupies in the stream.
    ///
    /// `Bstr` is the only variable-width primitive; its width here is the
    /// width of the length prefix alone.
    pub fn byte_width(&self) -> usize {
        match self {
            Primitive::Int8 | Primitive::UInt8 => 1,
            Primitive::Int16 | Primitive::UInt16 | Primitive::WChar | Primitive::Bstr => 2,
            Primitive::Int32 | Primitive::UInt32 | Primitive::ColorRef => 4,
            Primitive::Double => 8,
        }
    }

    /// True for primitives that decode to `Value::Int` and may back flags,
    /// enumerations and array counts.
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            Primitive::Int8
                | Primitive::UInt8
                | Primitive::Int16
                | Primitive::UInt16
                | Primitive::Int32
                | Primitive::UInt32
                | Primitive::WChar
        )
    }

    /// True for signed integer primitives.
    pub fn is_signed(&self) -> bool {
        matches!(self, Primitive::Int8 | Primitive::Int16 | Primitive::Int32)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Primitive::Int8 => "INT8",
            Primitive::UInt8 => "UINT8",
            Primitive::Int16 => "INT16",
            Primitive::UInt16 => "UINT16",
            Primitive::Int32 => "INT32",
            Primitive::UInt32 => "UINT32",
            Primitive::Double => "DOUBLE",
            Primitive::WChar => "WCHAR",
            Primitive::ColorRef => "COLORREF",
            Primitive::Bstr => "BSTR",
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Document format version as `major.minor.micro.build`.
///
/// Stored in headers either as text (`"5.0.3.0"`) or packed into a `UInt32`
/// with the major number in the most significant byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FormatVersion {
    pub major: u8,
    pub minor: u8,
    pub micro: u8,
    pub build: u8,
}

impl FormatVersion {
    pub const fn new(major: u8, minor: u8, micro: u8, build: u8) -> Self {
        Self { major, minor, micro, build }
    }

    /// Unpacks a version stored as `0xMMnnPPbb`.
    pub fn from_packed(packed: u32) -> Self {
        let [major, minor, micro, build] = packed.to_be_bytes();
        Self { major, minor, micro, build }
    }

    pub fn packed(&self) -> u32 {
        u32::from_be_bytes([self.major, self.minor, self.micro, self.build])
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}.{}.{}", self.major, self.minor, self.micro, self.build)
    }
}

impl FromStr for FormatVersion {
    type Err = DataioError;

    /// Parses `"5"`, `"5.0"`, `"5.0.3"` or `"5.0.3.0"`; missing parts are zero.
    fn from_str(s: &str) -> Result<Self> {
        let mut parts = [0u8; 4];
        let mut count = 0;
        for piece in s.trim().split('.') {
            if count == parts.len() {
                return Err(DataioError::InvalidVersion(format!("too many components in '{}'", s)));
            }
            parts[count] = piece
                .parse()
                .map_err(|e| DataioError::InvalidVersion(format!("'{}': {}", s, e)))?;
            count += 1;
        }
        let [major, minor, micro, build] = parts;
        Ok(Self { major, minor, micro, build })
    }
}

/// A colour reference stored as `0x00BBGGRR`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorRef(pub u32);

impl ColorRef {
    pub fn red(&self) -> u8 {
        (self.0 & 0xFF) as u8
    }

    pub fn green(&self) -> u8 {
        ((self.0 >> 8) & 0xFF) as u8
    }

    pub fn blue(&self) -> u8 {
        ((self.0 >> 16) & 0xFF) as u8
    }
}

impl fmt::Display for ColorRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.red(), self.green(), self.blue())
    }
}
