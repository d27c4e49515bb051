//! Bit-field flags over an integer primitive.

use std::collections::HashSet;
use std::io::Read;
use std::sync::Arc;

use log::trace;

use crate::dataio::codec::primitive;
use crate::dataio::cursor::StreamCursor;
use crate::dataio::types::descriptor::{BitGroup, FlagsDescriptor, GroupType};
use crate::dataio::types::error::{DataioError, Result};
use crate::dataio::types::models::Primitive;
use crate::dataio::types::value::{AttributeMap, FlagsValue, Value};

/// Defines a flags type: named bit groups overlaid on `base`.
///
/// Groups may overlap; each one masks and shifts the raw integer on its own.
///
/// # Errors
/// `InvalidSchema` if `base` is not an integer primitive, a group's range is
/// reversed or exceeds the base width, or a group name repeats.
pub fn flags(
    name: impl Into<String>,
    base: Primitive,
    groups: Vec<BitGroup>,
) -> Result<Arc<FlagsDescriptor>> {
    let name: String = name.into();
    if !base.is_integer() {
        return Err(DataioError::InvalidSchema(format!(
            "flags `{}` needs an integer base, got {}",
            name, base
        )));
    }

    let bits = (base.byte_width() * 8) as u32;
    let mut seen = HashSet::new();
    for group in &groups {
        if group.lsb > group.msb || group.msb >= bits {
            return Err(DataioError::InvalidSchema(format!(
                "flags `{}`: group `{}` has invalid bit range {}..={} for {}",
                name, group.name, group.lsb, group.msb, base
            )));
        }
        if !seen.insert(group.name.as_str()) {
            return Err(DataioError::InvalidSchema(format!(
                "flags `{}` declares group `{}` twice",
                name, group.name
            )));
        }
    }

    Ok(Arc::new(FlagsDescriptor { name, base, groups }))
}

impl FlagsDescriptor {
    /// Wraps an already-read integer, extracting every group.
    pub fn wrap(self: &Arc<Self>, raw: i64) -> Result<FlagsValue> {
        // Sign-extended bases are reinterpreted at their own width.
        let bits = self.base.byte_width() * 8;
        let raw = (raw as u64) & (u64::MAX >> (64 - bits));

        let mut groups = AttributeMap::with_capacity(self.groups.len());
        for group in &self.groups {
            let extracted = group.extract(raw) as i64;
            let value = match &group.value_type {
                GroupType::Int => Value::Int(extracted),
                GroupType::Enum(enumeration) => Value::Enum(enumeration.canonical(extracted)?),
            };
            groups.insert(group.name.clone(), value);
        }

        Ok(FlagsValue { descriptor: Arc::clone(self), raw, groups })
    }
}

/// Reads the base integer and extracts the named groups.
pub fn decode<R: Read>(descriptor: &Arc<FlagsDescriptor>, cursor: &mut StreamCursor<R>) -> Result<Value> {
    let raw = primitive::read_integer(descriptor.base, cursor)?;
    let value = descriptor.wrap(raw)?;
    trace!("{} = {:#x}", descriptor.name, value.raw());
    Ok(Value::Flags(value))
}
