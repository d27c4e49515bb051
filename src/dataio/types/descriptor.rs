//! Schema descriptors: immutable descriptions of binary shapes.
//!
//! A [`Descriptor`] is cheap to clone (it is a primitive tag or an `Arc`).
//! Equality and hashing use descriptor identity, so two descriptors compare
//! equal only when they come from the same construction (or the same intern
//! table entry). Builders live in [`crate::dataio::schema`].

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};

use super::context::Context;
use super::error::Result;
use super::models::Primitive;
use super::value::{AttributeMap, EnumValue};

/// Any decodable binary shape.
#[derive(Clone)]
pub enum Descriptor {
    Primitive(Primitive),
    Flags(Arc<FlagsDescriptor>),
    Enum(Arc<EnumDescriptor>),
    Array(Arc<ArrayDescriptor>),
    Struct(Arc<StructDescriptor>),
}

impl Descriptor {
    /// Human-readable type name, used in logs and error context.
    pub fn name(&self) -> String {
        match self {
            Descriptor::Primitive(p) => p.name().to_string(),
            Descriptor::Flags(f) => f.name.clone(),
            Descriptor::Enum(e) => e.name.to_string(),
            Descriptor::Array(a) => match a.length {
                ArrayLength::Fixed(n) => format!("ARRAY({}, {})", a.element.name(), n),
                ArrayLength::Counted(count) => format!("N_ARRAY({}, {})", count, a.element.name()),
            },
            Descriptor::Struct(s) => s.name.clone(),
        }
    }

    /// Address used for identity comparison of shared descriptors.
    fn identity(&self) -> usize {
        match self {
            Descriptor::Primitive(_) => 0,
            Descriptor::Flags(f) => Arc::as_ptr(f) as usize,
            Descriptor::Enum(e) => Arc::as_ptr(e) as usize,
            Descriptor::Array(a) => Arc::as_ptr(a) as usize,
            Descriptor::Struct(s) => Arc::as_ptr(s) as usize,
        }
    }
}

impl From<Primitive> for Descriptor {
    fn from(primitive: Primitive) -> Self {
        Descriptor::Primitive(primitive)
    }
}

impl From<Arc<FlagsDescriptor>> for Descriptor {
    fn from(flags: Arc<FlagsDescriptor>) -> Self {
        Descriptor::Flags(flags)
    }
}

impl From<Arc<EnumDescriptor>> for Descriptor {
    fn from(enumeration: Arc<EnumDescriptor>) -> Self {
        Descriptor::Enum(enumeration)
    }
}

impl From<Arc<ArrayDescriptor>> for Descriptor {
    fn from(array: Arc<ArrayDescriptor>) -> Self {
        Descriptor::Array(array)
    }
}

impl From<Arc<StructDescriptor>> for Descriptor {
    fn from(structure: Arc<StructDescriptor>) -> Self {
        Descriptor::Struct(structure)
    }
}

impl PartialEq for Descriptor {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Descriptor::Primitive(a), Descriptor::Primitive(b)) => a == b,
            (Descriptor::Primitive(_), _) | (_, Descriptor::Primitive(_)) => false,
            _ => {
                std::mem::discriminant(self) == std::mem::discriminant(other)
                    && self.identity() == other.identity()
            }
        }
    }
}

impl Eq for Descriptor {}

impl Hash for Descriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Descriptor::Primitive(p) => p.hash(state),
            _ => self.identity().hash(state),
        }
    }
}

impl fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Descriptor({})", self.name())
    }
}

/// How a bit group's extracted integer is presented.
#[derive(Debug, Clone)]
pub enum GroupType {
    Int,
    Enum(Arc<EnumDescriptor>),
}

/// A named bit range `lsb..=msb` within a flags integer.
#[derive(Debug, Clone)]
pub struct BitGroup {
    pub(crate) name: String,
    pub(crate) lsb: u32,
    pub(crate) msb: u32,
    pub(crate) value_type: GroupType,
}

impl BitGroup {
    pub fn new(name: impl Into<String>, lsb: u32, msb: u32) -> Self {
        Self { name: name.into(), lsb, msb, value_type: GroupType::Int }
    }

    /// A single-bit group at `bit`.
    pub fn bit(name: impl Into<String>, bit: u32) -> Self {
        Self::new(name, bit, bit)
    }

    /// Presents the extracted integer through `enumeration`.
    pub fn with_enum(mut self, enumeration: Arc<EnumDescriptor>) -> Self {
        self.value_type = GroupType::Enum(enumeration);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Inclusive bit range covered by the group.
    pub fn bits(&self) -> (u32, u32) {
        (self.lsb, self.msb)
    }

    pub fn value_type(&self) -> &GroupType {
        &self.value_type
    }

    /// Unshifted mask of the group. A reversed range masks nothing.
    pub fn mask(&self) -> u64 {
        if self.msb < self.lsb {
            return 0;
        }
        1u64.checked_shl(self.msb - self.lsb + 1).map_or(u64::MAX, |bit| bit - 1)
    }

    pub fn extract(&self, raw: u64) -> u64 {
        raw.checked_shr(self.lsb).unwrap_or(0) & self.mask()
    }
}

/// Named bit groups overlaid on an integer primitive.
#[derive(Debug)]
pub struct FlagsDescriptor {
    pub(crate) name: String,
    pub(crate) base: Primitive,
    pub(crate) groups: Vec<BitGroup>,
}

impl FlagsDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base(&self) -> Primitive {
        self.base
    }

    pub fn groups(&self) -> &[BitGroup] {
        &self.groups
    }
}

/// Named integer constants with a canonical instance cache.
#[derive(Debug)]
pub struct EnumDescriptor {
    /// Process-unique identity stamped onto every decoded value.
    pub(crate) id: u64,
    pub(crate) name: Arc<str>,
    pub base: Primitive,
    pub(crate) names: HashMap<i64, Arc<str>>,
    pub(crate) values: HashMap<String, i64>,
    pub(crate) cache: Mutex<HashMap<i64, Arc<EnumValue>>>,
}

impl EnumDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Looks up the constant declared under `name`.
    pub fn value_of(&self, name: &str) -> Option<i64> {
        self.values.get(name).copied()
    }

    /// Returns the declared name of `value`, or its decimal text when undeclared.
    pub fn name_for(&self, value: i64) -> String {
        match self.names.get(&value) {
            Some(name) => name.to_string(),
            None => value.to_string(),
        }
    }
}

/// Element count of an array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArrayLength {
    /// Count fixed at definition time.
    Fixed(usize),
    /// Count read from the stream right before the elements.
    Counted(Primitive),
}

/// Homogeneous sequence of any descriptor.
#[derive(Debug)]
pub struct ArrayDescriptor {
    pub element: Descriptor,
    pub length: ArrayLength,
}

/// Picks a field's concrete type from the attributes decoded so far.
///
/// Returning `Ok(None)` marks the field as absent for this instance.
pub type Resolver = Arc<dyn Fn(&AttributeMap, &Context) -> Result<Option<Descriptor>> + Send + Sync>;

#[derive(Clone)]
pub enum FieldType {
    Fixed(Descriptor),
    Resolved(Resolver),
}

impl fmt::Debug for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FieldType::Fixed(d) => write!(f, "Fixed({})", d.name()),
            FieldType::Resolved(_) => f.write_str("Resolved(..)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub ty: FieldType,
}

/// Ordered named fields, optionally extending a parent struct.
#[derive(Debug)]
pub struct StructDescriptor {
    pub name: String,
    pub parent: Option<Arc<StructDescriptor>>,
    /// Full field list: ancestors' fields first (most-base first), then own.
    pub(crate) fields: Vec<Field>,
}

impl StructDescriptor {
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// True if `self` is `other` or derives from it.
    pub fn extends(&self, other: &Arc<StructDescriptor>) -> bool {
        let mut current = Some(self);
        while let Some(desc) = current {
            if std::ptr::eq(desc, Arc::as_ptr(other)) {
                return true;
            }
            current = desc.parent.as_deref();
        }
        false
    }
}
