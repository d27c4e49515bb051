//! Decoded values handed to the record-model layer.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use super::descriptor::{FlagsDescriptor, StructDescriptor};
use super::models::ColorRef;

/// Ordered `name -> value` map, in field declaration order.
pub type AttributeMap = IndexMap<String, Value>;

/// A fully decoded value. Owns its data; holds no reference to the stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Text(String),
    Color(ColorRef),
    Flags(FlagsValue),
    Enum(Arc<EnumValue>),
    Array(Vec<Value>),
    Struct(StructValue),
}

impl Value {
    /// Integer view. Flags and enums are integer-compatible.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Flags(f) => Some(f.raw() as i64),
            Value::Enum(e) => Some(e.value()),
            Value::Color(c) => Some(c.0 as i64),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Interprets an integer as a UTF-16 code unit. Surrogates yield `None`.
    pub fn as_char(&self) -> Option<char> {
        let code = u16::try_from(self.as_int()?).ok()?;
        char::from_u32(code as u32)
    }

    pub fn as_flags(&self) -> Option<&FlagsValue> {
        match self {
            Value::Flags(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&Arc<EnumValue>> {
        match self {
            Value::Enum(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&StructValue> {
        match self {
            Value::Struct(s) => Some(s),
            _ => None,
        }
    }

    /// Named member lookup for structs and flags.
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Struct(s) => s.get(name),
            Value::Flags(f) => f.get(name),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Text(s) => write!(f, "{:?}", s),
            Value::Color(c) => write!(f, "{}", c),
            Value::Flags(flags) => write!(f, "{:#010x}", flags.raw()),
            Value::Enum(e) => write!(f, "{}", e),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Value::Struct(s) => {
                write!(f, "{} {{", s.type_name())?;
                for (i, (name, value)) in s.attributes().iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, " {}: {}", name, value)?;
                }
                f.write_str(" }")
            }
        }
    }
}

/// A decoded flags integer with its bit groups already extracted.
#[derive(Debug, Clone)]
pub struct FlagsValue {
    pub(crate) descriptor: Arc<FlagsDescriptor>,
    pub(crate) raw: u64,
    pub(crate) groups: AttributeMap,
}

impl FlagsValue {
    pub fn raw(&self) -> u64 {
        self.raw
    }

    pub fn descriptor(&self) -> &Arc<FlagsDescriptor> {
        &self.descriptor
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.groups.get(name)
    }

    /// Every group name mapped to its typed value, in declaration order.
    pub fn dictvalue(&self) -> AttributeMap {
        self.groups.clone()
    }
}

impl PartialEq for FlagsValue {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.descriptor, &other.descriptor) && self.raw == other.raw
    }
}

/// Canonical decoded enumeration constant.
///
/// Obtained only through an [`EnumDescriptor`](super::descriptor::EnumDescriptor)'s
/// instance cache, so equal values of the same enumeration share one allocation.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct EnumValue {
    pub(crate) enum_id: u64,
    pub(crate) enum_name: Arc<str>,
    pub(crate) value: i64,
    pub(crate) name: Option<Arc<str>>,
}

impl EnumValue {
    pub fn value(&self) -> i64 {
        self.value
    }

    /// Declared name, or the decimal value when the constant is undeclared.
    pub fn name(&self) -> Cow<'_, str> {
        match &self.name {
            Some(name) => Cow::Borrowed(name),
            None => Cow::Owned(self.value.to_string()),
        }
    }

    pub fn is_known(&self) -> bool {
        self.name.is_some()
    }

    pub fn enum_name(&self) -> &str {
        &self.enum_name
    }
}

impl fmt::Display for EnumValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Decoded struct attributes plus the descriptor that produced them.
#[derive(Debug, Clone)]
pub struct StructValue {
    pub(crate) descriptor: Arc<StructDescriptor>,
    pub(crate) attributes: AttributeMap,
}

impl StructValue {
    pub fn type_name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn descriptor(&self) -> &Arc<StructDescriptor> {
        &self.descriptor
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    pub fn into_attributes(self) -> AttributeMap {
        self.attributes
    }

    /// True if this value was produced by `descriptor` or a struct derived from it.
    pub fn is_instance_of(&self, descriptor: &Arc<StructDescriptor>) -> bool {
        self.descriptor.extends(descriptor)
    }

    /// Attribute map with every flags member flattened into its groups.
    ///
    /// A flags field `attr` contributes its `dictvalue()` entries in place of
    /// itself; every other field is copied unchanged.
    pub fn flattened(&self) -> AttributeMap {
        let mut out = AttributeMap::with_capacity(self.attributes.len());
        for (name, value) in &self.attributes {
            match value {
                Value::Flags(flags) => out.extend(flags.dictvalue()),
                other => {
                    out.insert(name.clone(), other.clone());
                }
            }
        }
        out
    }
}

impl PartialEq for StructValue {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.descriptor, &other.descriptor) && self.attributes == other.attributes
    }
}
