//! Structs: ordered named fields with value-dependent typing.
//!
//! Fields decode strictly in declaration order. A resolver field sees the
//! attributes decoded so far plus the caller's [`Context`], which is how a
//! later field's type (or presence) depends on an earlier field's value.

use std::collections::HashSet;
use std::io::Read;
use std::sync::Arc;

use log::{debug, trace};

use crate::dataio::cursor::StreamCursor;
use crate::dataio::decoder;
use crate::dataio::types::context::Context;
use crate::dataio::types::descriptor::{Descriptor, Field, FieldType, StructDescriptor};
use crate::dataio::types::error::{DataioError, Result};
use crate::dataio::types::value::{AttributeMap, StructValue, Value};

/// Incremental definition of a struct descriptor.
///
/// # Example
/// ```
/// use dataio_reader::{Primitive, StructBuilder};
///
/// let shape = StructBuilder::new("Shape")
///     .field("kind", Primitive::UInt8)
///     .resolved_field("value", |attrs, _ctx| {
///         Ok(match attrs["kind"].as_int() {
///             Some(1) => Some(Primitive::UInt16.into()),
///             _ => Some(Primitive::UInt8.into()),
///         })
///     })
///     .build()
///     .unwrap();
/// assert_eq!(shape.fields().len(), 2);
/// ```
pub struct StructBuilder {
    name: String,
    parent: Option<Arc<StructDescriptor>>,
    fields: Vec<Field>,
}

impl StructBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), parent: None, fields: Vec::new() }
    }

    /// Prepends every field of `parent` (and its own ancestors).
    pub fn extends(mut self, parent: &Arc<StructDescriptor>) -> Self {
        self.parent = Some(Arc::clone(parent));
        self
    }

    /// A field whose type never changes.
    pub fn field(mut self, name: impl Into<String>, ty: impl Into<Descriptor>) -> Self {
        self.fields.push(Field { name: name.into(), ty: FieldType::Fixed(ty.into()) });
        self
    }

    /// A field whose type is chosen per instance. Returning `Ok(None)` skips it.
    pub fn resolved_field<F>(mut self, name: impl Into<String>, resolver: F) -> Self
    where
        F: Fn(&AttributeMap, &Context) -> Result<Option<Descriptor>> + Send + Sync + 'static,
    {
        self.fields.push(Field { name: name.into(), ty: FieldType::Resolved(Arc::new(resolver)) });
        self
    }

    /// A field present only when `present` holds, e.g. fields added in later format versions.
    pub fn optional_field<P>(self, name: impl Into<String>, ty: impl Into<Descriptor>, present: P) -> Self
    where
        P: Fn(&AttributeMap, &Context) -> bool + Send + Sync + 'static,
    {
        let ty = ty.into();
        self.resolved_field(name, move |attrs, ctx| {
            Ok(present(attrs, ctx).then(|| ty.clone()))
        })
    }

    /// Finalizes the descriptor.
    ///
    /// # Errors
    /// `InvalidSchema` if a field name appears twice anywhere in the ancestor
    /// chain. Shadowing a parent's field is not supported.
    pub fn build(self) -> Result<Arc<StructDescriptor>> {
        let mut fields = self
            .parent
            .as_ref()
            .map(|parent| parent.fields.clone())
            .unwrap_or_default();
        fields.extend(self.fields);

        let mut seen = HashSet::new();
        for field in &fields {
            if !seen.insert(field.name.as_str()) {
                return Err(DataioError::InvalidSchema(format!(
                    "struct `{}` declares field `{}` more than once in its ancestor chain",
                    self.name, field.name
                )));
            }
        }

        debug!("Defined struct {} with {} fields", self.name, fields.len());
        Ok(Arc::new(StructDescriptor { name: self.name, parent: self.parent, fields }))
    }
}

/// Defines a struct of fixed-type fields in one call.
pub fn structure<N, D>(name: impl Into<String>, fields: impl IntoIterator<Item = (N, D)>) -> Result<Arc<StructDescriptor>>
where
    N: Into<String>,
    D: Into<Descriptor>,
{
    fields
        .into_iter()
        .fold(StructBuilder::new(name), |builder, (n, d)| builder.field(n, d))
        .build()
}

/// Decodes every field in order into an attribute map.
///
/// All-or-nothing: the first failing field aborts the struct, and the error is
/// wrapped with this struct's name and the field's name.
pub fn decode_struct<R: Read>(
    descriptor: &Arc<StructDescriptor>,
    cursor: &mut StreamCursor<R>,
    context: &Context,
) -> Result<StructValue> {
    let start = cursor.position();
    let mut attributes = AttributeMap::with_capacity(descriptor.fields.len());

    for field in &descriptor.fields {
        let ty = match &field.ty {
            FieldType::Fixed(ty) => ty.clone(),
            FieldType::Resolved(resolve) => {
                match resolve(&attributes, context).map_err(|e| e.in_field(&descriptor.name, &field.name))? {
                    Some(ty) => ty,
                    None => {
                        trace!("{}.{} absent", descriptor.name, field.name);
                        continue;
                    }
                }
            }
        };

        let value = decoder::decode(&ty, cursor, context)
            .map_err(|e| e.in_field(&descriptor.name, &field.name))?;
        trace!("{}.{}: {} = {}", descriptor.name, field.name, ty.name(), value);
        attributes.insert(field.name.clone(), value);
    }

    debug!(
        "Decoded {} ({} bytes at offset {})",
        descriptor.name,
        cursor.position() - start,
        start
    );
    Ok(StructValue { descriptor: Arc::clone(descriptor), attributes })
}

pub fn decode<R: Read>(
    descriptor: &Arc<StructDescriptor>,
    cursor: &mut StreamCursor<R>,
    context: &Context,
) -> Result<Value> {
    decode_struct(descriptor, cursor, context).map(Value::Struct)
}
