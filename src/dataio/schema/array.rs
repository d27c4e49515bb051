//! Fixed-count and count-prefixed arrays.

use std::collections::HashMap;
use std::io::Read;
use std::sync::{Arc, Mutex, OnceLock};

use log::{debug, trace};

use crate::dataio::decoder;
use crate::dataio::codec::primitive;
use crate::dataio::cursor::StreamCursor;
use crate::dataio::types::context::Context;
use crate::dataio::types::descriptor::{ArrayDescriptor, ArrayLength, Descriptor};
use crate::dataio::types::error::{DataioError, Result};
use crate::dataio::types::models::Primitive;
use crate::dataio::types::value::Value;

/// Upper bound on preallocation, so a corrupt count cannot reserve gigabytes
/// before the stream runs out.
const MAX_PREALLOCATED_ELEMENTS: usize = 4096;

type InternTable = Mutex<HashMap<(Descriptor, usize), Arc<ArrayDescriptor>>>;

/// Fixed-count descriptors, interned by `(element, count)`.
static FIXED_ARRAYS: OnceLock<InternTable> = OnceLock::new();

/// Returns the fixed-count array descriptor for `(element, count)`.
///
/// Repeated calls with the same element descriptor and count return the same
/// shared descriptor.
pub fn fixed_array(element: impl Into<Descriptor>, count: usize) -> Result<Descriptor> {
    let element = element.into();
    let table = FIXED_ARRAYS.get_or_init(|| Mutex::new(HashMap::new()));
    let mut table = table.lock().map_err(|_| DataioError::LockPoisoned)?;
    let descriptor = table
        .entry((element.clone(), count))
        .or_insert_with(|| {
            trace!("Interning ARRAY({}, {})", element.name(), count);
            Arc::new(ArrayDescriptor { element, length: ArrayLength::Fixed(count) })
        });
    Ok(Descriptor::Array(Arc::clone(descriptor)))
}

/// Defines an array whose element count is read with `count` first.
///
/// # Errors
/// `InvalidSchema` if `count` is not an unsigned integer primitive.
pub fn counted_array(count: Primitive, element: impl Into<Descriptor>) -> Result<Descriptor> {
    if !count.is_integer() || count.is_signed() {
        return Err(DataioError::InvalidSchema(format!(
            "array count must be an unsigned integer primitive, got {}",
            count
        )));
    }
    Ok(Descriptor::Array(Arc::new(ArrayDescriptor {
        element: element.into(),
        length: ArrayLength::Counted(count),
    })))
}

/// Decodes the elements in stream order.
pub fn decode<R: Read>(
    descriptor: &ArrayDescriptor,
    cursor: &mut StreamCursor<R>,
    context: &Context,
) -> Result<Value> {
    let count = match descriptor.length {
        ArrayLength::Fixed(n) => n,
        ArrayLength::Counted(prefix) => primitive::read_integer(prefix, cursor)? as usize,
    };
    debug!(
        "Decoding {} x {} at offset {}",
        count,
        descriptor.element.name(),
        cursor.position()
    );

    let mut items = Vec::with_capacity(count.min(MAX_PREALLOCATED_ELEMENTS));
    for _ in 0..count {
        items.push(decoder::decode(&descriptor.element, cursor, context)?);
    }
    Ok(Value::Array(items))
}
