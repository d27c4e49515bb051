//! Enumerations: integers canonicalized against a named domain.
//!
//! Every enumeration owns an instance cache, so decoding the same integer twice
//! yields the same `Arc<EnumValue>`. Values outside the declared domain are
//! normal in real files and decode like any other.

use std::collections::HashMap;
use std::io::Read;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use log::{debug, trace};

use crate::dataio::codec::primitive;
use crate::dataio::cursor::StreamCursor;
use crate::dataio::types::descriptor::EnumDescriptor;
use crate::dataio::types::error::{DataioError, Result};
use crate::dataio::types::models::Primitive;
use crate::dataio::types::value::{EnumValue, Value};

static NEXT_ENUM_ID: AtomicU64 = AtomicU64::new(1);

/// Defines an enumeration over the integer primitive `base`.
///
/// `names` are numbered sequentially from zero; `named_values` carry explicit
/// values. When two names share a value, the first declared wins for
/// [`EnumDescriptor::name_for`].
///
/// # Errors
/// `InvalidSchema` if `base` is not an integer primitive or a name is declared twice.
pub fn enumeration(
    name: impl Into<String>,
    base: Primitive,
    names: &[&str],
    named_values: &[(&str, i64)],
) -> Result<Arc<EnumDescriptor>> {
    let name: String = name.into();
    if !base.is_integer() {
        return Err(DataioError::InvalidSchema(format!(
            "enumeration `{}` needs an integer base, got {}",
            name, base
        )));
    }

    let declared = names
        .iter()
        .enumerate()
        .map(|(i, n)| (*n, i as i64))
        .chain(named_values.iter().copied());

    let mut by_value: HashMap<i64, Arc<str>> = HashMap::new();
    let mut by_name: HashMap<String, i64> = HashMap::new();
    for (constant, value) in declared {
        if by_name.insert(constant.to_string(), value).is_some() {
            return Err(DataioError::InvalidSchema(format!(
                "enumeration `{}` declares `{}` twice",
                name, constant
            )));
        }
        by_value.entry(value).or_insert_with(|| Arc::from(constant));
    }

    debug!("Defined enumeration {} over {} with {} constants", name, base, by_name.len());
    Ok(Arc::new(EnumDescriptor {
        id: NEXT_ENUM_ID.fetch_add(1, Ordering::Relaxed),
        name: Arc::from(name),
        base,
        names: by_value,
        values: by_name,
        cache: Mutex::new(HashMap::new()),
    }))
}

impl EnumDescriptor {
    /// Returns the canonical instance for `value`, creating it on first use.
    pub fn canonical(&self, value: i64) -> Result<Arc<EnumValue>> {
        let mut cache = self.cache.lock().map_err(|_| DataioError::LockPoisoned)?;
        let instance = cache.entry(value).or_insert_with(|| {
            trace!("Caching {} value {}", self.name, value);
            Arc::new(EnumValue {
                enum_id: self.id,
                enum_name: Arc::clone(&self.name),
                value,
                name: self.names.get(&value).cloned(),
            })
        });
        Ok(Arc::clone(instance))
    }
}

/// Reads the base integer and returns its canonical enum instance.
pub fn decode<R: Read>(descriptor: &EnumDescriptor, cursor: &mut StreamCursor<R>) -> Result<Value> {
    let raw = primitive::read_integer(descriptor.base, cursor)?;
    let value = descriptor.canonical(raw)?;
    trace!("{} = {} ({})", descriptor.name, value.name(), raw);
    Ok(Value::Enum(value))
}
