//! Caller-supplied decoding context.

use std::collections::HashMap;
use std::sync::Arc;

use super::models::FormatVersion;
use super::value::{AttributeMap, Value};

/// Data threaded unchanged through every recursive decode call.
///
/// The decoder never inspects it; only struct field resolvers read it.
#[derive(Debug, Clone, Default)]
pub struct Context {
    version: Option<FormatVersion>,
    compressed: bool,
    parent: Option<Arc<AttributeMap>>,
    extras: HashMap<String, Value>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_version(mut self, version: FormatVersion) -> Self {
        self.version = Some(version);
        self
    }

    pub fn with_compressed(mut self, compressed: bool) -> Self {
        self.compressed = compressed;
        self
    }

    /// Attaches the attributes of the enclosing record (e.g. its header).
    pub fn with_parent(mut self, parent: AttributeMap) -> Self {
        self.parent = Some(Arc::new(parent));
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extras.insert(key.into(), value);
        self
    }

    pub fn version(&self) -> Option<FormatVersion> {
        self.version
    }

    /// True when the document version is known and at least `version`.
    pub fn version_at_least(&self, version: FormatVersion) -> bool {
        self.version.is_some_and(|v| v >= version)
    }

    pub fn is_compressed(&self) -> bool {
        self.compressed
    }

    pub fn parent(&self) -> Option<&AttributeMap> {
        self.parent.as_deref()
    }

    pub fn extra(&self, key: &str) -> Option<&Value> {
        self.extras.get(key)
    }
}
