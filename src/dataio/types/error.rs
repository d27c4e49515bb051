//! Custom error types for the dataio-reader crate.

use thiserror::Error;

/// The primary error type for all decoding operations in this crate.
#[derive(Debug, Error)]
pub enum DataioError {
    /// The stream yielded fewer bytes than a primitive or length prefix required.
    #[error("Unexpected end of stream at offset {position} (needed {requested} more bytes)")]
    EndOfStream { position: u64, requested: usize },

    /// An error originating from the underlying reader, other than running out of bytes.
    #[error("I/O error: {0:?}")]
    Io(#[from] std::io::Error),

    /// A struct field failed to decode. Each enclosing struct adds its own layer,
    /// so the chain of `source()` calls walks the full field path down to the root cause.
    #[error("can't parse field `{field}` of `{struct_name}`")]
    StructField {
        struct_name: String,
        field: String,
        #[source]
        source: Box<DataioError>,
    },

    /// A field resolver could not pick a concrete type from the values decoded so far.
    #[error("Field type resolution failed: {0}")]
    Resolver(String),

    /// A descriptor was defined inconsistently (duplicate names, bad bit range, ...).
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    /// A format version string could not be parsed.
    #[error("Invalid format version: {0}")]
    InvalidVersion(String),

    /// A compressed stream could not be inflated.
    #[error("Decompression failed: {0}")]
    Decompression(String),

    /// A descriptor cache lock was poisoned by a panic in another thread.
    #[error("A descriptor cache lock was poisoned, indicating a panic in another thread holding the lock.")]
    LockPoisoned,
}

impl DataioError {
    /// Wraps `self` as the failure of `field` inside `struct_name`.
    pub fn in_field(self, struct_name: &str, field: &str) -> Self {
        DataioError::StructField {
            struct_name: struct_name.to_owned(),
            field: field.to_owned(),
            source: Box::new(self),
        }
    }

    /// Returns the innermost error, skipping every `StructField` layer.
    pub fn root_cause(&self) -> &DataioError {
        let mut current = self;
        while let DataioError::StructField { source, .. } = current {
            current = source;
        }
        current
    }

    /// Returns `(struct_name, field)` pairs from the outermost struct inwards.
    pub fn field_path(&self) -> Vec<(&str, &str)> {
        let mut path = Vec::new();
        let mut current = self;
        while let DataioError::StructField { struct_name, field, source } = current {
            path.push((struct_name.as_str(), field.as_str()));
            current = source;
        }
        path
    }

    /// True when the root cause is a truncated stream.
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self.root_cause(), DataioError::EndOfStream { .. })
    }
}

/// A convenience `Result` type alias using the crate's `DataioError` type.
pub type Result<T> = std::result::Result<T, DataioError>;
