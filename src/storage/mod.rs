//! The hierarchical key-value store: the `Storage` trait, the `Key` type,
//! and the `Accept`/`IterationError` iteration contract.
//! See `original_source/pkg/storage/storage.go`.

mod memory;

use std::fmt;

use bytes::Bytes;
use thiserror::Error;

use crate::resp::Value;

pub use memory::Memory;

/// A non-empty ordered sequence of bulk-string components. The empty
/// sequence is valid only as an iteration prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Key(Vec<Bytes>);

impl Key {
    pub fn single(component: impl Into<Bytes>) -> Self {
        Key(vec![component.into()])
    }

    pub fn components(&self) -> &[Bytes] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&self, component: Bytes) -> Key {
        let mut v = self.0.clone();
        v.push(component);
        Key(v)
    }

    /// Converts a command argument into a `Key`: a single BulkString, or a
    /// non-empty Array of BulkStrings.
    pub fn from_value(v: &Value) -> Result<Key, StorageError> {
        match v {
            Value::BulkString(b) => Ok(Key(vec![b.clone()])),
            Value::Array(arr) => {
                if arr.items().is_empty() {
                    return Err(StorageError::EmptyKey);
                }
                let mut components = Vec::with_capacity(arr.items().len());
                for e in arr.items() {
                    match e {
                        Value::BulkString(b) => components.push(b.clone()),
                        other => return Err(StorageError::InvalidKeyType(other.tag())),
                    }
                }
                Ok(Key(components))
            }
            other => Err(StorageError::InvalidKeyType(other.tag())),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = self.0.iter();
        if let Some(first) = parts.next() {
            write!(f, "{}", String::from_utf8_lossy(first))?;
        }
        for c in parts {
            write!(f, "\0{}", String::from_utf8_lossy(c))?;
        }
        Ok(())
    }
}

/// A user-supplied visitor passed to `Storage::iterate_keys`.
pub type Accept = dyn FnMut(&Key) -> Result<(), IterationError>;

#[derive(Debug)]
pub enum IterationError {
    /// Returned by an `Accept` to signal a clean, early stop — not
    /// propagated as an error out of `iterate_keys`, mirroring the
    /// original's `StopIteration` sentinel (`original_source/pkg/storage/storage.go`).
    Stop,
    Other(StorageError),
}

impl From<StorageError> for IterationError {
    fn from(e: StorageError) -> Self {
        IterationError::Other(e)
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("empty key")]
    EmptyKey,
    #[error("invalid key type: {0}")]
    InvalidKeyType(crate::resp::Tag),
    #[error("key not found: {0}")]
    KeyNotFound(Key),
}

pub trait Storage: Send + Sync {
    fn get(&self, key: &Key) -> Result<Value, StorageError>;
    fn set(&self, key: &Key, value: Value) -> Result<Option<Value>, StorageError>;
    fn delete(&self, key: &Key) -> Result<Value, StorageError>;
    /// Reports a missing key as an error rather than `Ok(false)` — preserved
    /// from the observed original behavior (see DESIGN.md).
    fn exists(&self, key: &Key) -> Result<bool, StorageError>;
    fn iterate_keys(&self, prefix: &Key, accept: &mut Accept) -> Result<(), StorageError>;
}
