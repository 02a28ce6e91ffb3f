//! Array — an ordered, top-level-or-nested sequence of values.

use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::hash::EMPTY_ARRAY_NONCE;
use super::marshal::write_tag;
use super::reader::{Reader, ReaderError};
use super::{Tag, Value};

#[derive(Debug, Clone)]
pub struct ArrayValue {
    items: Vec<Value>,
    hash_cache: Arc<AtomicU64>,
}

impl ArrayValue {
    pub fn new(items: Vec<Value>) -> Self {
        ArrayValue {
            items,
            hash_cache: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn items(&self) -> &[Value] {
        &self.items
    }

    pub fn count(&self) -> usize {
        self.items.len()
    }

    pub(super) fn marshal<W: io::Write>(&self, w: &mut W) -> io::Result<()> {
        write_tag(Tag::Array, w)?;
        super::marshal::write_int(self.items.len() as i64, w)?;
        for v in &self.items {
            v.marshal(w)?;
        }
        Ok(())
    }

    pub(super) fn equal(&self, other: &ArrayValue) -> bool {
        self.items.len() == other.items.len()
            && self.items.iter().zip(&other.items).all(|(a, b)| a.equal(b))
    }

    pub(super) fn hash(&self) -> u64 {
        let cached = self.hash_cache.load(Ordering::Acquire);
        if cached != 0 {
            return cached;
        }
        let mut h = EMPTY_ARRAY_NONCE.get();
        for v in &self.items {
            h ^= v.hash();
        }
        self.hash_cache.store(h, Ordering::Release);
        h
    }
}

pub(super) fn read_array<R: io::BufRead>(r: &mut Reader<R>) -> Result<Value, ReaderError> {
    let items = r.read_values()?;
    Ok(Value::Array(ArrayValue::new(items)))
}
