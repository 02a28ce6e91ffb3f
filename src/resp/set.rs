//! Set — a hashed, order-insensitive, deduplicated bag of values.

use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::hash::EMPTY_SET_NONCE;
use super::hashed::{HashedArray, HashedEntry};
use super::marshal::write_tag;
use super::reader::{Reader, ReaderError};
use super::{Tag, Value};

impl HashedEntry for Value {
    fn hashed_hash(&self) -> u64 {
        self.hash()
    }

    fn hashed_equal(&self, other: &Self) -> bool {
        self.equal(other)
    }

    fn hashed_marshal<W: io::Write>(&self, w: &mut W) -> io::Result<()> {
        self.marshal(w)
    }
}

#[derive(Debug, Clone)]
pub struct SetValue {
    data: HashedArray<Value>,
    hash_cache: Arc<AtomicU64>,
}

impl SetValue {
    pub fn new(items: Vec<Value>) -> Self {
        let mut data = HashedArray::new(items.len());
        for v in items {
            data.put(v);
        }
        SetValue {
            data,
            hash_cache: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn contains(&self, v: &Value) -> bool {
        self.data.contains(v)
    }

    pub fn elements(&self) -> Vec<Value> {
        self.data.elements()
    }

    pub fn count(&self) -> usize {
        self.data.count()
    }

    pub(super) fn marshal<W: io::Write>(&self, w: &mut W) -> io::Result<()> {
        write_tag(Tag::Set, w)?;
        self.data.marshal(w)
    }

    pub(super) fn equal(&self, other: &SetValue) -> bool {
        self.data.equal(&other.data)
    }

    pub(super) fn hash(&self) -> u64 {
        let cached = self.hash_cache.load(Ordering::Acquire);
        if cached != 0 {
            return cached;
        }
        let h = EMPTY_SET_NONCE.get() ^ self.data.hash();
        self.hash_cache.store(h, Ordering::Release);
        h
    }
}

pub(super) fn read_set<R: io::BufRead>(r: &mut Reader<R>) -> Result<Value, ReaderError> {
    let len = r.read_len()?;
    let mut data = HashedArray::new(len);
    for _ in 0..len {
        data.put(r.next()?);
    }
    Ok(Value::Set(SetValue {
        data,
        hash_cache: Arc::new(AtomicU64::new(0)),
    }))
}
