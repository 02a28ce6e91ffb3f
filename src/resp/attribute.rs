//! Attribute — metadata with the same wire shape as Map, preceding another
//! value. The reader never surfaces it (see `Reader::next`'s attribute
//! transparency step); this type exists for completeness and for callers
//! constructing values directly.

use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::hash::EMPTY_ATTRIBUTE_NONCE;
use super::mapped::Mapped;
use super::reader::{Reader, ReaderError};
use super::{Tag, Value};

#[derive(Debug, Clone)]
pub struct AttributeValue {
    data: Mapped,
    hash_cache: Arc<AtomicU64>,
}

impl AttributeValue {
    pub fn new(size: usize) -> Self {
        AttributeValue {
            data: Mapped::new(size),
            hash_cache: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn get(&self, key: &Value) -> Option<Value> {
        self.data.get(key)
    }

    pub fn count(&self) -> usize {
        self.data.count()
    }

    pub(super) fn marshal<W: io::Write>(&self, w: &mut W) -> io::Result<()> {
        self.data.marshal(Tag::Attribute, w)
    }

    pub(super) fn equal(&self, other: &AttributeValue) -> bool {
        self.data.equal(&other.data)
    }

    pub(super) fn hash(&self) -> u64 {
        let cached = self.hash_cache.load(Ordering::Acquire);
        if cached != 0 {
            return cached;
        }
        let h = EMPTY_ATTRIBUTE_NONCE.get() ^ self.data.hash();
        self.hash_cache.store(h, Ordering::Release);
        h
    }
}

pub(super) fn read_attribute<R: io::BufRead>(r: &mut Reader<R>) -> Result<Value, ReaderError> {
    let data = Mapped::read(r)?;
    Ok(Value::Attribute(AttributeValue {
        data,
        hash_cache: Arc::new(AtomicU64::new(0)),
    }))
}
