//! Map — a hashed, order-insensitive sequence of key-value pairs.

use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::hash::EMPTY_MAP_NONCE;
use super::mapped::Mapped;
use super::reader::{Reader, ReaderError};
use super::{Tag, Value};

#[derive(Debug, Clone)]
pub struct MapValue {
    data: Mapped,
    hash_cache: Arc<AtomicU64>,
}

impl MapValue {
    pub fn new(size: usize) -> Self {
        MapValue {
            data: Mapped::new(size),
            hash_cache: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn from_pairs(pairs: Vec<(Value, Value)>) -> Self {
        let mut m = MapValue::new(pairs.len());
        for (k, v) in pairs {
            m.data.put(k, v);
        }
        m
    }

    pub fn get(&self, key: &Value) -> Option<Value> {
        self.data.get(key)
    }

    pub fn for_each<E>(
        &self,
        f: impl FnMut(&Value, &Value) -> Result<(), E>,
    ) -> Result<(), E> {
        self.data.for_each(f)
    }

    pub fn count(&self) -> usize {
        self.data.count()
    }

    pub(super) fn marshal<W: io::Write>(&self, w: &mut W) -> io::Result<()> {
        self.data.marshal(Tag::Map, w)
    }

    pub(super) fn equal(&self, other: &MapValue) -> bool {
        self.data.equal(&other.data)
    }

    pub(super) fn hash(&self) -> u64 {
        let cached = self.hash_cache.load(Ordering::Acquire);
        if cached != 0 {
            return cached;
        }
        let h = EMPTY_MAP_NONCE.get() ^ self.data.hash();
        self.hash_cache.store(h, Ordering::Release);
        h
    }
}

pub(super) fn read_map<R: io::BufRead>(r: &mut Reader<R>) -> Result<Value, ReaderError> {
    let data = Mapped::read(r)?;
    Ok(Value::Map(MapValue {
        data,
        hash_cache: Arc::new(AtomicU64::new(0)),
    }))
}
