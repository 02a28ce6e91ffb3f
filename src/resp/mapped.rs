//! Shared key-value storage for Map and Attribute. Overwrite-on-match `put`
//! differs from `HashedArray::put`'s ignore-on-match (Set) semantics, so this
//! manipulates bucket chains directly rather than going through it.
//! See `original_source/pkg/resp/mapped.go`.

use std::io;

use super::hashed::{HashedArray, HashedEntry};
use super::marshal::write_tag;
use super::reader::{Reader, ReaderError};
use super::{Tag, Value};

#[derive(Debug, Clone)]
pub(super) struct MappedPair {
    pub(super) key: Value,
    pub(super) value: Value,
}

impl HashedEntry for MappedPair {
    fn hashed_hash(&self) -> u64 {
        self.key.hash() ^ self.value.hash()
    }

    fn hashed_equal(&self, other: &Self) -> bool {
        self.key.equal(&other.key) && self.value.equal(&other.value)
    }

    fn hashed_marshal<W: io::Write>(&self, w: &mut W) -> io::Result<()> {
        self.key.marshal(w)?;
        self.value.marshal(w)
    }
}

#[derive(Debug, Clone)]
pub(super) struct Mapped {
    data: HashedArray<MappedPair>,
}

impl Mapped {
    pub fn new(size: usize) -> Self {
        Mapped {
            data: HashedArray::new(size),
        }
    }

    pub fn read<R: io::BufRead>(r: &mut Reader<R>) -> Result<Self, ReaderError> {
        let len = r.read_len()?;
        let mut m = Mapped::new(len);
        for _ in 0..len {
            let key = r.next()?;
            let val = r.next()?;
            m.put(key, val);
        }
        Ok(m)
    }

    pub fn get(&self, key: &Value) -> Option<Value> {
        let idx = self.data.index_for(key.hash())?;
        let mut cur = self.data.bucket(idx);
        while let Some(node) = cur {
            if node.item().key.equal(key) {
                return Some(node.item().value.clone());
            }
            cur = node.next();
        }
        None
    }

    /// Overwrites the value if `key` is already present (in place, preserving
    /// chain position); otherwise prepends a new entry.
    pub fn put(&mut self, key: Value, value: Value) {
        let Some(idx) = self.data.index_for(key.hash()) else {
            return;
        };
        let mut cur = self.data.bucket_mut(idx);
        loop {
            match cur {
                Some(node) => {
                    if node.item().key.equal(&key) {
                        node.item_mut().value = value;
                        return;
                    }
                    cur = node.next_mut();
                }
                None => break,
            }
        }
        let head = self.data.bucket_mut(idx).take();
        *self.data.bucket_mut(idx) = Some(super::hashed::Node::new_head(
            MappedPair { key, value },
            head,
        ));
    }

    pub fn for_each<E>(
        &self,
        mut f: impl FnMut(&Value, &Value) -> Result<(), E>,
    ) -> Result<(), E> {
        self.data.for_each(|p| f(&p.key, &p.value))
    }

    pub fn count(&self) -> usize {
        self.data.count()
    }

    pub fn bucket_count(&self) -> usize {
        self.data.bucket_count()
    }

    pub fn marshal<W: io::Write>(&self, tag: Tag, w: &mut W) -> io::Result<()> {
        write_tag(tag, w)?;
        self.data.marshal(w)
    }

    pub fn equal(&self, other: &Mapped) -> bool {
        self.data.equal(&other.data)
    }

    pub fn hash(&self) -> u64 {
        self.data.hash()
    }
}
