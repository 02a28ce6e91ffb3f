//! Open-chained, bucket-sized hash table backing Map, Set, Attribute.
//!
//! The bucket count equals the declared wire length, not the live element
//! count, so that a parse-then-marshal round trip reproduces the same chain
//! layout byte for byte. See `original_source/pkg/resp/hashed.go`.

use std::io::{self, Write};

use super::marshal::write_int;

/// A value storable in a [`HashedArray`] bucket chain.
pub trait HashedEntry: Clone {
    fn hashed_hash(&self) -> u64;
    fn hashed_equal(&self, other: &Self) -> bool;
    fn hashed_marshal<W: Write>(&self, w: &mut W) -> io::Result<()>;
}

#[derive(Clone)]
pub(super) struct Node<T> {
    item: T,
    next: Option<Box<Node<T>>>,
}

impl<T: HashedEntry> Node<T> {
    fn contains(&self, v: &T) -> bool {
        let mut cur = self;
        loop {
            if cur.item.hashed_equal(v) {
                return true;
            }
            match &cur.next {
                Some(n) => cur = n,
                None => return false,
            }
        }
    }

    fn count(&self) -> usize {
        let mut n = 1;
        let mut cur = self;
        while let Some(next) = &cur.next {
            n += 1;
            cur = next;
        }
        n
    }
}

/// A fixed-size open-chained hash table, sized to the declared RESP length.
#[derive(Clone)]
pub struct HashedArray<T> {
    buckets: Vec<Option<Box<Node<T>>>>,
}

impl<T: HashedEntry> HashedArray<T> {
    pub fn new(size: usize) -> Self {
        HashedArray {
            buckets: (0..size).map(|_| None).collect(),
        }
    }

    /// Declared bucket count — this is what gets marshaled as the wire
    /// length, not [`Self::count`].
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn count(&self) -> usize {
        self.buckets
            .iter()
            .filter_map(|b| b.as_deref())
            .map(Node::count)
            .sum()
    }

    fn bucket_index(&self, h: u64) -> Option<usize> {
        if self.buckets.is_empty() {
            return None;
        }
        Some((h % self.buckets.len() as u64) as usize)
    }

    /// Set-style insertion: ignores the value if an equal entry is already
    /// present, otherwise prepends it to its bucket's chain.
    pub fn put(&mut self, v: T) {
        let Some(idx) = self.bucket_index(v.hashed_hash()) else {
            return;
        };
        let head = self.buckets[idx].take();
        if let Some(node) = &head {
            if node.contains(&v) {
                self.buckets[idx] = head;
                return;
            }
        }
        self.buckets[idx] = Some(Box::new(Node { item: v, next: head }));
    }

    pub fn contains(&self, v: &T) -> bool {
        match self.bucket_index(v.hashed_hash()) {
            Some(idx) => self.buckets[idx]
                .as_deref()
                .map(|n| n.contains(v))
                .unwrap_or(false),
            None => false,
        }
    }

    pub fn for_each<E>(&self, mut f: impl FnMut(&T) -> Result<(), E>) -> Result<(), E> {
        for bucket in &self.buckets {
            let mut cur = bucket.as_deref();
            while let Some(node) = cur {
                f(&node.item)?;
                cur = node.next.as_deref();
            }
        }
        Ok(())
    }

    pub fn elements(&self) -> Vec<T> {
        let mut res = Vec::with_capacity(self.count());
        let _ = self.for_each::<std::convert::Infallible>(|v| {
            res.push(v.clone());
            Ok(())
        });
        res
    }

    pub fn marshal<W: Write>(&self, w: &mut W) -> io::Result<()> {
        write_int(self.buckets.len() as i64, w)?;
        self.for_each(|v| v.hashed_marshal(w))
    }

    pub fn equal(&self, other: &Self) -> bool {
        if self.buckets.len() != other.buckets.len() {
            return false;
        }
        for (mine, theirs) in self.buckets.iter().zip(&other.buckets) {
            match (mine.as_deref(), theirs.as_deref()) {
                (None, None) => continue,
                (None, Some(_)) | (Some(_), None) => return false,
                (Some(mut a), _) => loop {
                    if !theirs.as_deref().unwrap().contains(&a.item) {
                        return false;
                    }
                    match &a.next {
                        Some(next) => a = next,
                        None => break,
                    }
                },
            }
        }
        true
    }

    pub fn hash(&self) -> u64 {
        let mut res = 0u64;
        let _ = self.for_each::<std::convert::Infallible>(|v| {
            res ^= v.hashed_hash();
            Ok(())
        });
        res
    }

    /// Low-level access used by [`super::mapped::Mapped`] to implement
    /// overwrite-on-match `put`/`get` semantics that differ from the
    /// ignore-on-match semantics above.
    pub(super) fn bucket_mut(&mut self, idx: usize) -> &mut Option<Box<Node<T>>> {
        &mut self.buckets[idx]
    }

    pub(super) fn bucket(&self, idx: usize) -> Option<&Node<T>> {
        self.buckets[idx].as_deref()
    }

    pub(super) fn index_for(&self, h: u64) -> Option<usize> {
        self.bucket_index(h)
    }
}

impl<T: HashedEntry> Node<T> {
    pub(super) fn item(&self) -> &T {
        &self.item
    }

    pub(super) fn item_mut(&mut self) -> &mut T {
        &mut self.item
    }

    pub(super) fn next(&self) -> Option<&Node<T>> {
        self.next.as_deref()
    }

    pub(super) fn next_mut(&mut self) -> &mut Option<Box<Node<T>>> {
        &mut self.next
    }

    pub(super) fn new_head(item: T, next: Option<Box<Node<T>>>) -> Box<Node<T>> {
        Box::new(Node { item, next })
    }
}
