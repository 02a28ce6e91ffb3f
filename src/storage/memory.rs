//! An in-memory, tree-shaped key store. Each path component owns a child
//! map and an optional value; a key's value lives at the node reached by
//! walking its components from the root. See
//! `original_source/pkg/storage/memory.go`.
//!
//! Go's original hands a read/write lock from parent to child one level at
//! a time, releasing the parent only once the child is held, so a
//! concurrent writer can never observe a node disappear mid-descent. Rust's
//! `RwLockReadGuard`/`RwLockWriteGuard` borrow from the `RwLock` they came
//! from and can't be carried past the point their parent guard is dropped
//! without unsafe self-referencing. Instead each node is reached through an
//! `Arc`, so a child clone keeps its allocation alive independent of the
//! parent's map — we lock one node at a time, clone the next `Arc`, and
//! drop the current guard before locking the child. A concurrent delete can
//! still prune the child from the parent's map in the gap, but the clone we
//! already hold stays valid; it simply describes a branch that is no
//! longer reachable from the root, which is the outcome a literal
//! lock-handoff would also produce for a delete racing a read one step
//! ahead of it.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use bytes::Bytes;

use crate::resp::Value;

use super::{Accept, IterationError, Key, Storage, StorageError};

#[derive(Default)]
struct NodeInner {
    children: HashMap<Bytes, Arc<Node>>,
    value: Option<Value>,
    /// Bumped on every mutation to this node's `children`; lets `for_each`
    /// detect concurrent structural changes mid-iteration.
    version: u64,
}

struct Node {
    inner: RwLock<NodeInner>,
}

impl Node {
    fn new() -> Arc<Node> {
        Arc::new(Node {
            inner: RwLock::new(NodeInner::default()),
        })
    }

    fn is_prunable(&self) -> bool {
        let g = self.inner.read().unwrap();
        g.value.is_none() && g.children.is_empty()
    }
}

/// The default `Storage` implementation: a single tree, shared across
/// connections behind `Arc<Node>`s and per-node locks.
pub struct Memory {
    root: Arc<Node>,
}

impl Memory {
    pub fn new() -> Self {
        Memory { root: Node::new() }
    }

    /// Walks from the root along `comps`, returning the node reached, or
    /// `None` if any component along the way is missing.
    fn fetch(&self, comps: &[Bytes]) -> Option<Arc<Node>> {
        let mut current = self.root.clone();
        for comp in comps {
            let next = {
                let g = current.inner.read().unwrap();
                g.children.get(comp).cloned()
            };
            current = next?;
        }
        Some(current)
    }

    fn for_each(
        node: &Arc<Node>,
        prefix: &mut Vec<Bytes>,
        accept: &mut Accept,
    ) -> Result<(), IterationError> {
        let mut guard = node.inner.read().unwrap();
        let mut keys: Vec<Bytes> = guard.children.keys().cloned().collect();
        let mut seen_version = guard.version;
        let mut i = 0;
        while i < keys.len() {
            if guard.version != seen_version {
                let seen: HashSet<&Bytes> = keys[..i].iter().collect();
                let mut fresh: Vec<Bytes> = guard
                    .children
                    .keys()
                    .filter(|k| !seen.contains(k))
                    .cloned()
                    .collect();
                keys.truncate(i);
                keys.append(&mut fresh);
                seen_version = guard.version;
                continue;
            }
            let child = guard.children.get(&keys[i]).cloned();
            if let Some(child) = child {
                prefix.push(keys[i].clone());
                drop(guard);
                Self::for_each(&child, prefix, accept)?;
                prefix.pop();
                guard = node.inner.read().unwrap();
            }
            i += 1;
        }
        let has_value = guard.value.is_some();
        drop(guard);
        if has_value {
            let key = Key(prefix.clone());
            accept(&key)?;
        }
        Ok(())
    }
}

impl Default for Memory {
    fn default() -> Self {
        Memory::new()
    }
}

impl Storage for Memory {
    fn get(&self, key: &Key) -> Result<Value, StorageError> {
        if key.is_empty() {
            return Err(StorageError::EmptyKey);
        }
        let node = self
            .fetch(key.components())
            .ok_or_else(|| StorageError::KeyNotFound(key.clone()))?;
        let g = node.inner.read().unwrap();
        g.value
            .clone()
            .ok_or_else(|| StorageError::KeyNotFound(key.clone()))
    }

    fn set(&self, key: &Key, value: Value) -> Result<Option<Value>, StorageError> {
        if key.is_empty() {
            return Err(StorageError::EmptyKey);
        }
        let mut current = self.root.clone();
        for comp in key.components() {
            let next = {
                let mut g = current.inner.write().unwrap();
                if let Some(child) = g.children.get(comp) {
                    child.clone()
                } else {
                    let child = Node::new();
                    g.children.insert(comp.clone(), child.clone());
                    g.version += 1;
                    child
                }
            };
            current = next;
        }
        let mut g = current.inner.write().unwrap();
        let old = g.value.replace(value);
        g.version += 1;
        Ok(old)
    }

    fn delete(&self, key: &Key) -> Result<Value, StorageError> {
        if key.is_empty() {
            return Err(StorageError::EmptyKey);
        }
        let comps = key.components();
        let mut path: Vec<(Arc<Node>, Bytes)> = Vec::with_capacity(comps.len());
        let mut current = self.root.clone();
        for comp in comps {
            let next = {
                let g = current.inner.read().unwrap();
                g.children.get(comp).cloned()
            };
            let child = next.ok_or_else(|| StorageError::KeyNotFound(key.clone()))?;
            path.push((current.clone(), comp.clone()));
            current = child;
        }

        let old = {
            let mut g = current.inner.write().unwrap();
            let taken = g.value.take();
            g.version += 1;
            taken.ok_or_else(|| StorageError::KeyNotFound(key.clone()))?
        };

        // Prune empty nodes from the leaf back up to the root. Once one
        // level isn't prunable it still has a child, so every ancestor
        // above it has a non-empty `children` map too — safe to stop.
        for (parent, comp) in path.into_iter().rev() {
            let mut pg = parent.inner.write().unwrap();
            let prunable = pg
                .children
                .get(&comp)
                .map(|c| c.is_prunable())
                .unwrap_or(false);
            if prunable {
                pg.children.remove(&comp);
                pg.version += 1;
            } else {
                break;
            }
        }

        Ok(old)
    }

    fn exists(&self, key: &Key) -> Result<bool, StorageError> {
        self.get(key).map(|_| true)
    }

    fn iterate_keys(&self, prefix: &Key, accept: &mut Accept) -> Result<(), StorageError> {
        let node = self
            .fetch(prefix.components())
            .ok_or_else(|| StorageError::KeyNotFound(prefix.clone()))?;
        let mut full = prefix.components().to_vec();
        match Self::for_each(&node, &mut full, accept) {
            Ok(()) => Ok(()),
            Err(IterationError::Stop) => Ok(()),
            Err(IterationError::Other(e)) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resp::Value;
    use std::sync::Mutex;
    use std::thread;

    fn key(s: &str) -> Key {
        Key::single(Bytes::copy_from_slice(s.as_bytes()))
    }

    fn nested(parts: &[&str]) -> Key {
        let mut iter = parts.iter();
        let mut k = Key::single(Bytes::copy_from_slice(iter.next().unwrap().as_bytes()));
        for p in iter {
            k = k.push(Bytes::copy_from_slice(p.as_bytes()));
        }
        k
    }

    #[test]
    fn set_then_get_round_trips() {
        let m = Memory::new();
        m.set(&key("a"), Value::Integer(1)).unwrap();
        let v = m.get(&key("a")).unwrap();
        assert!(v.equal(&Value::Integer(1)));
    }

    #[test]
    fn get_missing_key_errors() {
        let m = Memory::new();
        assert!(matches!(
            m.get(&key("missing")),
            Err(StorageError::KeyNotFound(_))
        ));
    }

    #[test]
    fn exists_errors_on_missing_rather_than_false() {
        let m = Memory::new();
        assert!(matches!(
            m.exists(&key("missing")),
            Err(StorageError::KeyNotFound(_))
        ));
        m.set(&key("present"), Value::Integer(1)).unwrap();
        assert_eq!(m.exists(&key("present")).unwrap(), true);
    }

    #[test]
    fn delete_returns_old_value_and_prunes_empty_branch() {
        let m = Memory::new();
        let k = nested(&["foo", "bar"]);
        m.set(&k, Value::Integer(7)).unwrap();
        let old = m.delete(&k).unwrap();
        assert!(old.equal(&Value::Integer(7)));
        assert!(matches!(m.get(&k), Err(StorageError::KeyNotFound(_))));
        // "foo" itself never held a value and is now childless: pruned.
        assert!(matches!(
            m.get(&key("foo")),
            Err(StorageError::KeyNotFound(_))
        ));
    }

    #[test]
    fn delete_keeps_branch_alive_if_sibling_remains() {
        let m = Memory::new();
        m.set(&nested(&["foo", "bar"]), Value::Integer(1)).unwrap();
        m.set(&nested(&["foo", "baz"]), Value::Integer(2)).unwrap();
        m.delete(&nested(&["foo", "bar"])).unwrap();
        // "foo\0baz" still lives, so "foo" must not have been pruned.
        let v = m.get(&nested(&["foo", "baz"])).unwrap();
        assert!(v.equal(&Value::Integer(2)));
    }

    #[test]
    fn a_key_can_hold_a_value_and_have_children_simultaneously() {
        let m = Memory::new();
        m.set(&key("foo"), Value::Integer(1)).unwrap();
        m.set(&nested(&["foo", "bar"]), Value::Integer(2)).unwrap();
        m.delete(&nested(&["foo", "bar"])).unwrap();
        let v = m.get(&key("foo")).unwrap();
        assert!(v.equal(&Value::Integer(1)));
    }

    #[test]
    fn iterate_keys_visits_every_stored_key_under_prefix() {
        let m = Memory::new();
        m.set(&nested(&["a", "1"]), Value::Integer(1)).unwrap();
        m.set(&nested(&["a", "2"]), Value::Integer(2)).unwrap();
        m.set(&key("b"), Value::Integer(3)).unwrap();

        let seen = Mutex::new(Vec::new());
        m.iterate_keys(&key("a"), &mut |k: &Key| {
            seen.lock().unwrap().push(k.to_string());
            Ok(())
        })
        .unwrap();
        let mut got = seen.into_inner().unwrap();
        got.sort();
        assert_eq!(got, vec!["a\u{0}1".to_string(), "a\u{0}2".to_string()]);
    }

    #[test]
    fn iterate_keys_stops_early_without_erroring() {
        let m = Memory::new();
        m.set(&nested(&["a", "1"]), Value::Integer(1)).unwrap();
        m.set(&nested(&["a", "2"]), Value::Integer(2)).unwrap();

        let mut count = 0;
        m.iterate_keys(&key("a"), &mut |_k: &Key| {
            count += 1;
            Err(IterationError::Stop)
        })
        .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn concurrent_set_get_delete_does_not_panic_or_deadlock() {
        let m = Arc::new(Memory::new());
        let mut handles = Vec::new();
        for t in 0..8 {
            let m = m.clone();
            handles.push(thread::spawn(move || {
                for i in 0..1250usize {
                    let k = nested(&["workers", "worker"]).push(Bytes::from(format!("{t}-{i}")));
                    match i % 3 {
                        0 => {
                            m.set(&k, Value::Integer(i as i64)).unwrap();
                        }
                        1 => {
                            let _ = m.get(&k);
                        }
                        _ => {
                            let _ = m.delete(&k);
                        }
                    }
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        // 8 * 1250 = 10,000 operations total across all threads.
    }
}
