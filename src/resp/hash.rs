//! Process-seeded stable hashing for [`super::Value`].
//!
//! Every value yields a 64-bit hash seeded once at process start, so hashes
//! are stable within a single run but not across runs (mirrors
//! `original_source/pkg/resp/resp.go`'s `maphash.Hash` usage).

use std::hash::Hasher;
use std::sync::OnceLock;

static SEED: OnceLock<u64> = OnceLock::new();

fn seed() -> u64 {
    *SEED.get_or_init(rand::random)
}

/// A small FNV-1a variant seeded from the process-wide seed.
pub struct SeededHasher(u64);

impl SeededHasher {
    pub fn new() -> Self {
        SeededHasher(seed())
    }
}

impl Default for SeededHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher for SeededHasher {
    fn finish(&self) -> u64 {
        self.0
    }

    fn write(&mut self, bytes: &[u8]) {
        const PRIME: u64 = 0x100000001b3;
        for &b in bytes {
            self.0 ^= b as u64;
            self.0 = self.0.wrapping_mul(PRIME);
        }
    }
}

/// Hashes a tag byte followed by a value's canonical marshaled bytes.
pub fn hash_marshaled(tag: super::Tag, bytes: &[u8]) -> u64 {
    let mut h = SeededHasher::new();
    h.write(&[tag.as_byte()]);
    h.write(bytes);
    h.finish()
}

/// A nonce distinguishing one empty aggregate kind from another, so that an
/// empty array does not hash equal to an empty set or push. Generated once,
/// lazily, per kind.
pub struct EmptyKindNonce(OnceLock<u64>);

impl EmptyKindNonce {
    pub const fn new() -> Self {
        EmptyKindNonce(OnceLock::new())
    }

    pub fn get(&self) -> u64 {
        *self.0.get_or_init(rand::random)
    }
}

pub static EMPTY_ARRAY_NONCE: EmptyKindNonce = EmptyKindNonce::new();
pub static EMPTY_PUSH_NONCE: EmptyKindNonce = EmptyKindNonce::new();
pub static EMPTY_MAP_NONCE: EmptyKindNonce = EmptyKindNonce::new();
pub static EMPTY_SET_NONCE: EmptyKindNonce = EmptyKindNonce::new();
pub static EMPTY_ATTRIBUTE_NONCE: EmptyKindNonce = EmptyKindNonce::new();

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_process_hash_is_stable() {
        let a = hash_marshaled(super::super::Tag::Integer, b"42");
        let b = hash_marshaled(super::super::Tag::Integer, b"42");
        assert_eq!(a, b);
    }

    #[test]
    fn different_bytes_usually_hash_differently() {
        let a = hash_marshaled(super::super::Tag::Integer, b"42");
        let b = hash_marshaled(super::super::Tag::Integer, b"43");
        assert_ne!(a, b);
    }

    #[test]
    fn nonce_kinds_are_distinct() {
        assert_ne!(EMPTY_ARRAY_NONCE.get(), EMPTY_SET_NONCE.get());
    }
}
