//! The RESP3 wire codec: tagged values, stable hashing, structural equality,
//! and the reader/writer that move values to and from a byte stream.

pub mod tag;

mod array;
mod attribute;
mod error;
mod hash;
mod hashed;
mod map;
mod mapped;
mod marshal;
mod number;
pub mod reader;
mod push;
mod set;
mod simple;
mod string;
mod verbatim;

use std::io;

use bytes::Bytes;
use num_bigint::BigInt;

pub use array::ArrayValue;
pub use attribute::AttributeValue;
pub use error::{make_error, BulkError, ErrorText, SimpleError};
pub use map::MapValue;
pub use number::make_big_number;
pub use push::PushValue;
pub use reader::{Reader, ReaderError};
pub use set::SetValue;
pub use string::make_string;
pub use tag::Tag;
pub use verbatim::VerbatimString;

/// A single RESP3 value. Immutable once constructed — aggregates are built
/// with their full content and expose no mutator.
#[derive(Debug, Clone)]
pub enum Value {
    SimpleString(Bytes),
    SimpleError(SimpleError),
    Integer(i64),
    BulkString(Bytes),
    Array(ArrayValue),
    Null,
    Boolean(bool),
    Double(f64),
    BigNumber(BigInt),
    BulkError(BulkError),
    VerbatimString(VerbatimString),
    Map(MapValue),
    Attribute(AttributeValue),
    Set(SetValue),
    Push(PushValue),
}

/// `+OK` — the canonical success reply used by SET.
pub fn ok() -> Value {
    Value::SimpleString(Bytes::from_static(b"OK"))
}

impl Value {
    pub fn tag(&self) -> Tag {
        match self {
            Value::SimpleString(_) => Tag::SimpleString,
            Value::SimpleError(_) => Tag::SimpleError,
            Value::Integer(_) => Tag::Integer,
            Value::BulkString(_) => Tag::BulkString,
            Value::Array(_) => Tag::Array,
            Value::Null => Tag::Null,
            Value::Boolean(_) => Tag::Boolean,
            Value::Double(_) => Tag::Double,
            Value::BigNumber(_) => Tag::BigNumber,
            Value::BulkError(_) => Tag::BulkError,
            Value::VerbatimString(_) => Tag::VerbatimString,
            Value::Map(_) => Tag::Map,
            Value::Attribute(_) => Tag::Attribute,
            Value::Set(_) => Tag::Set,
            Value::Push(_) => Tag::Push,
        }
    }

    pub fn marshal<W: io::Write>(&self, w: &mut W) -> io::Result<()> {
        match self {
            Value::SimpleString(b) => string::marshal_simple_string(b, w),
            Value::SimpleError(e) => error::marshal_simple_error(e, w),
            Value::Integer(i) => number::marshal_integer(*i, w),
            Value::BulkString(b) => string::marshal_bulk_string(b, w),
            Value::Array(a) => a.marshal(w),
            Value::Null => simple::marshal_null(w),
            Value::Boolean(b) => simple::marshal_boolean(*b, w),
            Value::Double(d) => number::marshal_double(*d, w),
            Value::BigNumber(b) => number::marshal_big_number(b, w),
            Value::BulkError(e) => error::marshal_bulk_error(e, w),
            Value::VerbatimString(v) => verbatim::marshal_verbatim_string(v, w),
            Value::Map(m) => m.marshal(w),
            Value::Attribute(a) => a.marshal(w),
            Value::Set(s) => s.marshal(w),
            Value::Push(p) => p.marshal(w),
        }
    }

    /// Renders the value's marshaled form as a string, for diagnostics.
    pub fn to_wire_string(&self) -> String {
        let mut buf = Vec::new();
        let _ = self.marshal(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }

    pub fn equal(&self, other: &Value) -> bool {
        use Value::*;
        match (self, other) {
            (SimpleString(a), SimpleString(b)) => a == b,
            (SimpleError(a), SimpleError(b)) => a == b,
            (Integer(a), Integer(b)) => a == b,
            (BulkString(a), BulkString(b)) => a == b,
            (Array(a), Array(b)) => a.equal(b),
            (Null, Null) => true,
            (Boolean(a), Boolean(b)) => a == b,
            (Double(a), Double(b)) => a == b,
            (BigNumber(a), BigNumber(b)) => a == b,
            (BulkError(a), BulkError(b)) => a == b,
            (VerbatimString(a), VerbatimString(b)) => a == b,
            (Map(a), Map(b)) => a.equal(b),
            (Attribute(a), Attribute(b)) => a.equal(b),
            (Set(a), Set(b)) => a.equal(b),
            (Push(a), Push(b)) => a.equal(b),
            _ => false,
        }
    }

    /// A total order over values: tag byte first, then kind-specific.
    /// Aggregates with no dedicated ordering fall back to comparing their
    /// marshaled bytes. See `original_source/pkg/resp/resp.go`'s `Compare`.
    pub fn compare(&self, other: &Value) -> std::cmp::Ordering {
        use std::cmp::Ordering;
        use Value::*;

        let (lt, rt) = (self.tag().as_byte(), other.tag().as_byte());
        if lt != rt {
            return lt.cmp(&rt);
        }
        match (self, other) {
            (Integer(a), Integer(b)) => a.cmp(b),
            (Double(a), Double(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            (BigNumber(a), BigNumber(b)) => a.cmp(b),
            (Boolean(a), Boolean(b)) => a.cmp(b),
            (SimpleString(a), SimpleString(b)) => a.cmp(b),
            (BulkString(a), BulkString(b)) => a.cmp(b),
            (VerbatimString(a), VerbatimString(b)) => a.data().cmp(b.data()),
            (SimpleError(a), SimpleError(b)) => a.0.message().cmp(b.0.message()),
            (BulkError(a), BulkError(b)) => a.0.message().cmp(b.0.message()),
            (Null, Null) => Ordering::Equal,
            _ => self.marshaled_bytes().cmp(&other.marshaled_bytes()),
        }
    }

    fn marshaled_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        let _ = self.marshal(&mut buf);
        buf
    }

    /// A stable, process-local 64-bit hash. See `hash` submodule for the
    /// seeding scheme.
    pub fn hash(&self) -> u64 {
        match self {
            Value::Array(a) => a.hash(),
            Value::Push(p) => p.hash(),
            Value::Map(m) => m.hash(),
            Value::Attribute(a) => a.hash(),
            Value::Set(s) => s.hash(),
            _ => {
                let mut buf = Vec::new();
                // Scalars hash their canonical marshaled bytes (tag +
                // payload); this is `hash_marshaled`'s contract.
                let _ = self.marshal_payload_only(&mut buf);
                hash::hash_marshaled(self.tag(), &buf)
            }
        }
    }

    fn marshal_payload_only<W: io::Write>(&self, w: &mut W) -> io::Result<()> {
        match self {
            Value::SimpleString(b) | Value::BulkString(b) => w.write_all(b),
            Value::SimpleError(e) => w.write_all(e.0.as_str().as_bytes()),
            Value::BulkError(e) => w.write_all(e.0.as_str().as_bytes()),
            Value::Integer(i) => w.write_all(i.to_string().as_bytes()),
            Value::Double(d) => w.write_all(format!("{d}").as_bytes()),
            Value::BigNumber(b) => w.write_all(b.to_string().as_bytes()),
            Value::Null => Ok(()),
            Value::Boolean(b) => w.write_all(if *b { b"t" } else { b"f" }),
            Value::VerbatimString(v) => {
                w.write_all(v.encoding().as_bytes())?;
                w.write_all(b":")?;
                w.write_all(v.data())
            }
            Value::Array(_) | Value::Push(_) | Value::Map(_) | Value::Attribute(_) | Value::Set(_) => {
                unreachable!("aggregates compute their own hash")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn roundtrip(bytes: &[u8]) -> Value {
        let mut r = Reader::new(Cursor::new(bytes.to_vec()));
        let v = r.next().unwrap();
        assert_eq!(v.to_wire_string().as_bytes(), bytes);
        v
    }

    #[test]
    fn integer_round_trips() {
        roundtrip(b":0\r\n");
    }

    #[test]
    fn simple_string_round_trips() {
        roundtrip(b"+OK\r\n");
    }

    #[test]
    fn bulk_string_with_embedded_crlf_round_trips() {
        let v = roundtrip(b"$10\r\nhello\r\nyou\r\n");
        match v {
            Value::BulkString(b) => assert_eq!(&b[..], b"hello\r\nyou"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn bulk_error_prefix_round_trips() {
        let v = roundtrip(b"!22\r\nSYNTAX\r\ninvalid syntax\r\n");
        match v {
            Value::BulkError(e) => {
                assert_eq!(e.0.prefix(), "SYNTAX");
                assert_eq!(e.0.message(), "invalid syntax");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn push_round_trips() {
        roundtrip(b">2\r\n$5\r\nhello\r\n$5\r\nworld\r\n");
    }

    #[test]
    fn equal_values_hash_equal() {
        let mut r1 = Reader::new(Cursor::new(b":42\r\n".to_vec()));
        let mut r2 = Reader::new(Cursor::new(b":42\r\n".to_vec()));
        let a = r1.next().unwrap();
        let b = r2.next().unwrap();
        assert!(a.equal(&b));
        assert_eq!(a.hash(), b.hash());
    }

    #[test]
    fn set_hash_is_order_independent() {
        let a = Value::Set(SetValue::new(vec![Value::Integer(1), Value::Integer(2)]));
        let b = Value::Set(SetValue::new(vec![Value::Integer(2), Value::Integer(1)]));
        assert!(a.equal(&b));
        assert_eq!(a.hash(), b.hash());
    }

    #[test]
    fn empty_array_and_empty_set_hash_differently() {
        let arr = Value::Array(ArrayValue::new(vec![]));
        let set = Value::Set(SetValue::new(vec![]));
        assert_ne!(arr.hash(), set.hash());
    }

    #[test]
    fn compare_orders_by_tag_byte_first() {
        use std::cmp::Ordering;
        // '#' (0x23, Boolean) sorts before '$' (0x24, BulkString) on tag
        // byte alone, even though Boolean's variant is declared earlier.
        let b = Value::Boolean(true);
        let s = Value::BulkString(Bytes::from_static(b"z"));
        assert_eq!(b.compare(&s), Ordering::Less);
        assert_eq!(s.compare(&b), Ordering::Greater);
    }

    #[test]
    fn compare_orders_integers_numerically() {
        use std::cmp::Ordering;
        assert_eq!(Value::Integer(1).compare(&Value::Integer(2)), Ordering::Less);
        assert_eq!(Value::Integer(2).compare(&Value::Integer(2)), Ordering::Equal);
    }

    #[test]
    fn compare_orders_booleans_false_before_true() {
        use std::cmp::Ordering;
        assert_eq!(
            Value::Boolean(false).compare(&Value::Boolean(true)),
            Ordering::Less
        );
    }

    #[test]
    fn compare_orders_bulk_strings_lexicographically() {
        use std::cmp::Ordering;
        let a = Value::BulkString(Bytes::from_static(b"aa"));
        let b = Value::BulkString(Bytes::from_static(b"ab"));
        assert_eq!(a.compare(&b), Ordering::Less);
    }

    #[test]
    fn compare_falls_back_to_marshaled_bytes_for_arrays() {
        let a = Value::Array(ArrayValue::new(vec![Value::Integer(1)]));
        let b = Value::Array(ArrayValue::new(vec![Value::Integer(2)]));
        assert_eq!(a.compare(&a), std::cmp::Ordering::Equal);
        assert_ne!(a.compare(&b), std::cmp::Ordering::Equal);
    }
}
