//! Integer, Double, and BigNumber.

use std::io;

use num_bigint::BigInt;

use super::marshal::write_simple;
use super::reader::{Reader, ReaderError};
use super::{Tag, Value};

pub(super) fn read_integer<R: io::BufRead>(r: &mut Reader<R>) -> Result<Value, ReaderError> {
    Ok(Value::Integer(r.read_int64()?))
}

pub(super) fn read_double<R: io::BufRead>(r: &mut Reader<R>) -> Result<Value, ReaderError> {
    let data = r.read_simple()?;
    let s = String::from_utf8_lossy(&data);
    Ok(Value::Double(s.trim().parse::<f64>()?))
}

pub(super) fn read_big_number<R: io::BufRead>(r: &mut Reader<R>) -> Result<Value, ReaderError> {
    let data = r.read_simple()?;
    let s = String::from_utf8_lossy(&data).into_owned();
    make_big_number(&s).map(Value::BigNumber)
}

/// Parses a decimal string into an arbitrary-precision integer. Mirrors
/// `original_source/pkg/resp/number.go`'s `MakeBigNumber`.
pub fn make_big_number(s: &str) -> Result<BigInt, ReaderError> {
    s.parse::<BigInt>()
        .map_err(|_| ReaderError::invalid_big_number(s.to_string()))
}

pub(super) fn marshal_integer<W: io::Write>(i: i64, w: &mut W) -> io::Result<()> {
    write_simple(Tag::Integer, i.to_string().as_bytes(), w)
}

pub(super) fn marshal_double<W: io::Write>(d: f64, w: &mut W) -> io::Result<()> {
    write_simple(Tag::Double, format!("{d}").as_bytes(), w)
}

pub(super) fn marshal_big_number<W: io::Write>(b: &BigInt, w: &mut W) -> io::Result<()> {
    write_simple(Tag::BigNumber, b.to_string().as_bytes(), w)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn big_number_rejects_non_decimal() {
        assert!(make_big_number("not-a-number").is_err());
    }

    #[test]
    fn big_number_round_trips_large_values() {
        let n = make_big_number("123456789012345678901234567890").unwrap();
        assert_eq!(n.to_string(), "123456789012345678901234567890");
    }
}
