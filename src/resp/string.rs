//! SimpleString and BulkString.

use std::io;

use bytes::Bytes;

use super::marshal::{write_bulk, write_simple};
use super::reader::{Reader, ReaderError};
use super::{Tag, Value};

pub(super) fn read_simple_string<R: io::BufRead>(
    r: &mut Reader<R>,
) -> Result<Value, ReaderError> {
    let data = r.read_simple()?;
    Ok(Value::SimpleString(Bytes::from(data)))
}

pub(super) fn read_bulk_string<R: io::BufRead>(r: &mut Reader<R>) -> Result<Value, ReaderError> {
    let data = r.read_bulk()?;
    Ok(Value::BulkString(Bytes::from(data)))
}

pub(super) fn marshal_simple_string<W: io::Write>(data: &[u8], w: &mut W) -> io::Result<()> {
    write_simple(Tag::SimpleString, data, w)
}

pub(super) fn marshal_bulk_string<W: io::Write>(data: &[u8], w: &mut W) -> io::Result<()> {
    write_bulk(Tag::BulkString, data, w)
}

/// A string with no embedded CRLF marshals as a SimpleString; otherwise a
/// BulkString. Mirrors `original_source/pkg/resp/string.go`'s `MakeString`.
pub fn make_string(s: impl Into<Bytes>) -> Value {
    let data: Bytes = s.into();
    if data.windows(2).any(|w| w == b"\r\n") {
        Value::BulkString(data)
    } else {
        Value::SimpleString(data)
    }
}
