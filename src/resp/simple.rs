//! Null and Boolean — the two fixed-payload simple-line kinds.

use std::io;

use super::marshal::write_simple;
use super::reader::{Reader, ReaderError};
use super::{Tag, Value};

pub(super) fn read_null<R: io::BufRead>(r: &mut Reader<R>) -> Result<Value, ReaderError> {
    let data = r.read_simple()?;
    if !data.is_empty() {
        return Err(ReaderError::invalid_length(data.len()));
    }
    Ok(Value::Null)
}

pub(super) fn read_boolean<R: io::BufRead>(r: &mut Reader<R>) -> Result<Value, ReaderError> {
    let data = r.read_simple()?;
    if data.len() != 1 {
        return Err(ReaderError::invalid_length(data.len()));
    }
    match data[0] {
        b't' => Ok(Value::Boolean(true)),
        b'f' => Ok(Value::Boolean(false)),
        _ => Err(ReaderError::invalid_boolean(String::from_utf8_lossy(&data).into_owned())),
    }
}

pub(super) fn marshal_null<W: io::Write>(w: &mut W) -> io::Result<()> {
    write_simple(Tag::Null, b"", w)
}

pub(super) fn marshal_boolean<W: io::Write>(b: bool, w: &mut W) -> io::Result<()> {
    write_simple(Tag::Boolean, if b { b"t" } else { b"f" }, w)
}
