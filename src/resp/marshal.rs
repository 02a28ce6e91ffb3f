//! Low-level byte writers shared by every [`super::Value`] variant.

use std::io::{self, Write};

use super::Tag;

pub const CR: u8 = b'\r';
pub const LF: u8 = b'\n';
pub const NEWLINE: [u8; 2] = [CR, LF];

pub fn write_newline<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(&NEWLINE)
}

pub fn write_tag<W: Write>(tag: Tag, w: &mut W) -> io::Result<()> {
    w.write_all(&[tag.as_byte()])
}

/// Writes `<tag><data>\r\n` — the "simple" line encoding used by
/// SimpleString, SimpleError, Integer, Null, Boolean, Double, BigNumber.
pub fn write_simple<W: Write>(tag: Tag, data: &[u8], w: &mut W) -> io::Result<()> {
    write_tag(tag, w)?;
    w.write_all(data)?;
    write_newline(w)
}

/// Writes `<tag><len>\r\n<data>\r\n` — the bulk encoding used by BulkString
/// and BulkError.
pub fn write_bulk<W: Write>(tag: Tag, data: &[u8], w: &mut W) -> io::Result<()> {
    write_tag(tag, w)?;
    write_int(data.len() as i64, w)?;
    w.write_all(data)?;
    write_newline(w)
}

/// Writes a bare decimal integer followed by CRLF (used for length
/// prefixes).
pub fn write_int<W: Write>(i: i64, w: &mut W) -> io::Result<()> {
    w.write_all(i.to_string().as_bytes())?;
    write_newline(w)
}
