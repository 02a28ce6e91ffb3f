//! VerbatimString — a bulk string carrying a fixed-width encoding tag.

use std::io;

use bytes::Bytes;

use super::marshal::{write_int, write_tag};
use super::reader::{Reader, ReaderError};
use super::Tag;
use super::Value;

const ENCODING_LEN: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerbatimString {
    encoding: [u8; ENCODING_LEN],
    data: Bytes,
}

impl VerbatimString {
    pub fn encoding(&self) -> &str {
        std::str::from_utf8(&self.encoding).unwrap_or_default()
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }
}

pub(super) fn read_verbatim_string<R: io::BufRead>(
    r: &mut Reader<R>,
) -> Result<Value, ReaderError> {
    let data = r.read_bulk()?;
    if data.len() < ENCODING_LEN + 1 {
        return Err(ReaderError::invalid_length(data.len()));
    }
    let mut encoding = [0u8; ENCODING_LEN];
    encoding.copy_from_slice(&data[..ENCODING_LEN]);
    // The original slices from index 4 without strict colon validation.
    let payload = Bytes::from(data[ENCODING_LEN + 1..].to_vec());
    Ok(Value::VerbatimString(VerbatimString {
        encoding,
        data: payload,
    }))
}

pub(super) fn marshal_verbatim_string<W: io::Write>(
    v: &VerbatimString,
    w: &mut W,
) -> io::Result<()> {
    write_tag(Tag::VerbatimString, w)?;
    write_int((ENCODING_LEN + 1 + v.data.len()) as i64, w)?;
    w.write_all(&v.encoding)?;
    w.write_all(b":")?;
    w.write_all(&v.data)?;
    w.write_all(b"\r\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resp::reader::Reader;
    use std::io::Cursor;

    #[test]
    fn parses_encoding_and_data() {
        let mut r = Reader::new(Cursor::new(b"=15\r\ntxt:Some\nstring\r\n".to_vec()));
        match r.next().unwrap() {
            Value::VerbatimString(v) => {
                assert_eq!(v.encoding(), "txt");
                assert_eq!(&v.data()[..], b"Some\nstring");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
