//! The RESP3 reader: tag dispatch, nesting rule, attribute transparency, and
//! the RESP2 null back-compat peek. See `original_source/pkg/resp/reader.go`.

use std::collections::HashMap;
use std::io::{self, BufRead};

use thiserror::Error;

use super::{
    array, attribute, error as resp_error, map, number, push, set, simple, string, verbatim, Tag,
    Value,
};

const CR: u8 = b'\r';
const LF: u8 = b'\n';
const V2_NULL: &[u8] = b"-1\r\n";

#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("ERR empty input: {0}")]
    EmptyInput(#[source] io::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("ERR unknown tag: {0}")]
    UnknownTag(char),
    #[error("ERR invalid nesting: {0}")]
    InvalidNesting(Tag),
    #[error("ERR invalid length: {0}")]
    InvalidLength(i64),
    #[error("ERR invalid terminator: {0:?}")]
    InvalidTerminator([u8; 2]),
    #[error("ERR invalid boolean: {0}")]
    InvalidBoolean(String),
    #[error("ERR invalid big number: {0}")]
    InvalidBigNumber(String),
    #[error(transparent)]
    ParseInt(#[from] std::num::ParseIntError),
    #[error(transparent)]
    ParseFloat(#[from] std::num::ParseFloatError),
}

impl ReaderError {
    pub(super) fn invalid_length(len: usize) -> Self {
        ReaderError::InvalidLength(len as i64)
    }

    pub(super) fn invalid_boolean(s: String) -> Self {
        ReaderError::InvalidBoolean(s)
    }

    pub(super) fn invalid_big_number(s: String) -> Self {
        ReaderError::InvalidBigNumber(s)
    }

    /// True for the end-of-stream case the connection pipeline treats as a
    /// quiet close rather than a reply-worthy error.
    pub fn is_eof(&self) -> bool {
        matches!(
            self,
            ReaderError::EmptyInput(e) if e.kind() == io::ErrorKind::UnexpectedEof
        )
    }
}

type ReaderFn<R> = fn(&mut Reader<R>) -> Result<Value, ReaderError>;

/// Parses one [`Value`] at a time from a buffered byte source.
pub struct Reader<R> {
    input: R,
    readers: HashMap<Tag, ReaderFn<R>>,
    nesting: usize,
    v2_compatible: bool,
    /// Bytes consumed from `input` while probing for a RESP2 null marker
    /// that turned out not to match; restored here so the next read sees
    /// them as if they'd never been touched.
    pending: Vec<u8>,
}

impl<R: BufRead> Reader<R> {
    pub fn new(input: R) -> Self {
        let mut readers: HashMap<Tag, ReaderFn<R>> = HashMap::new();
        readers.insert(Tag::SimpleString, string::read_simple_string);
        readers.insert(Tag::SimpleError, resp_error::read_simple_error);
        readers.insert(Tag::Integer, number::read_integer);
        readers.insert(Tag::BulkString, string::read_bulk_string);
        readers.insert(Tag::Array, array::read_array);
        readers.insert(Tag::Null, simple::read_null);
        readers.insert(Tag::Boolean, simple::read_boolean);
        readers.insert(Tag::Double, number::read_double);
        readers.insert(Tag::BigNumber, number::read_big_number);
        readers.insert(Tag::BulkError, resp_error::read_bulk_error);
        readers.insert(Tag::VerbatimString, verbatim::read_verbatim_string);
        readers.insert(Tag::Map, map::read_map);
        readers.insert(Tag::Attribute, attribute::read_attribute);
        readers.insert(Tag::Set, set::read_set);
        readers.insert(Tag::Push, push::read_push);
        Reader {
            input,
            readers,
            nesting: 0,
            v2_compatible: false,
            pending: Vec::new(),
        }
    }

    /// Enables the RESP2 `*-1\r\n` / `$-1\r\n` null back-compat peek.
    pub fn with_v2_compatible(mut self) -> Self {
        self.v2_compatible = true;
        self
    }

    pub fn next(&mut self) -> Result<Value, ReaderError> {
        let tag_byte = self.read_tag_byte()?;
        let Some(tag) = Tag::from_byte(tag_byte) else {
            return Err(ReaderError::UnknownTag(tag_byte as char));
        };
        if self.is_v2_null(tag)? {
            return Ok(Value::Null);
        }
        let Some(f) = self.readers.get(&tag).copied() else {
            return Err(ReaderError::UnknownTag(tag_byte as char));
        };
        let was_nested = self.nesting > 0;
        self.nesting += 1;
        let res = f(self);
        self.nesting -= 1;
        let res = res?;
        if was_nested && matches!(res, Value::Push(_)) {
            return Err(ReaderError::InvalidNesting(tag));
        }
        if tag == Tag::Attribute {
            return self.next();
        }
        Ok(res)
    }

    /// Reads one tag byte, preferring an overshot byte restaged by
    /// `is_v2_null` over a fresh read — an Array's non-null length line can
    /// overshoot straight into its first nested value's tag byte.
    fn read_tag_byte(&mut self) -> Result<u8, ReaderError> {
        if !self.pending.is_empty() {
            return Ok(self.pending.remove(0));
        }
        let mut tag_byte = [0u8; 1];
        match io::Read::read(&mut self.input, &mut tag_byte) {
            Ok(0) => Err(ReaderError::EmptyInput(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "eof",
            ))),
            Ok(_) => Ok(tag_byte[0]),
            Err(e) => Err(ReaderError::EmptyInput(e)),
        }
    }

    /// `fill_buf` makes at most one underlying read and may hand back fewer
    /// than `V2_NULL.len()` bytes on a fragmented stream, so a single call
    /// can't tell "not null" from "not all here yet". This loops, consuming
    /// what each call returns into `staged`, until either enough bytes are
    /// collected or a call returns empty (real EOF) — mirroring the
    /// original's `bufio.Reader.Peek(4)`, which retries internally until it
    /// has 4 bytes or hits EOF/error. Unlike `Peek`, `fill_buf`/`consume`
    /// actually advances the stream, so a non-match restages the consumed
    /// bytes into `self.pending` rather than leaving them unconsumed.
    fn is_v2_null(&mut self, tag: Tag) -> Result<bool, ReaderError> {
        if !self.v2_compatible || !matches!(tag, Tag::Array | Tag::BulkString) {
            return Ok(false);
        }
        let mut staged = Vec::with_capacity(V2_NULL.len());
        while staged.len() < V2_NULL.len() {
            let peek = self.input.fill_buf()?;
            if peek.is_empty() {
                break;
            }
            let take = peek.len().min(V2_NULL.len() - staged.len());
            staged.extend_from_slice(&peek[..take]);
            self.input.consume(take);
        }
        if staged == V2_NULL {
            return Ok(true);
        }
        self.pending = staged;
        Ok(false)
    }

    /// Fills `buf` from `self.pending` first, then `self.input` for the
    /// remainder — every fixed-length read (bulk payloads, the trailing
    /// CRLF) must go through this rather than `self.input` directly, since
    /// a non-matching `is_v2_null` probe may have restaged bytes that
    /// belong to this read, not the length line before it.
    fn fill_n(&mut self, buf: &mut [u8]) -> Result<(), ReaderError> {
        let from_pending = self.pending.len().min(buf.len());
        if from_pending > 0 {
            buf[..from_pending].copy_from_slice(&self.pending[..from_pending]);
            self.pending.drain(..from_pending);
        }
        if from_pending < buf.len() {
            self.input.read_exact(&mut buf[from_pending..])?;
        }
        Ok(())
    }

    pub(super) fn read_simple(&mut self) -> Result<Vec<u8>, ReaderError> {
        let mut buf = Vec::new();
        if !self.pending.is_empty() {
            let staged = std::mem::take(&mut self.pending);
            match staged.windows(2).position(|w| w == [CR, LF]) {
                Some(idx) => {
                    let rest = staged[idx + 2..].to_vec();
                    if !rest.is_empty() {
                        self.pending = rest;
                    }
                    return Ok(staged[..idx].to_vec());
                }
                None => buf = staged,
            }
        }
        loop {
            let mut line = Vec::new();
            let n = self.input.read_until(LF, &mut line)?;
            if n == 0 {
                return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "eof").into());
            }
            if line.len() >= 2 && line[line.len() - 2] == CR && line[line.len() - 1] == LF {
                buf.extend_from_slice(&line[..line.len() - 2]);
                return Ok(buf);
            }
            buf.extend_from_slice(&line);
        }
    }

    pub(super) fn read_bulk(&mut self) -> Result<Vec<u8>, ReaderError> {
        let len = self.read_len()?;
        let mut data = vec![0u8; len];
        self.fill_n(&mut data)?;
        self.read_newline()?;
        Ok(data)
    }

    pub(super) fn read_values(&mut self) -> Result<Vec<Value>, ReaderError> {
        let len = self.read_len()?;
        let mut res = Vec::with_capacity(len);
        for _ in 0..len {
            res.push(self.next()?);
        }
        Ok(res)
    }

    pub(super) fn read_len(&mut self) -> Result<usize, ReaderError> {
        let i = self.read_int64()?;
        if i < 0 {
            return Err(ReaderError::InvalidLength(i));
        }
        Ok(i as usize)
    }

    pub(super) fn read_int64(&mut self) -> Result<i64, ReaderError> {
        let data = self.read_simple()?;
        let s = String::from_utf8_lossy(&data);
        Ok(s.trim().parse::<i64>()?)
    }

    fn read_newline(&mut self) -> Result<(), ReaderError> {
        let mut data = [0u8; 2];
        self.fill_n(&mut data)?;
        if data[0] != CR || data[1] != LF {
            return Err(ReaderError::InvalidTerminator(data));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn parse(s: &[u8]) -> Value {
        let mut r = Reader::new(Cursor::new(s.to_vec()));
        r.next().unwrap()
    }

    fn parse_v2(s: &[u8]) -> Value {
        let mut r = Reader::new(Cursor::new(s.to_vec())).with_v2_compatible();
        r.next().unwrap()
    }

    #[test]
    fn parses_integer() {
        assert!(matches!(parse(b":0\r\n"), Value::Integer(0)));
    }

    #[test]
    fn parses_simple_string() {
        match parse(b"+OK\r\n") {
            Value::SimpleString(b) => assert_eq!(&b[..], b"OK"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn rejects_push_nested_in_array() {
        let mut r = Reader::new(Cursor::new(b"*1\r\n>0\r\n".to_vec()));
        let err = r.next().unwrap_err();
        assert!(matches!(err, ReaderError::InvalidNesting(Tag::Push)));
    }

    #[test]
    fn attribute_is_transparent() {
        match parse(b"|1\r\n+k\r\n+v\r\n:42\r\n") {
            Value::Integer(42) => {}
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn v2_null_from_array_and_bulk_string() {
        assert!(matches!(parse_v2(b"*-1\r\n"), Value::Null));
        assert!(matches!(parse_v2(b"$-1\r\n"), Value::Null));
    }

    #[test]
    fn boolean_errors() {
        let mut r = Reader::new(Cursor::new(b"#true\r\n".to_vec()));
        let err = r.next().unwrap_err();
        assert!(matches!(err, ReaderError::InvalidLength(4)));

        let mut r = Reader::new(Cursor::new(b"#x\r\n".to_vec()));
        let err = r.next().unwrap_err();
        assert!(matches!(err, ReaderError::InvalidBoolean(ref s) if s == "x"));
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let mut r = Reader::new(Cursor::new(b"?1\r\n".to_vec()));
        assert!(r.next().is_err());
    }

    /// Yields at most one byte per `read` call regardless of the
    /// destination buffer size, simulating a TCP stream that delivers the
    /// v2-null marker (or a length line) a byte at a time.
    struct OneByteAtATime<'a>(&'a [u8]);

    impl<'a> io::Read for OneByteAtATime<'a> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.0.is_empty() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.0[0];
            self.0 = &self.0[1..];
            Ok(1)
        }
    }

    #[test]
    fn v2_null_detected_across_fragmented_reads() {
        let mut r = Reader::new(io::BufReader::new(OneByteAtATime(b"*-1\r\n"))).with_v2_compatible();
        assert!(matches!(r.next().unwrap(), Value::Null));
    }

    #[test]
    fn short_length_line_survives_fragmented_non_null_probe() {
        let mut r =
            Reader::new(io::BufReader::new(OneByteAtATime(b"$3\r\nfoo\r\n"))).with_v2_compatible();
        match r.next().unwrap() {
            Value::BulkString(b) => assert_eq!(&b[..], b"foo"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
