//! SimpleError and BulkError, plus the `PREFIX message` splitting shared by
//! both. See `original_source/pkg/resp/error.go`.

use std::fmt;
use std::io;

use super::marshal::{write_bulk, write_simple};
use super::reader::{Reader, ReaderError};
use super::{Tag, Value};

/// The text payload shared by [`SimpleError`] and [`BulkError`] — a message
/// that may or may not start with an all-caps `PREFIX` word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorText(String);

impl ErrorText {
    pub fn new(s: impl Into<String>) -> Self {
        ErrorText(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The leading all-caps word (e.g. `ERR`, `WRONGTYPE`, `SYNTAX`), or
    /// empty if the text doesn't start with one.
    pub fn prefix(&self) -> &str {
        self.split().0
    }

    /// The text after the prefix, or the whole text if there is no prefix.
    pub fn message(&self) -> &str {
        self.split().1
    }

    /// Mirrors the original's `^([A-Z]{2,})\s+(.+)$` regex: a prefix is only
    /// recognized if what follows has no embedded newline, since the
    /// original's `.` doesn't match across lines.
    fn split(&self) -> (&str, &str) {
        let s = self.0.as_str();
        let Some(ws) = s.find(|c: char| c.is_ascii_whitespace()) else {
            return ("", s);
        };
        let (prefix, rest) = s.split_at(ws);
        if prefix.len() < 2 || !prefix.chars().all(|c| c.is_ascii_uppercase()) {
            return ("", s);
        }
        let rest = rest.trim_start_matches(|c: char| c.is_ascii_whitespace());
        if rest.is_empty() || rest.contains('\n') {
            return ("", s);
        }
        (prefix, rest)
    }
}

impl fmt::Display for ErrorText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleError(pub ErrorText);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkError(pub ErrorText);

impl SimpleError {
    pub fn new(s: impl Into<String>) -> Self {
        SimpleError(ErrorText::new(s))
    }
}

impl BulkError {
    pub fn new(s: impl Into<String>) -> Self {
        BulkError(ErrorText::new(s))
    }
}

/// Builds an `Error` value from a message: a `BulkError` if the message
/// contains CRLF, otherwise a `SimpleError`. Mirrors
/// `original_source/pkg/resp/error.go`'s `MakeError`.
pub fn make_error(message: impl Into<String>) -> Value {
    let message = message.into();
    if message.contains("\r\n") {
        Value::BulkError(BulkError::new(message))
    } else {
        Value::SimpleError(SimpleError::new(message))
    }
}

pub(super) fn read_simple_error<R: io::BufRead>(r: &mut Reader<R>) -> Result<Value, ReaderError> {
    let data = r.read_simple()?;
    Ok(Value::SimpleError(SimpleError::new(
        String::from_utf8_lossy(&data).into_owned(),
    )))
}

pub(super) fn read_bulk_error<R: io::BufRead>(r: &mut Reader<R>) -> Result<Value, ReaderError> {
    let data = r.read_bulk()?;
    Ok(Value::BulkError(BulkError::new(
        String::from_utf8_lossy(&data).into_owned(),
    )))
}

pub(super) fn marshal_simple_error<W: io::Write>(e: &SimpleError, w: &mut W) -> io::Result<()> {
    write_simple(Tag::SimpleError, e.0.as_str().as_bytes(), w)
}

pub(super) fn marshal_bulk_error<W: io::Write>(e: &BulkError, w: &mut W) -> io::Result<()> {
    write_bulk(Tag::BulkError, e.0.as_str().as_bytes(), w)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_recognized_prefix() {
        let e = ErrorText::new("SYNTAX invalid syntax");
        assert_eq!(e.prefix(), "SYNTAX");
        assert_eq!(e.message(), "invalid syntax");
    }

    #[test]
    fn treats_lowercase_leading_word_as_unprefixed() {
        let e = ErrorText::new("key not found: foo");
        assert_eq!(e.prefix(), "");
        assert_eq!(e.message(), "key not found: foo");
    }

    #[test]
    fn make_error_chooses_bulk_on_embedded_crlf() {
        match make_error("SYNTAX invalid syntax\r\nmore detail") {
            Value::BulkError(_) => {}
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn make_error_chooses_simple_otherwise() {
        match make_error("ERR key not found: foo") {
            Value::SimpleError(_) => {}
            other => panic!("unexpected {other:?}"),
        }
    }
}
