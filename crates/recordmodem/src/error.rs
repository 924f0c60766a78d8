use core::fmt;

use bstr::BStr;
use thiserror::Error;

use crate::{
    convert::ConversionError,
    lexer::{LexError, LexErrorKind},
};

/// A fatal error raised by a [`RecordParser`](crate::RecordParser) session.
///
/// Carries the position of the failure: `line`/`column` of the offending
/// byte and the number of stream bytes the session had consumed.
#[derive(Error, Debug, PartialEq)]
#[error("{source} at {line}:{column} (byte {offset})")]
pub struct ParserError {
    pub(crate) source: ErrorSource,
    pub(crate) line: usize,
    pub(crate) column: usize,
    pub(crate) offset: u64,
}

impl ParserError {
    #[must_use]
    pub fn source(&self) -> &ErrorSource {
        &self.source
    }

    #[must_use]
    pub fn line(&self) -> usize {
        self.line
    }

    #[must_use]
    pub fn column(&self) -> usize {
        self.column
    }

    /// Stream bytes consumed by the session before the failure.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// `true` when a column value failed conversion.
    #[must_use]
    pub fn is_conversion(&self) -> bool {
        matches!(self.source, ErrorSource::Conversion(_))
    }

    pub(crate) fn from_lex(err: LexError<ErrorSource>) -> Self {
        let source = match err.kind {
            LexErrorKind::Syntax(syntax) => ErrorSource::Syntax(syntax),
            LexErrorKind::Sink(source) => source,
        };
        Self {
            source,
            line: err.line,
            column: err.column,
            offset: err.offset,
        }
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum ErrorSource {
    #[error("syntax error: {0}")]
    Syntax(#[from] SyntaxError),
    #[error("record error: {0}")]
    Record(#[from] RecordError),
    #[error(transparent)]
    Conversion(#[from] ColumnConversionError),
}

/// Byte rendered for humans, e.g. `'x'` or `'\xFF'`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EscapedByte(pub u8);

impl fmt::Display for EscapedByte {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let quoted = format!("{:?}", BStr::new(core::slice::from_ref(&self.0)));
        let inner = quoted.trim_matches('"');
        write!(f, "'{inner}'")
    }
}

fn escaped(b: &u8) -> EscapedByte {
    EscapedByte(*b)
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("invalid character {}", escaped(.0))]
    InvalidCharacter(u8),
    #[error("invalid escape character {}", escaped(.0))]
    InvalidEscape(u8),
    #[error("invalid unicode escape sequence at character {}", escaped(.0))]
    InvalidUnicodeEscape(u8),
    #[error("unpaired surrogate \\u{0:04X}")]
    UnpairedSurrogate(u16),
    #[error("invalid UTF-8 in string")]
    InvalidUtf8,
    #[error("unescaped control character {} in string", escaped(.0))]
    ControlCharacterInString(u8),
    #[error("nesting deeper than {0} levels")]
    DepthLimitExceeded(usize),
    #[error("unexpected end of input")]
    UnexpectedEndOfInput,
}

/// Structural failures of the record state machine and misuse of a session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("{0} value at top level, expected an object")]
    ValueAtTopLevel(&'static str),
    #[error("top-level value is an array, expected an object")]
    TopLevelNotObject,
    #[error("{0} value with no selected column")]
    NoColumnSelected(&'static str),
    #[error("object key {key:?} inside array column {column:?}")]
    KeyInsideArrayColumn { column: String, key: String },
    #[error("container closed below record depth")]
    DepthUnderflow,
    #[error("field {field:?} does not match any column of table {table:?}")]
    UnknownField { field: String, table: String },
    #[error("no complete record to materialize")]
    NoRecordReady,
    #[error("offset {offset} is past the end of a {len} byte buffer")]
    OffsetOutOfBounds { offset: usize, len: usize },
    #[error("session already failed")]
    SessionFailed,
    #[error("session is closed")]
    SessionClosed,
}

/// A [`ConversionError`] decorated with the column and table it came from.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{source} (column {column} of table {table})")]
pub struct ColumnConversionError {
    pub column: String,
    pub table: String,
    pub source: ConversionError,
}
