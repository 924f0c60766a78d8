//! Incremental parsing of concatenated JSON objects into schema-bound records.
//!
//! A remote query engine streams its result as JSON objects written back to
//! back (`{"a":1}{"a":2}...`). This crate turns that byte stream into flat
//! [`Record`]s shaped by a [`Schema`], one chunk at a time:
//!
//! - [`RecordParser`] consumes whatever bytes are available, stops exactly at
//!   each record boundary and reports the offset to resume from,
//! - scalar fields are converted by a pluggable [`ScalarConverter`],
//! - nested objects and arrays are reserialized into compact JSON text or
//!   array literal text for structured and array columns,
//! - [`RecordReader`] wraps the whole loop around any [`std::io::Read`].
//!
//! ```
//! use std::sync::Arc;
//!
//! use recordmodem::{Column, ParserOptions, RecordParser, ScalarType, Schema, TypedValue};
//!
//! let schema = Arc::new(Schema::new(
//!     "docs",
//!     vec![Column::scalar("id", ScalarType::Int4), Column::structured("body")],
//! ));
//! let mut parser = RecordParser::new(schema, ParserOptions::default());
//! let records = parser.parse_all(br#"{"id": 3.0, "body": {"x": 1, "y": [1, 2]}}"#)?;
//! assert_eq!(records[0].get(0), Some(&TypedValue::Int4(3)));
//! assert_eq!(records[0].get(1).and_then(TypedValue::as_str), Some(r#"{"x":1,"y":[1,2]}"#));
//! # Ok::<(), recordmodem::ParserError>(())
//! ```

#![allow(missing_docs)]

mod builder;
mod convert;
mod diagnostic;
mod error;
pub mod lexer;
mod options;
mod parser;
mod reader;
mod record;
mod schema;
mod value;

#[doc(hidden)]
pub mod chunk_utils;

#[cfg(test)]
mod tests;

pub use convert::{ConversionError, ScalarConverter, StdConverter};
pub use diagnostic::{Diagnostic, DiagnosticKind, ValueShape};
pub use error::{
    ColumnConversionError, ErrorSource, EscapedByte, ParserError, RecordError, SyntaxError,
};
pub use options::{ParserOptions, ReaderOptions};
pub use parser::RecordParser;
pub use reader::{ReaderError, RecordReader};
pub use record::{ParseOutcome, Phase, Progress, Record};
pub use schema::{Column, ColumnKind, ScalarType, Schema};
pub use value::TypedValue;
