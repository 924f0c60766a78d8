//! Buffer resumption and record output.
//!
//! [`RecordParser`] drives the [`Lexer`] over caller-owned buffers. Each call
//! to [`RecordParser::parse`] consumes bytes from an offset until either the
//! buffer runs out or a record closes, and reports the offset the next call
//! must resume from. A completed record is copied out with
//! [`RecordParser::materialize`] and the session is prepared for the next one
//! with [`RecordParser::reset`].
//!
//! ```text
//! AwaitingRecord ──{──▶ InRecord ──}──▶ RecordReady ──materialize+reset──▶ AwaitingRecord
//! ```
//!
//! Any fatal error poisons the session; later calls fail with
//! [`RecordError::SessionFailed`] until [`RecordParser::restart`].
use std::sync::Arc;

use tracing::debug;

use crate::{
    builder::RecordBuilder,
    convert::{ScalarConverter, StdConverter},
    diagnostic::Diagnostic,
    error::{ErrorSource, ParserError, RecordError, SyntaxError},
    lexer::Lexer,
    options::ParserOptions,
    record::{ParseOutcome, Phase, Progress, Record},
    schema::Schema,
};

/// An incremental parser from concatenated JSON objects to [`Record`]s.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use recordmodem::{
///     Column, ParseOutcome, ParserOptions, RecordParser, ScalarType, Schema, TypedValue,
/// };
///
/// let schema = Arc::new(Schema::new(
///     "t",
///     vec![
///         Column::scalar("a", ScalarType::Int4),
///         Column::scalar("b", ScalarType::Text),
///     ],
/// ));
/// let mut parser = RecordParser::new(schema, ParserOptions::default());
///
/// let input = br#"{"a": 1}{"a": 2, "b": "x"}"#;
/// let first = parser.parse(input, 0)?;
/// assert_eq!(first.outcome, ParseOutcome::RecordComplete);
/// let record = parser.materialize()?;
/// assert_eq!(record.get(0), Some(&TypedValue::Int4(1)));
/// assert!(record.is_null(1));
/// parser.reset();
///
/// let second = parser.parse(input, first.offset)?;
/// assert_eq!(second.offset, input.len());
/// # Ok::<(), recordmodem::ParserError>(())
/// ```
#[derive(Debug)]
pub struct RecordParser<C = StdConverter> {
    lexer: Lexer,
    builder: RecordBuilder<C>,
    failed: bool,
    closed: bool,
}

impl RecordParser<StdConverter> {
    /// Creates a session converting values with [`StdConverter`].
    #[must_use]
    pub fn new(schema: Arc<Schema>, options: ParserOptions) -> Self {
        Self::with_converter(schema, StdConverter, options)
    }
}

impl<C: ScalarConverter> RecordParser<C> {
    #[must_use]
    pub fn with_converter(schema: Arc<Schema>, converter: C, options: ParserOptions) -> Self {
        Self {
            lexer: Lexer::new(options.max_depth),
            builder: RecordBuilder::new(schema, converter, options),
            failed: false,
            closed: false,
        }
    }

    #[must_use]
    pub fn schema(&self) -> &Arc<Schema> {
        self.builder.schema()
    }

    #[must_use]
    pub fn converter(&self) -> &C {
        self.builder.converter()
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        if self.closed {
            Phase::Closed
        } else if self.builder.record_complete() {
            Phase::RecordReady
        } else if self.in_record() {
            Phase::InRecord
        } else {
            Phase::AwaitingRecord
        }
    }

    /// Total stream bytes consumed since the session began or was restarted.
    #[must_use]
    pub fn bytes_consumed(&self) -> u64 {
        self.lexer.offset()
    }

    /// Drains the warnings raised so far.
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        self.builder.take_diagnostics()
    }

    /// Feeds `buffer[offset..]` into the session.
    ///
    /// Stops right after the closing `}` of a record, so the returned
    /// [`Progress::offset`] points at the first byte after it. Otherwise the
    /// whole buffer is consumed and the caller should fetch more input.
    ///
    /// While a completed record has not been reset away, no bytes are
    /// consumed and [`ParseOutcome::RecordComplete`] is returned again.
    ///
    /// # Errors
    ///
    /// Malformed JSON, structural violations and conversion failures are
    /// fatal for the session. An out-of-range `offset` is reported without
    /// poisoning the session.
    pub fn parse(&mut self, buffer: &[u8], offset: usize) -> Result<Progress, ParserError> {
        self.ensure_usable()?;
        let Some(input) = buffer.get(offset..) else {
            return Err(self.error(
                RecordError::OffsetOutOfBounds {
                    offset,
                    len: buffer.len(),
                }
                .into(),
            ));
        };
        if self.builder.record_complete() {
            return Ok(Progress {
                outcome: ParseOutcome::RecordComplete,
                offset,
            });
        }

        let lexed = match self.lexer.feed(input, &mut self.builder) {
            Ok(lexed) => lexed,
            Err(err) => return Err(self.fail(ParserError::from_lex(err))),
        };
        let outcome = if self.builder.record_complete() {
            ParseOutcome::RecordComplete
        } else if self.in_record() {
            ParseOutcome::RecordStarted
        } else {
            ParseOutcome::NoRecord
        };
        debug!(
            consumed = lexed.consumed,
            available = input.len(),
            ?outcome,
            "parse pass"
        );
        Ok(Progress {
            outcome,
            offset: offset + lexed.consumed,
        })
    }

    /// Copies the completed record out of the session.
    ///
    /// # Errors
    ///
    /// Fails with [`RecordError::NoRecordReady`] unless the last
    /// [`parse`](Self::parse) returned [`ParseOutcome::RecordComplete`] and the
    /// record has not been materialized yet.
    pub fn materialize(&mut self) -> Result<Record, ParserError> {
        if self.failed {
            return Err(self.error(RecordError::SessionFailed.into()));
        }
        match self.builder.take_record() {
            Ok(values) => Ok(Record::new(values)),
            Err(err) => Err(self.error(err.into())),
        }
    }

    /// Returns to [`Phase::AwaitingRecord`] after a record was drained.
    /// Buffers keep their capacity.
    pub fn reset(&mut self) {
        self.builder.reset();
    }

    /// Discards any partial record and lexer state so that a new stream can
    /// be scanned. The warning throttle is kept.
    pub fn restart(&mut self) {
        self.lexer.reset();
        self.builder.reset();
        self.failed = false;
        self.closed = false;
    }

    /// Signals end of stream and closes the session.
    ///
    /// # Errors
    ///
    /// Fails with [`SyntaxError::UnexpectedEndOfInput`] when the stream ended
    /// inside a value.
    pub fn finish(&mut self) -> Result<(), ParserError> {
        self.ensure_usable()?;
        if let Err(err) = self.lexer.finish(&mut self.builder) {
            return Err(self.fail(ParserError::from_lex(err)));
        }
        if self.in_record() && !self.builder.record_complete() {
            return Err(self.fail(self.error(SyntaxError::UnexpectedEndOfInput.into())));
        }
        debug!(bytes = self.lexer.offset(), "end of stream");
        self.closed = true;
        Ok(())
    }

    /// Parses a complete in-memory stream and closes the session.
    ///
    /// # Errors
    ///
    /// See [`parse`](Self::parse) and [`finish`](Self::finish).
    pub fn parse_all(&mut self, bytes: &[u8]) -> Result<Vec<Record>, ParserError> {
        let mut records = Vec::new();
        let mut offset = 0;
        loop {
            let progress = self.parse(bytes, offset)?;
            offset = progress.offset;
            if progress.outcome != ParseOutcome::RecordComplete {
                break;
            }
            records.push(self.materialize()?);
            self.reset();
        }
        self.finish()?;
        Ok(records)
    }

    fn in_record(&self) -> bool {
        self.builder.record_started() || !self.lexer.is_idle()
    }

    fn ensure_usable(&self) -> Result<(), ParserError> {
        if self.failed {
            Err(self.error(RecordError::SessionFailed.into()))
        } else if self.closed {
            Err(self.error(RecordError::SessionClosed.into()))
        } else {
            Ok(())
        }
    }

    fn error(&self, source: ErrorSource) -> ParserError {
        ParserError {
            source,
            line: self.lexer.line(),
            column: self.lexer.column(),
            offset: self.lexer.offset(),
        }
    }

    fn fail(&mut self, err: ParserError) -> ParserError {
        debug!(error = %err, "parse session failed");
        self.failed = true;
        err
    }
}
