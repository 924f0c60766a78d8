//! Pull-style driver over a [`std::io::Read`] transport.
use std::{
    io::{self, Read},
    sync::Arc,
};

use thiserror::Error;
use tracing::debug;

use crate::{
    convert::{ScalarConverter, StdConverter},
    diagnostic::Diagnostic,
    error::ParserError,
    options::{ParserOptions, ReaderOptions},
    parser::RecordParser,
    record::{ParseOutcome, Record},
    schema::Schema,
};

#[derive(Error, Debug)]
pub enum ReaderError {
    #[error("read failed: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Parse(#[from] ParserError),
}

/// Reads records from a byte source through a fixed-size buffer.
///
/// Each read is parsed as soon as it arrives; bytes after a completed record
/// stay in the buffer for the next call. At end of input the session is
/// finished, so a truncated stream surfaces as an error.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use recordmodem::{Column, ParserOptions, RecordReader, ScalarType, Schema};
///
/// let schema = Arc::new(Schema::new("t", vec![Column::scalar("n", ScalarType::Int8)]));
/// let input = &b"{\"n\": 1}\n{\"n\": 2}\n"[..];
/// let records = RecordReader::new(input, schema, ParserOptions::default())
///     .collect::<Result<Vec<_>, _>>()?;
/// assert_eq!(records.len(), 2);
/// # Ok::<(), recordmodem::ReaderError>(())
/// ```
#[derive(Debug)]
pub struct RecordReader<R, C = StdConverter> {
    source: R,
    parser: RecordParser<C>,
    buffer: Box<[u8]>,
    start: usize,
    end: usize,
    eof: bool,
    done: bool,
}

impl<R: Read> RecordReader<R, StdConverter> {
    pub fn new(source: R, schema: Arc<Schema>, options: ParserOptions) -> Self {
        Self::with_parser(
            source,
            RecordParser::new(schema, options),
            ReaderOptions::default(),
        )
    }
}

impl<R: Read, C: ScalarConverter> RecordReader<R, C> {
    pub fn with_parser(source: R, parser: RecordParser<C>, options: ReaderOptions) -> Self {
        Self {
            source,
            parser,
            buffer: vec![0; options.buffer_size.max(1)].into_boxed_slice(),
            start: 0,
            end: 0,
            eof: false,
            done: false,
        }
    }

    #[must_use]
    pub fn parser(&self) -> &RecordParser<C> {
        &self.parser
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        self.parser.take_diagnostics()
    }

    pub fn into_inner(self) -> R {
        self.source
    }

    /// Returns the next record, or `None` once the stream is exhausted.
    ///
    /// # Errors
    ///
    /// Transport failures and fatal parse errors.
    pub fn next_record(&mut self) -> Result<Option<Record>, ReaderError> {
        if self.done {
            return Ok(None);
        }
        loop {
            if self.start < self.end {
                let progress = self.parser.parse(&self.buffer[..self.end], self.start)?;
                self.start = progress.offset;
                if progress.outcome == ParseOutcome::RecordComplete {
                    let record = self.parser.materialize()?;
                    self.parser.reset();
                    return Ok(Some(record));
                }
            }
            if self.eof {
                self.done = true;
                self.parser.finish()?;
                return Ok(None);
            }
            self.fill()?;
        }
    }

    fn fill(&mut self) -> io::Result<()> {
        self.start = 0;
        self.end = 0;
        loop {
            match self.source.read(&mut self.buffer) {
                Ok(0) => {
                    debug!("end of input");
                    self.eof = true;
                    return Ok(());
                }
                Ok(n) => {
                    debug!(bytes = n, "read");
                    self.end = n;
                    return Ok(());
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => return Err(err),
            }
        }
    }
}

impl<R: Read, C: ScalarConverter> Iterator for RecordReader<R, C> {
    type Item = Result<Record, ReaderError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_record() {
            Ok(record) => record.map(Ok),
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}
