//! Resumable, byte-oriented JSON lexer.
//!
//! Overview
//! - [`Lexer::feed`] consumes a chunk of bytes and reports each completed
//!   lexical event to a [`LexSink`]: null, booleans, numbers, strings, map
//!   keys, and the start/end of maps and arrays.
//! - All state needed to resume (grammar position, open containers, the
//!   partially lexed token) lives in the lexer, so a token or value may span
//!   any number of chunks and no byte is ever scanned twice.
//! - The stream may hold any number of top-level values back to back, with or
//!   without whitespace between them.
//!
//! Consumption accounting
//! - [`Lexed::consumed`] is the number of bytes of the chunk the lexer has
//!   committed. The caller advances its cursor by exactly this amount.
//! - A sink may answer any event with [`Flow::Stop`]. The lexer then returns
//!   [`LexStatus::StopRequested`] immediately. For the opening `{` or `[` of a
//!   container the opening byte is *not* committed and the container is not
//!   entered, so the next call starts on that byte again. For every other
//!   event the bytes that produced it are committed.
//! - A number is only complete once the byte after it is seen. That byte is
//!   re-dispatched rather than consumed with the number, so `consumed` never
//!   includes look-ahead.
//!
//! Errors
//! - Malformed input yields a [`LexError`] carrying a [`SyntaxError`] and the
//!   position of the offending byte. Sink errors are passed through with the
//!   same positional context. After an error the lexer must be [`reset`]
//!   before reuse.
//!
//! [`reset`]: Lexer::reset

mod escape_buffer;
mod literal_buffer;

use core::fmt;

use bstr::ByteSlice;
use escape_buffer::{UnicodeEscapeBuffer, combine_surrogates, is_high_surrogate, is_low_surrogate};
use literal_buffer::{ExpectedLiteralBuffer, Literal, Step};

use crate::error::SyntaxError;

/// Whether the sink wants the lexer to keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// Receiver of lexical events.
///
/// Strings and keys are passed fully decoded; numbers are passed as their
/// source lexeme so that no precision is lost before conversion.
pub trait LexSink {
    type Error;

    fn null(&mut self) -> Result<Flow, Self::Error>;
    fn boolean(&mut self, value: bool) -> Result<Flow, Self::Error>;
    fn number(&mut self, lexeme: &str) -> Result<Flow, Self::Error>;
    fn string(&mut self, value: &str) -> Result<Flow, Self::Error>;
    fn map_key(&mut self, key: &str) -> Result<Flow, Self::Error>;
    fn start_map(&mut self) -> Result<Flow, Self::Error>;
    fn end_map(&mut self) -> Result<Flow, Self::Error>;
    fn start_array(&mut self) -> Result<Flow, Self::Error>;
    fn end_array(&mut self) -> Result<Flow, Self::Error>;
}

/// Outcome of a [`Lexer::feed`] call that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexStatus {
    /// The whole chunk was consumed.
    Continue,
    /// The sink asked to stop; the rest of the chunk is untouched.
    StopRequested,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lexed {
    pub status: LexStatus,
    /// Bytes of the chunk committed by this call.
    pub consumed: usize,
}

/// What went wrong inside [`Lexer::feed`].
#[derive(Debug, PartialEq)]
pub enum LexErrorKind<E> {
    Syntax(SyntaxError),
    Sink(E),
}

/// A lexing failure with the stream position of the offending byte.
#[derive(Debug, PartialEq)]
pub struct LexError<E> {
    pub kind: LexErrorKind<E>,
    pub line: usize,
    pub column: usize,
    /// Stream bytes committed before the failure.
    pub offset: u64,
}

impl<E: fmt::Display> fmt::Display for LexError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            LexErrorKind::Syntax(err) => write!(f, "syntax error: {err}")?,
            LexErrorKind::Sink(err) => write!(f, "{err}")?,
        }
        write!(f, " at {}:{}", self.line, self.column)
    }
}

impl<E: fmt::Debug + fmt::Display> core::error::Error for LexError<E> {}

// ------------------------------------------------------------------------------------------------
// Internal states
// ------------------------------------------------------------------------------------------------

/// Position in the JSON grammar between tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    /// Expecting a top-level value.
    Start,
    BeforePropertyName { first: bool },
    AfterPropertyName,
    BeforePropertyValue,
    BeforeArrayValue { first: bool },
    AfterPropertyValue,
    AfterArrayValue,
}

/// Token currently being lexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexState {
    Default,
    ValueLiteral,
    Sign,
    Zero,
    DecimalInteger,
    DecimalPoint,
    DecimalFraction,
    DecimalExponent,
    DecimalExponentSign,
    DecimalExponentInteger,
    String,
    StringEscape,
    StringEscapeUnicode,
    /// A high surrogate was decoded; expecting `\` of the low half.
    StringSurrogateEscape,
    /// Expecting `u` of the low half.
    StringSurrogateU,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    Object,
    Array,
}

/// How far a single step moved through the chunk.
enum Advance {
    By(usize),
    Stop(usize),
}

const WHITESPACE: &[u8] = b" \t\n\r";
const DIGITS: &[u8] = b"0123456789";

/// Bytes that end a run of plain string content.
const STRING_STOP: [u8; 34] = {
    let mut set = [0u8; 34];
    let mut i = 0;
    while i < 32 {
        set[i] = i as u8;
        i += 1;
    }
    set[32] = b'"';
    set[33] = b'\\';
    set
};

/// The streaming lexer. See the [module documentation](self).
#[derive(Debug)]
pub struct Lexer {
    parse_state: ParseState,
    lex_state: LexState,
    frames: Vec<Frame>,
    max_depth: Option<usize>,

    /// Decoded bytes of the string or number being lexed. Reused across
    /// tokens.
    scratch: Vec<u8>,
    string_is_key: bool,
    escape: UnicodeEscapeBuffer,
    pending_high_surrogate: Option<u16>,
    literal: ExpectedLiteralBuffer,

    offset: u64,
    line: usize,
    column: usize,
}

impl Default for Lexer {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Lexer {
    /// Creates a lexer. `max_depth` bounds container nesting.
    #[must_use]
    pub fn new(max_depth: Option<usize>) -> Self {
        Self {
            parse_state: ParseState::Start,
            lex_state: LexState::Default,
            frames: Vec::with_capacity(16),
            max_depth,
            scratch: Vec::new(),
            string_is_key: false,
            escape: UnicodeEscapeBuffer::new(),
            pending_high_surrogate: None,
            literal: ExpectedLiteralBuffer::none(),
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    /// Returns the lexer to its initial state, keeping allocations.
    pub fn reset(&mut self) {
        self.parse_state = ParseState::Start;
        self.lex_state = LexState::Default;
        self.frames.clear();
        self.scratch.clear();
        self.string_is_key = false;
        self.escape.reset();
        self.pending_high_surrogate = None;
        self.literal = ExpectedLiteralBuffer::none();
        self.offset = 0;
        self.line = 1;
        self.column = 1;
    }

    /// `true` between top-level values with no token in flight.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.parse_state == ParseState::Start && self.lex_state == LexState::Default
    }

    /// Number of open containers.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Total bytes committed since creation or the last reset.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    #[must_use]
    pub fn line(&self) -> usize {
        self.line
    }

    #[must_use]
    pub fn column(&self) -> usize {
        self.column
    }

    /// Lex as much of `input` as possible, reporting events to `sink`.
    ///
    /// # Errors
    ///
    /// Returns a [`LexError`] when the input is not valid JSON or when the
    /// sink fails.
    pub fn feed<S: LexSink>(
        &mut self,
        input: &[u8],
        sink: &mut S,
    ) -> Result<Lexed, LexError<S::Error>> {
        let mut pos = 0;
        while pos < input.len() {
            match self.step(input, pos, sink)? {
                Advance::By(n) => {
                    self.commit(&input[pos..pos + n]);
                    pos += n;
                }
                Advance::Stop(n) => {
                    self.commit(&input[pos..pos + n]);
                    pos += n;
                    return Ok(Lexed {
                        status: LexStatus::StopRequested,
                        consumed: pos,
                    });
                }
            }
        }
        Ok(Lexed {
            status: LexStatus::Continue,
            consumed: input.len(),
        })
    }

    /// Signals end of input.
    ///
    /// A number at the very end of the stream is completed and reported.
    ///
    /// # Errors
    ///
    /// Returns [`SyntaxError::UnexpectedEndOfInput`] if the stream ends inside
    /// a token or an open container.
    pub fn finish<S: LexSink>(&mut self, sink: &mut S) -> Result<Flow, LexError<S::Error>> {
        let mut flow = Flow::Continue;
        if matches!(
            self.lex_state,
            LexState::Zero
                | LexState::DecimalInteger
                | LexState::DecimalFraction
                | LexState::DecimalExponentInteger
        ) {
            flow = self.emit_number(sink)?;
        }
        if self.is_idle() {
            Ok(flow)
        } else {
            Err(self.syntax(SyntaxError::UnexpectedEndOfInput))
        }
    }

    #[inline(always)]
    fn commit(&mut self, bytes: &[u8]) {
        self.offset += bytes.len() as u64;
        for &b in bytes {
            if b == b'\n' {
                self.line += 1;
                self.column = 1;
            } else if b & 0xC0 != 0x80 {
                self.column += 1;
            }
        }
    }

    fn syntax<E>(&self, err: SyntaxError) -> LexError<E> {
        LexError {
            kind: LexErrorKind::Syntax(err),
            line: self.line,
            column: self.column,
            offset: self.offset,
        }
    }

    fn sink_error<E>(&self, err: E) -> LexError<E> {
        LexError {
            kind: LexErrorKind::Sink(err),
            line: self.line,
            column: self.column,
            offset: self.offset,
        }
    }

    fn invalid<E>(&self, b: u8) -> LexError<E> {
        self.syntax(SyntaxError::InvalidCharacter(b))
    }

    /// Grammar state after a complete value.
    fn value_done(&mut self) {
        self.parse_state = match self.frames.last() {
            None => ParseState::Start,
            Some(Frame::Object) => ParseState::AfterPropertyValue,
            Some(Frame::Array) => ParseState::AfterArrayValue,
        };
    }

    fn advance(flow: Flow, n: usize) -> Advance {
        match flow {
            Flow::Continue => Advance::By(n),
            Flow::Stop => Advance::Stop(n),
        }
    }

    // --------------------------------------------------------------------------------------------
    // Dispatch
    // --------------------------------------------------------------------------------------------

    #[inline(always)]
    fn step<S: LexSink>(
        &mut self,
        input: &[u8],
        pos: usize,
        sink: &mut S,
    ) -> Result<Advance, LexError<S::Error>> {
        let b = input[pos];
        match self.lex_state {
            LexState::Default => self.step_structural(input, pos, sink),

            LexState::ValueLiteral => match self.literal.step(b) {
                Step::NeedMore => Ok(Advance::By(1)),
                Step::Done(literal) => {
                    self.lex_state = LexState::Default;
                    self.value_done();
                    let result = match literal {
                        Literal::Null => sink.null(),
                        Literal::True => sink.boolean(true),
                        Literal::False => sink.boolean(false),
                    };
                    let flow = result.map_err(|e| self.sink_error(e))?;
                    Ok(Self::advance(flow, 1))
                }
                Step::Reject => Err(self.invalid(b)),
            },

            // -------------------------- NUMBERS -----------------------------
            LexState::Sign => match b {
                b'0' => self.push_number_byte(b, LexState::Zero),
                b'1'..=b'9' => self.push_number_byte(b, LexState::DecimalInteger),
                _ => Err(self.invalid(b)),
            },
            LexState::Zero => match b {
                b'.' => self.push_number_byte(b, LexState::DecimalPoint),
                b'e' | b'E' => self.push_number_byte(b, LexState::DecimalExponent),
                _ => self.end_number(sink),
            },
            LexState::DecimalInteger => match b {
                b'0'..=b'9' => Ok(self.copy_digits(input, pos)),
                b'.' => self.push_number_byte(b, LexState::DecimalPoint),
                b'e' | b'E' => self.push_number_byte(b, LexState::DecimalExponent),
                _ => self.end_number(sink),
            },
            LexState::DecimalPoint => match b {
                b'0'..=b'9' => self.push_number_byte(b, LexState::DecimalFraction),
                _ => Err(self.invalid(b)),
            },
            LexState::DecimalFraction => match b {
                b'0'..=b'9' => Ok(self.copy_digits(input, pos)),
                b'e' | b'E' => self.push_number_byte(b, LexState::DecimalExponent),
                _ => self.end_number(sink),
            },
            LexState::DecimalExponent => match b {
                b'+' | b'-' => self.push_number_byte(b, LexState::DecimalExponentSign),
                b'0'..=b'9' => self.push_number_byte(b, LexState::DecimalExponentInteger),
                _ => Err(self.invalid(b)),
            },
            LexState::DecimalExponentSign => match b {
                b'0'..=b'9' => self.push_number_byte(b, LexState::DecimalExponentInteger),
                _ => Err(self.invalid(b)),
            },
            LexState::DecimalExponentInteger => match b {
                b'0'..=b'9' => Ok(self.copy_digits(input, pos)),
                _ => self.end_number(sink),
            },

            // -------------------------- STRINGS -----------------------------
            LexState::String => {
                let rest = &input[pos..];
                match rest.find_byteset(STRING_STOP) {
                    Some(0) => match b {
                        b'"' => self.end_string(sink),
                        b'\\' => {
                            self.lex_state = LexState::StringEscape;
                            Ok(Advance::By(1))
                        }
                        _ => Err(self.syntax(SyntaxError::ControlCharacterInString(b))),
                    },
                    Some(run) => {
                        self.scratch.extend_from_slice(&rest[..run]);
                        Ok(Advance::By(run))
                    }
                    None => {
                        self.scratch.extend_from_slice(rest);
                        Ok(Advance::By(rest.len()))
                    }
                }
            }
            LexState::StringEscape => {
                let decoded = match b {
                    b'"' | b'\\' | b'/' => b,
                    b'b' => 0x08,
                    b'f' => 0x0C,
                    b'n' => b'\n',
                    b'r' => b'\r',
                    b't' => b'\t',
                    b'u' => {
                        self.escape.reset();
                        self.lex_state = LexState::StringEscapeUnicode;
                        return Ok(Advance::By(1));
                    }
                    _ => return Err(self.syntax(SyntaxError::InvalidEscape(b))),
                };
                self.scratch.push(decoded);
                self.lex_state = LexState::String;
                Ok(Advance::By(1))
            }
            LexState::StringEscapeUnicode => match self.escape.feed(b) {
                Ok(None) => Ok(Advance::By(1)),
                Ok(Some(unit)) => {
                    self.push_code_unit(unit)?;
                    Ok(Advance::By(1))
                }
                Err(_) => Err(self.syntax(SyntaxError::InvalidUnicodeEscape(b))),
            },
            LexState::StringSurrogateEscape | LexState::StringSurrogateU => {
                let expected = if self.lex_state == LexState::StringSurrogateEscape {
                    b'\\'
                } else {
                    b'u'
                };
                if b != expected {
                    let high = self.pending_high_surrogate.unwrap_or_default();
                    return Err(self.syntax(SyntaxError::UnpairedSurrogate(high)));
                }
                self.lex_state = if expected == b'\\' {
                    LexState::StringSurrogateU
                } else {
                    self.escape.reset();
                    LexState::StringEscapeUnicode
                };
                Ok(Advance::By(1))
            }
        }
    }

    /// Whitespace, punctuation and the first byte of every value.
    fn step_structural<S: LexSink>(
        &mut self,
        input: &[u8],
        pos: usize,
        sink: &mut S,
    ) -> Result<Advance, LexError<S::Error>> {
        let rest = &input[pos..];
        match rest.find_not_byteset(WHITESPACE) {
            Some(0) => {}
            Some(n) => return Ok(Advance::By(n)),
            None => return Ok(Advance::By(rest.len())),
        }

        let b = rest[0];
        match self.parse_state {
            ParseState::Start | ParseState::BeforePropertyValue => self.begin_value(b, sink),
            ParseState::BeforeArrayValue { first } => {
                if first && b == b']' {
                    self.close(Frame::Array, sink)
                } else {
                    self.begin_value(b, sink)
                }
            }
            ParseState::BeforePropertyName { first } => match b {
                b'"' => {
                    self.begin_string(true);
                    Ok(Advance::By(1))
                }
                b'}' if first => self.close(Frame::Object, sink),
                _ => Err(self.invalid(b)),
            },
            ParseState::AfterPropertyName => match b {
                b':' => {
                    self.parse_state = ParseState::BeforePropertyValue;
                    Ok(Advance::By(1))
                }
                _ => Err(self.invalid(b)),
            },
            ParseState::AfterPropertyValue => match b {
                b',' => {
                    self.parse_state = ParseState::BeforePropertyName { first: false };
                    Ok(Advance::By(1))
                }
                b'}' => self.close(Frame::Object, sink),
                _ => Err(self.invalid(b)),
            },
            ParseState::AfterArrayValue => match b {
                b',' => {
                    self.parse_state = ParseState::BeforeArrayValue { first: false };
                    Ok(Advance::By(1))
                }
                b']' => self.close(Frame::Array, sink),
                _ => Err(self.invalid(b)),
            },
        }
    }

    fn begin_value<S: LexSink>(
        &mut self,
        b: u8,
        sink: &mut S,
    ) -> Result<Advance, LexError<S::Error>> {
        match b {
            b'{' | b'[' => {
                if let Some(max) = self.max_depth {
                    if self.frames.len() >= max {
                        return Err(self.syntax(SyntaxError::DepthLimitExceeded(max)));
                    }
                }
                let result = if b == b'{' {
                    sink.start_map()
                } else {
                    sink.start_array()
                };
                // A stop on an opening byte leaves it uncommitted.
                if result.map_err(|e| self.sink_error(e))? == Flow::Stop {
                    return Ok(Advance::Stop(0));
                }
                if b == b'{' {
                    self.frames.push(Frame::Object);
                    self.parse_state = ParseState::BeforePropertyName { first: true };
                } else {
                    self.frames.push(Frame::Array);
                    self.parse_state = ParseState::BeforeArrayValue { first: true };
                }
                Ok(Advance::By(1))
            }
            b'"' => {
                self.begin_string(false);
                Ok(Advance::By(1))
            }
            b'-' => {
                self.scratch.clear();
                self.push_number_byte(b, LexState::Sign)
            }
            b'0' => {
                self.scratch.clear();
                self.push_number_byte(b, LexState::Zero)
            }
            b'1'..=b'9' => {
                self.scratch.clear();
                self.push_number_byte(b, LexState::DecimalInteger)
            }
            b'n' | b't' | b'f' => {
                self.literal = ExpectedLiteralBuffer::new(b);
                self.lex_state = LexState::ValueLiteral;
                Ok(Advance::By(1))
            }
            _ => Err(self.invalid(b)),
        }
    }

    fn close<S: LexSink>(
        &mut self,
        frame: Frame,
        sink: &mut S,
    ) -> Result<Advance, LexError<S::Error>> {
        debug_assert_eq!(self.frames.last(), Some(&frame));
        self.frames.pop();
        self.value_done();
        let result = match frame {
            Frame::Object => sink.end_map(),
            Frame::Array => sink.end_array(),
        };
        let flow = result.map_err(|e| self.sink_error(e))?;
        Ok(Self::advance(flow, 1))
    }

    // --------------------------------------------------------------------------------------------
    // Numbers
    // --------------------------------------------------------------------------------------------

    fn push_number_byte<E>(&mut self, b: u8, next: LexState) -> Result<Advance, LexError<E>> {
        self.scratch.push(b);
        self.lex_state = next;
        Ok(Advance::By(1))
    }

    fn copy_digits(&mut self, input: &[u8], pos: usize) -> Advance {
        let rest = &input[pos..];
        let run = rest.find_not_byteset(DIGITS).unwrap_or(rest.len());
        self.scratch.extend_from_slice(&rest[..run]);
        Advance::By(run)
    }

    /// Completes the number on a byte that cannot continue it. The byte is
    /// left for the structural state to handle.
    fn end_number<S: LexSink>(&mut self, sink: &mut S) -> Result<Advance, LexError<S::Error>> {
        let flow = self.emit_number(sink)?;
        Ok(Self::advance(flow, 0))
    }

    fn emit_number<S: LexSink>(&mut self, sink: &mut S) -> Result<Flow, LexError<S::Error>> {
        self.lex_state = LexState::Default;
        self.value_done();
        let result = match core::str::from_utf8(&self.scratch) {
            Ok(lexeme) => sink.number(lexeme),
            Err(_) => return Err(self.syntax(SyntaxError::InvalidUtf8)),
        };
        self.scratch.clear();
        result.map_err(|e| self.sink_error(e))
    }

    // --------------------------------------------------------------------------------------------
    // Strings
    // --------------------------------------------------------------------------------------------

    fn begin_string(&mut self, is_key: bool) {
        self.scratch.clear();
        self.string_is_key = is_key;
        self.pending_high_surrogate = None;
        self.lex_state = LexState::String;
    }

    fn push_code_unit<E>(&mut self, unit: u16) -> Result<(), LexError<E>> {
        let ch = match self.pending_high_surrogate.take() {
            Some(high) if is_low_surrogate(unit) => combine_surrogates(high, unit),
            Some(high) => return Err(self.syntax(SyntaxError::UnpairedSurrogate(high))),
            None if is_high_surrogate(unit) => {
                self.pending_high_surrogate = Some(unit);
                self.lex_state = LexState::StringSurrogateEscape;
                return Ok(());
            }
            None if is_low_surrogate(unit) => {
                return Err(self.syntax(SyntaxError::UnpairedSurrogate(unit)));
            }
            None => char::from_u32(u32::from(unit)),
        };
        let Some(ch) = ch else {
            return Err(self.syntax(SyntaxError::UnpairedSurrogate(unit)));
        };
        let mut utf8 = [0u8; 4];
        self.scratch
            .extend_from_slice(ch.encode_utf8(&mut utf8).as_bytes());
        self.lex_state = LexState::String;
        Ok(())
    }

    fn end_string<S: LexSink>(&mut self, sink: &mut S) -> Result<Advance, LexError<S::Error>> {
        self.lex_state = LexState::Default;
        let is_key = self.string_is_key;
        if is_key {
            self.parse_state = ParseState::AfterPropertyName;
        } else {
            self.value_done();
        }
        let result = match core::str::from_utf8(&self.scratch) {
            Ok(text) if is_key => sink.map_key(text),
            Ok(text) => sink.string(text),
            Err(_) => return Err(self.syntax(SyntaxError::InvalidUtf8)),
        };
        self.scratch.clear();
        let flow = result.map_err(|e| self.sink_error(e))?;
        Ok(Self::advance(flow, 1))
    }
}
