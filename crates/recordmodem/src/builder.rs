//! Depth-tracked record builder.
//!
//! [`RecordBuilder`] receives lexical events one at a time and assembles a
//! single record from them. Depth is counted relative to the record:
//!
//! - depth 0 is between records; only the opening `{` of a record is valid,
//! - depth 1 is the record object itself, where each key selects a column and
//!   each scalar value is converted straight into that column's slot,
//! - depth 2 and deeper is nested content. It is reserialized into a text
//!   buffer (compact JSON for structured columns, array literal syntax for
//!   array columns) and converted once the column's value closes.
//!
//! Closing the record object requests a stop so the lexer never runs into the
//! next record. While a finished record is waiting to be drained, the opening
//! `{` of the next one is refused with another stop.
use core::mem;
use std::sync::Arc;

use tracing::{trace, warn};

use crate::{
    convert::{ConversionError, ScalarConverter},
    diagnostic::{Diagnostic, DiagnosticKind, ValueShape},
    error::{ColumnConversionError, ErrorSource, RecordError},
    lexer::{Flow, LexSink},
    options::ParserOptions,
    schema::{ColumnKind, ScalarType, Schema},
    value::{TypedValue, write_array_escaped, write_json_escaped},
};

/// Which column the value at depth 1 belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnSelection {
    /// No key has been seen for the next value.
    Unset,
    /// The key matched no column; the value is skipped.
    Unmatched,
    Column(usize),
}

/// How nested content of the current column is collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Capture {
    Discard,
    Json(usize),
    ArrayLiteral(usize, ScalarType),
}

#[derive(Debug, Clone, Copy)]
enum Scalar<'a> {
    Null,
    Bool(bool),
    Number(&'a str),
    String(&'a str),
}

impl<'a> Scalar<'a> {
    fn name(self) -> &'static str {
        match self {
            Scalar::Null => "null",
            Scalar::Bool(_) => "boolean",
            Scalar::Number(_) => "number",
            Scalar::String(_) => "string",
        }
    }

    /// Literal text handed to the converter; `None` for null.
    fn text(self) -> Option<&'a str> {
        match self {
            Scalar::Null => None,
            Scalar::Bool(true) => Some("true"),
            Scalar::Bool(false) => Some("false"),
            Scalar::Number(n) | Scalar::String(n) => Some(n),
        }
    }
}

/// A value needs a comma in front of it unless it opens a container, follows
/// a key, or follows another comma.
fn push_separator(text: &mut String) {
    if !matches!(text.as_bytes().last(), None | Some(b'{' | b'[' | b':' | b',')) {
        text.push(',');
    }
}

fn write_json_scalar(text: &mut String, value: Scalar<'_>) {
    match value {
        Scalar::String(s) => {
            text.push('"');
            // Writing into a `String` cannot fail.
            let _ = write_json_escaped(s, text);
            text.push('"');
        }
        Scalar::Null => text.push_str("null"),
        Scalar::Bool(_) | Scalar::Number(_) => text.push_str(value.text().unwrap_or_default()),
    }
}

fn write_array_scalar(text: &mut String, value: Scalar<'_>) {
    match value {
        Scalar::String(s) => {
            text.push('"');
            let _ = write_array_escaped(s, text);
            text.push('"');
        }
        Scalar::Null => text.push_str("NULL"),
        Scalar::Bool(_) | Scalar::Number(_) => text.push_str(value.text().unwrap_or_default()),
    }
}

fn declared_label(kind: ColumnKind) -> &'static str {
    match kind {
        ColumnKind::Scalar { ty, .. } => ty.name(),
        ColumnKind::Array { .. } => "array",
        ColumnKind::Structured => "structured",
    }
}

#[derive(Debug)]
pub(crate) struct RecordBuilder<C> {
    schema: Arc<Schema>,
    converter: C,
    options: ParserOptions,

    selection: ColumnSelection,
    depth: u32,
    record_started: bool,
    record_complete: bool,
    drained: bool,
    capture: Capture,
    /// Reserialized nested content of the column being captured.
    pending_text: String,
    /// Per session; survives [`RecordBuilder::reset`].
    warned_once: bool,
    values: Vec<Option<TypedValue>>,
    diagnostics: Vec<Diagnostic>,
}

impl<C: ScalarConverter> RecordBuilder<C> {
    pub(crate) fn new(schema: Arc<Schema>, converter: C, options: ParserOptions) -> Self {
        let values = vec![None; schema.len()];
        Self {
            schema,
            converter,
            options,
            selection: ColumnSelection::Unset,
            depth: 0,
            record_started: false,
            record_complete: false,
            drained: false,
            capture: Capture::Discard,
            pending_text: String::new(),
            warned_once: false,
            values,
            diagnostics: Vec::new(),
        }
    }

    pub(crate) fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub(crate) fn converter(&self) -> &C {
        &self.converter
    }

    pub(crate) fn record_started(&self) -> bool {
        self.record_started
    }

    pub(crate) fn record_complete(&self) -> bool {
        self.record_complete
    }

    /// Moves the finished record's values out, leaving null slots behind.
    pub(crate) fn take_record(&mut self) -> Result<Vec<Option<TypedValue>>, RecordError> {
        if !self.record_complete || self.drained {
            return Err(RecordError::NoRecordReady);
        }
        self.drained = true;
        Ok(self.values.iter_mut().map(Option::take).collect())
    }

    /// Clears all per-record state, keeping allocations and the warning
    /// throttle.
    pub(crate) fn reset(&mut self) {
        self.selection = ColumnSelection::Unset;
        self.depth = 0;
        self.record_started = false;
        self.record_complete = false;
        self.drained = false;
        self.capture = Capture::Discard;
        self.pending_text.clear();
        self.values.fill(None);
    }

    pub(crate) fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        mem::take(&mut self.diagnostics)
    }

    fn begin_record(&mut self) {
        self.values.fill(None);
        self.selection = ColumnSelection::Unset;
        self.record_started = true;
        self.depth = 1;
    }

    fn conversion_error(&self, index: usize, source: ConversionError) -> ErrorSource {
        ColumnConversionError {
            column: self.schema.columns()[index].name.clone(),
            table: self.schema.table().to_owned(),
            source,
        }
        .into()
    }

    fn warn_mismatch(&mut self, index: usize, received: ValueShape) {
        if self.warned_once {
            return;
        }
        self.warned_once = true;
        let column = &self.schema.columns()[index];
        let declared = declared_label(column.kind);
        warn!(
            table = self.schema.table(),
            column = %column.name,
            declared,
            %received,
            "column received a nested value; keeping it as JSON text"
        );
        self.diagnostics.push(Diagnostic {
            table: self.schema.table().to_owned(),
            kind: DiagnosticKind::KindMismatch {
                column: column.name.clone(),
                declared,
                received,
            },
        });
    }

    // --------------------------------------------------------------------------------------------
    // Depth 1: column binding
    // --------------------------------------------------------------------------------------------

    fn select(&mut self, key: &str) -> Result<(), RecordError> {
        self.selection = match self.schema.column_index(key) {
            Some(index) => ColumnSelection::Column(index),
            None if self.options.reject_unknown_fields => {
                return Err(RecordError::UnknownField {
                    field: key.to_owned(),
                    table: self.schema.table().to_owned(),
                });
            }
            None => ColumnSelection::Unmatched,
        };
        Ok(())
    }

    /// Takes the selection for the value that just started.
    fn take_selection(&mut self, what: &'static str) -> Result<Option<usize>, RecordError> {
        match mem::replace(&mut self.selection, ColumnSelection::Unset) {
            ColumnSelection::Unset => Err(RecordError::NoColumnSelected(what)),
            ColumnSelection::Unmatched => Ok(None),
            ColumnSelection::Column(index) if self.schema.columns()[index].used => Ok(Some(index)),
            ColumnSelection::Column(_) => Ok(None),
        }
    }

    fn bind_scalar(&mut self, value: Scalar<'_>) -> Result<(), ErrorSource> {
        let Some(index) = self.take_selection(value.name())? else {
            return Ok(());
        };
        let Some(text) = value.text() else {
            self.values[index] = None;
            return Ok(());
        };
        let converted = match self.schema.columns()[index].kind {
            ColumnKind::Structured => {
                let mut json = String::with_capacity(text.len() + 2);
                write_json_scalar(&mut json, value);
                Ok(TypedValue::Json(json))
            }
            ColumnKind::Scalar { ty, type_modifier } => {
                let text = match value {
                    Scalar::Number(n)
                        if self.options.integer_fraction_fixup && ty.is_fixed_size_integer() =>
                    {
                        n.strip_suffix(".0").unwrap_or(n)
                    }
                    _ => text,
                };
                let modifier = type_modifier.filter(|_| ty.takes_type_modifier());
                self.converter.convert(ty, modifier, text)
            }
            ColumnKind::Array { element } => self.converter.convert_array(element, text),
        };
        match converted {
            Ok(converted) => {
                self.values[index] = Some(converted);
                Ok(())
            }
            Err(err) => Err(self.conversion_error(index, err)),
        }
    }

    fn begin_capture(&mut self, shape: ValueShape) -> Result<(), RecordError> {
        #[cfg(feature = "fuzzing")]
        assert!(self.pending_text.is_empty(), "capture buffer not drained");

        let Some(index) = self.take_selection(shape.as_str())? else {
            self.capture = Capture::Discard;
            return Ok(());
        };
        self.capture = match (self.schema.columns()[index].kind, shape) {
            (ColumnKind::Structured, _) => Capture::Json(index),
            (ColumnKind::Array { element }, ValueShape::Array) => {
                Capture::ArrayLiteral(index, element)
            }
            _ => {
                self.warn_mismatch(index, shape);
                Capture::Json(index)
            }
        };
        Ok(())
    }

    fn finish_capture(&mut self) -> Result<(), ErrorSource> {
        let result = match mem::replace(&mut self.capture, Capture::Discard) {
            Capture::Discard => Ok(()),
            Capture::Json(index) => {
                trace!(column = %self.schema.columns()[index].name, text = %self.pending_text, "captured nested value");
                self.values[index] = if self.pending_text.is_empty() {
                    None
                } else {
                    Some(TypedValue::Json(self.pending_text.clone()))
                };
                Ok(())
            }
            Capture::ArrayLiteral(index, element) => {
                trace!(column = %self.schema.columns()[index].name, text = %self.pending_text, "captured array literal");
                match self.converter.convert_array(element, &self.pending_text) {
                    Ok(value) => {
                        self.values[index] = Some(value);
                        Ok(())
                    }
                    Err(err) => Err(self.conversion_error(index, err)),
                }
            }
        };
        self.pending_text.clear();
        result
    }

    // --------------------------------------------------------------------------------------------
    // Depth > 1: reserialization
    // --------------------------------------------------------------------------------------------

    fn append_scalar(&mut self, value: Scalar<'_>) {
        match self.capture {
            Capture::Discard => {}
            Capture::Json(_) => {
                push_separator(&mut self.pending_text);
                write_json_scalar(&mut self.pending_text, value);
            }
            Capture::ArrayLiteral(..) => {
                push_separator(&mut self.pending_text);
                write_array_scalar(&mut self.pending_text, value);
            }
        }
    }

    fn append_key(&mut self, key: &str) -> Result<(), RecordError> {
        match self.capture {
            Capture::Discard => Ok(()),
            Capture::Json(_) => {
                push_separator(&mut self.pending_text);
                write_json_scalar(&mut self.pending_text, Scalar::String(key));
                self.pending_text.push(':');
                Ok(())
            }
            Capture::ArrayLiteral(index, _) => Err(RecordError::KeyInsideArrayColumn {
                column: self.schema.columns()[index].name.clone(),
                key: key.to_owned(),
            }),
        }
    }

    fn append_open(&mut self, shape: ValueShape) {
        let open = match (self.capture, shape) {
            (Capture::Discard, _) => return,
            (Capture::Json(_), ValueShape::Object) | (Capture::ArrayLiteral(..), _) => '{',
            (Capture::Json(_), ValueShape::Array) => '[',
        };
        push_separator(&mut self.pending_text);
        self.pending_text.push(open);
    }

    fn append_close(&mut self, shape: ValueShape) {
        let close = match (self.capture, shape) {
            (Capture::Discard, _) => return,
            (Capture::Json(_), ValueShape::Object) | (Capture::ArrayLiteral(..), _) => '}',
            (Capture::Json(_), ValueShape::Array) => ']',
        };
        self.pending_text.push(close);
    }

    // --------------------------------------------------------------------------------------------
    // Event dispatch
    // --------------------------------------------------------------------------------------------

    fn on_scalar(&mut self, value: Scalar<'_>) -> Result<Flow, ErrorSource> {
        match self.depth {
            0 => Err(RecordError::ValueAtTopLevel(value.name()).into()),
            1 => {
                self.bind_scalar(value)?;
                Ok(Flow::Continue)
            }
            _ => {
                self.append_scalar(value);
                Ok(Flow::Continue)
            }
        }
    }

    fn on_open(&mut self, shape: ValueShape) -> Result<Flow, ErrorSource> {
        match self.depth {
            0 => match shape {
                // The previous record has not been drained yet.
                ValueShape::Object if self.record_complete => Ok(Flow::Stop),
                ValueShape::Object => {
                    self.begin_record();
                    Ok(Flow::Continue)
                }
                ValueShape::Array => Err(RecordError::TopLevelNotObject.into()),
            },
            1 => {
                self.begin_capture(shape)?;
                self.depth = 2;
                self.append_open(shape);
                Ok(Flow::Continue)
            }
            _ => {
                if let (Capture::ArrayLiteral(index, _), ValueShape::Object) = (self.capture, shape) {
                    self.warn_mismatch(index, shape);
                }
                self.depth += 1;
                self.append_open(shape);
                Ok(Flow::Continue)
            }
        }
    }

    fn on_close(&mut self, shape: ValueShape) -> Result<Flow, ErrorSource> {
        match (self.depth, shape) {
            (0, _) | (1, ValueShape::Array) => Err(RecordError::DepthUnderflow.into()),
            (1, ValueShape::Object) => {
                self.depth = 0;
                self.record_complete = true;
                Ok(Flow::Stop)
            }
            _ => {
                self.append_close(shape);
                self.depth -= 1;
                if self.depth == 1 {
                    self.finish_capture()?;
                }
                Ok(Flow::Continue)
            }
        }
    }
}

impl<C: ScalarConverter> LexSink for RecordBuilder<C> {
    type Error = ErrorSource;

    fn null(&mut self) -> Result<Flow, Self::Error> {
        self.on_scalar(Scalar::Null)
    }

    fn boolean(&mut self, value: bool) -> Result<Flow, Self::Error> {
        self.on_scalar(Scalar::Bool(value))
    }

    fn number(&mut self, lexeme: &str) -> Result<Flow, Self::Error> {
        self.on_scalar(Scalar::Number(lexeme))
    }

    fn string(&mut self, value: &str) -> Result<Flow, Self::Error> {
        self.on_scalar(Scalar::String(value))
    }

    fn map_key(&mut self, key: &str) -> Result<Flow, Self::Error> {
        match self.depth {
            0 => Err(RecordError::ValueAtTopLevel("key").into()),
            1 => {
                self.select(key)?;
                Ok(Flow::Continue)
            }
            _ => {
                self.append_key(key)?;
                Ok(Flow::Continue)
            }
        }
    }

    fn start_map(&mut self) -> Result<Flow, Self::Error> {
        self.on_open(ValueShape::Object)
    }

    fn end_map(&mut self) -> Result<Flow, Self::Error> {
        self.on_close(ValueShape::Object)
    }

    fn start_array(&mut self) -> Result<Flow, Self::Error> {
        self.on_open(ValueShape::Array)
    }

    fn end_array(&mut self) -> Result<Flow, Self::Error> {
        self.on_close(ValueShape::Array)
    }
}
