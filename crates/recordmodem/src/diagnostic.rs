//! Recoverable conditions reported alongside parsed records.
use core::fmt;

/// Shape of the JSON value that reached a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueShape {
    Object,
    Array,
}

impl ValueShape {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Object => "object",
            Self::Array => "array",
        }
    }
}

impl fmt::Display for ValueShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A column declared `declared` received a nested value of shape
    /// `received`. The value was kept as JSON text.
    KindMismatch {
        column: String,
        declared: &'static str,
        received: ValueShape,
    },
}

/// A warning raised while parsing. Emitted at most once per session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub table: String,
    pub kind: DiagnosticKind,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DiagnosticKind::KindMismatch {
                column,
                declared,
                received,
            } => write!(
                f,
                "column {column} of table {}: {declared} declared but {received} value received",
                self.table
            ),
        }
    }
}
