//! Target record shape.
//!
//! A [`Schema`] is the read-only description of the records a session
//! produces: an ordered list of [`Column`]s, each with a name, a
//! [`ColumnKind`] and a flag telling whether the query projects it. A schema
//! is built once per table binding and shared (usually behind an `Arc`) by
//! every parse session against that table.
//!
//! # Examples
//!
//! ```
//! use recordmodem::{Column, ScalarType, Schema};
//!
//! let schema = Schema::new(
//!     "zips",
//!     vec![
//!         Column::scalar("city", ScalarType::Text),
//!         Column::scalar("pop", ScalarType::Int4),
//!         Column::array("loc", ScalarType::Float8),
//!         Column::structured("meta"),
//!     ],
//! );
//! assert_eq!(schema.column_index("pop"), Some(1));
//! assert_eq!(schema.column_index("POP"), None);
//! ```
use core::fmt;

/// Added to packed numeric precision and scale, as PostgreSQL does.
pub(crate) const NUMERIC_MODIFIER_OFFSET: i32 = 4;

/// Scalar value types understood by the conversion layer.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Bool,
    /// 16-bit integer.
    Int2,
    /// 32-bit integer.
    Int4,
    /// 64-bit integer.
    Int8,
    /// Single precision float.
    Float4,
    /// Double precision float.
    Float8,
    /// Arbitrary precision decimal, kept as validated text. The type
    /// modifier packs precision and scale; see
    /// [`ScalarType::numeric_type_modifier`].
    Numeric,
    Text,
    /// Variable length text bounded by the type modifier.
    Varchar,
    /// Blank padded text of the length given by the type modifier.
    Bpchar,
    /// JSON document text.
    Json,
    /// Date and time text. The type modifier is the number of fractional
    /// second digits kept.
    Timestamp,
    /// Like [`ScalarType::Timestamp`], with a time zone.
    TimestampTz,
    /// Time span text. The low 16 bits of the type modifier give the
    /// fractional second digits, `0xFFFF` meaning unrestricted.
    Interval,
}

impl ScalarType {
    /// Returns `true` for fixed-size integer types.
    ///
    /// Remote engines may render these as floating literals (`3.0`); the
    /// record builder trims the trailing `.0` before conversion.
    #[must_use]
    pub fn is_fixed_size_integer(self) -> bool {
        matches!(self, Self::Int2 | Self::Int4 | Self::Int8)
    }

    /// Returns `true` when conversion of this type consumes the column's type
    /// modifier.
    #[must_use]
    pub fn takes_type_modifier(self) -> bool {
        matches!(
            self,
            Self::Numeric
                | Self::Varchar
                | Self::Bpchar
                | Self::Timestamp
                | Self::TimestampTz
                | Self::Interval
        )
    }

    /// Packs `numeric(precision, scale)` into a type modifier, in the same
    /// layout as PostgreSQL's `atttypmod`.
    ///
    /// ```
    /// use recordmodem::ScalarType;
    ///
    /// assert_eq!(ScalarType::numeric_type_modifier(10, 2), 655_366);
    /// ```
    #[must_use]
    pub fn numeric_type_modifier(precision: u16, scale: u16) -> i32 {
        ((i32::from(precision) << 16) | i32::from(scale)) + NUMERIC_MODIFIER_OFFSET
    }

    /// SQL-ish name used in diagnostics and conversion errors.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "boolean",
            Self::Int2 => "smallint",
            Self::Int4 => "integer",
            Self::Int8 => "bigint",
            Self::Float4 => "real",
            Self::Float8 => "double precision",
            Self::Numeric => "numeric",
            Self::Text => "text",
            Self::Varchar => "character varying",
            Self::Bpchar => "character",
            Self::Json => "json",
            Self::Timestamp => "timestamp without time zone",
            Self::TimestampTz => "timestamp with time zone",
            Self::Interval => "interval",
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The value space of a column.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// A single typed value.
    Scalar {
        ty: ScalarType,
        type_modifier: Option<i32>,
    },
    /// A homogeneous sequence; JSON arrays are reserialized into array
    /// literal syntax (`{1,2,3}`) and handed to the converter.
    Array { element: ScalarType },
    /// Arbitrary nested JSON retained as opaque compact text.
    Structured,
}

/// One column of a [`Schema`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
    /// Whether the query projects this column. Unused columns are always
    /// null and their values are never converted.
    pub used: bool,
}

impl Column {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
            used: true,
        }
    }

    /// A scalar column without a type modifier.
    #[must_use]
    pub fn scalar(name: impl Into<String>, ty: ScalarType) -> Self {
        Self::new(
            name,
            ColumnKind::Scalar {
                ty,
                type_modifier: None,
            },
        )
    }

    #[must_use]
    pub fn array(name: impl Into<String>, element: ScalarType) -> Self {
        Self::new(name, ColumnKind::Array { element })
    }

    #[must_use]
    pub fn structured(name: impl Into<String>) -> Self {
        Self::new(name, ColumnKind::Structured)
    }

    /// Sets the type modifier of a scalar column. Has no effect on array or
    /// structured columns.
    #[must_use]
    pub fn with_type_modifier(mut self, modifier: i32) -> Self {
        if let ColumnKind::Scalar { type_modifier, .. } = &mut self.kind {
            *type_modifier = Some(modifier);
        }
        self
    }

    /// Marks the column as not projected by the query.
    #[must_use]
    pub fn unused(mut self) -> Self {
        self.used = false;
        self
    }
}

/// Immutable, ordered description of a table's columns.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    table: String,
    columns: Vec<Column>,
}

impl Schema {
    #[must_use]
    pub fn new(table: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            table: table.into(),
            columns,
        }
    }

    /// Name of the table, attached to conversion errors.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    #[must_use]
    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Index of the first column whose name equals `name` exactly
    /// (case-sensitive).
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }
}
