use crate::value::TypedValue;

/// One flattened output row.
///
/// Slots are indexed by column position in the [`Schema`](crate::Schema);
/// `None` is SQL null.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    values: Vec<Option<TypedValue>>,
}

impl Record {
    #[must_use]
    pub fn new(values: Vec<Option<TypedValue>>) -> Self {
        Self { values }
    }

    /// Value of column `index`, or `None` when it is null or out of range.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&TypedValue> {
        self.values.get(index).and_then(Option::as_ref)
    }

    #[must_use]
    pub fn is_null(&self, index: usize) -> bool {
        self.get(index).is_none()
    }

    #[must_use]
    pub fn values(&self) -> &[Option<TypedValue>] {
        &self.values
    }

    #[must_use]
    pub fn into_values(self) -> Vec<Option<TypedValue>> {
        self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Result of one [`RecordParser::parse`](crate::RecordParser::parse) pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseOutcome {
    /// The buffer was consumed and no record has begun.
    NoRecord,
    /// The buffer was consumed mid-record.
    RecordStarted,
    /// A record is ready. Materialize and reset before parsing again.
    RecordComplete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub outcome: ParseOutcome,
    /// Offset into the buffer at which the next pass must resume.
    pub offset: usize,
}

/// Lifecycle of a parse session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    AwaitingRecord,
    InRecord,
    RecordReady,
    Closed,
}
