/// Configuration options for a record parsing session.
///
/// # Examples
///
/// ```rust
/// use recordmodem::ParserOptions;
///
/// let options = ParserOptions {
///     reject_unknown_fields: true,
///     max_depth: Some(64),
///     ..Default::default()
/// };
/// assert!(options.integer_fraction_fixup);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserOptions {
    /// Whether to trim a trailing `.0` from numbers bound to fixed-size
    /// integer columns before conversion.
    ///
    /// Remote engines often render integers as floating literals (`3.0`).
    /// Only an exact `.0` suffix is removed; `3.5` still reaches the
    /// converter and fails.
    ///
    /// # Default
    ///
    /// `true`
    pub integer_fraction_fixup: bool,

    /// Whether an object key with no matching column aborts the session.
    ///
    /// When `false`, values of unknown fields are skipped, which supports
    /// projections whose result shape differs from the table.
    ///
    /// # Default
    ///
    /// `false`
    pub reject_unknown_fields: bool,

    /// Maximum nesting of objects and arrays, counting the record object.
    ///
    /// # Default
    ///
    /// `None` (unbounded)
    pub max_depth: Option<usize>,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            integer_fraction_fixup: true,
            reject_unknown_fields: false,
            max_depth: None,
        }
    }
}

/// Configuration for [`RecordReader`](crate::RecordReader).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderOptions {
    /// Size of the read buffer handed to the transport.
    ///
    /// # Default
    ///
    /// `65536`
    pub buffer_size: usize,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            buffer_size: 64 * 1024,
        }
    }
}
