//! Typed column values and text escaping helpers.
//!
//! This module defines [`TypedValue`], the result of converting a column's
//! text through a [`ScalarConverter`](crate::ScalarConverter), and the two
//! escaping routines used when nested content is reserialized: compact JSON
//! string escaping and array literal element quoting.
use core::fmt::{self, Write};

/// A converted, non-null column value.
///
/// Null is represented outside of this type, as `None` in a record slot.
///
/// # Examples
///
/// ```
/// use recordmodem::TypedValue;
///
/// assert_eq!(TypedValue::Int4(3).to_string(), "3");
/// assert_eq!(
///     TypedValue::Array(vec![Some(TypedValue::Int4(1)), None]).to_string(),
///     "{1,NULL}"
/// );
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub enum TypedValue {
    Bool(bool),
    Int2(i16),
    Int4(i32),
    Int8(i64),
    Float4(f32),
    Float8(f64),
    /// Validated decimal text.
    Numeric(String),
    Text(String),
    /// Compact JSON text, stored without further parsing.
    Json(String),
    Array(Vec<Option<TypedValue>>),
}

impl TypedValue {
    /// Returns the text of a `Text`, `Numeric` or `Json` value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) | Self::Numeric(s) | Self::Json(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypedValue::Bool(b) => f.write_str(if *b { "true" } else { "false" }),
            TypedValue::Int2(n) => write!(f, "{n}"),
            TypedValue::Int4(n) => write!(f, "{n}"),
            TypedValue::Int8(n) => write!(f, "{n}"),
            TypedValue::Float4(n) => write!(f, "{n}"),
            TypedValue::Float8(n) => write!(f, "{n}"),
            TypedValue::Numeric(s) | TypedValue::Text(s) | TypedValue::Json(s) => f.write_str(s),
            TypedValue::Array(items) => {
                f.write_char('{')?;
                let mut first = true;
                for item in items {
                    if !first {
                        f.write_char(',')?;
                    }
                    first = false;
                    match item {
                        None => f.write_str("NULL")?,
                        Some(v @ (TypedValue::Text(_) | TypedValue::Json(_))) => {
                            f.write_char('"')?;
                            write_array_escaped(&v.to_string(), f)?;
                            f.write_char('"')?;
                        }
                        Some(v) => write!(f, "{v}")?,
                    }
                }
                f.write_char('}')
            }
        }
    }
}

const HEX: &[u8; 16] = b"0123456789abcdef";

/// Escapes a string for inclusion in a compact JSON string literal.
///
/// The output matches `serde_json`'s compact serializer: `"` and `\` are
/// backslash-escaped, the five control characters with short forms use them,
/// and every other character below U+0020 becomes a lowercase `\u00xx`.
pub(crate) fn write_json_escaped<W: Write>(src: &str, f: &mut W) -> fmt::Result {
    let mut start = 0;
    for (i, b) in src.bytes().enumerate() {
        let short = match b {
            b'"' => "\\\"",
            b'\\' => "\\\\",
            b'\n' => "\\n",
            b'\r' => "\\r",
            b'\t' => "\\t",
            0x08 => "\\b",
            0x0C => "\\f",
            0x00..=0x1F => "",
            _ => continue,
        };
        f.write_str(&src[start..i])?;
        if short.is_empty() {
            f.write_str("\\u00")?;
            f.write_char(char::from(HEX[usize::from(b >> 4)]))?;
            f.write_char(char::from(HEX[usize::from(b & 0xF)]))?;
        } else {
            f.write_str(short)?;
        }
        start = i + 1;
    }
    f.write_str(&src[start..])
}

/// Escapes a string for inclusion inside a double-quoted array literal
/// element: only `"` and `\` need a backslash.
pub(crate) fn write_array_escaped<W: Write>(src: &str, f: &mut W) -> fmt::Result {
    for c in src.chars() {
        if matches!(c, '"' | '\\') {
            f.write_char('\\')?;
        }
        f.write_char(c)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn json(s: &str) -> String {
        let mut out = String::new();
        write_json_escaped(s, &mut out).unwrap();
        out
    }

    #[test]
    fn json_escaping_matches_serde_json() {
        for s in [
            "plain",
            "quote \" and \\ slash /",
            "tab\tnew\nline\r",
            "\u{0}\u{1}\u{8}\u{c}\u{1f}\u{7f}",
            "ünïcødé ✓ \u{2028}",
        ] {
            let expected = serde_json::to_string(s).unwrap();
            assert_eq!(format!("\"{}\"", json(s)), expected, "input {s:?}");
        }
    }

    #[test]
    fn array_escaping() {
        let mut out = String::new();
        write_array_escaped(r#"a "b" \c"#, &mut out).unwrap();
        assert_eq!(out, r#"a \"b\" \\c"#);
    }

    #[test]
    fn display_nested_array() {
        let v = TypedValue::Array(vec![
            Some(TypedValue::Array(vec![Some(TypedValue::Text("a b".into()))])),
            Some(TypedValue::Array(vec![None])),
        ]);
        assert_eq!(v.to_string(), r#"{{"a b"},{NULL}}"#);
    }
}
