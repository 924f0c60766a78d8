//! Text to typed value conversion.
//!
//! The record builder never interprets literal text itself. Every scalar it
//! binds to a column, and every array literal it reserializes, is handed to a
//! [`ScalarConverter`] supplied by the runtime's type system. [`StdConverter`]
//! is the reference implementation used by default and in tests.
use thiserror::Error;

use crate::{ScalarType, TypedValue, schema::NUMERIC_MODIFIER_OFFSET};

/// The text was not a valid literal for the requested type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    #[error("invalid input syntax for type {ty}: \"{text}\"")]
    InvalidSyntax { ty: ScalarType, text: String },
    #[error("value \"{text}\" is out of range for type {ty}")]
    OutOfRange { ty: ScalarType, text: String },
    #[error("value too long for type {ty}({limit})")]
    TooLong { ty: ScalarType, limit: i32 },
    #[error("malformed array literal: \"{text}\": {reason}")]
    MalformedArray { text: String, reason: &'static str },
}

/// Capability converting literal text into a [`TypedValue`].
///
/// Implementations may keep state (caches, allocators); the parser owns its
/// converter exclusively for the lifetime of a session.
pub trait ScalarConverter {
    /// Convert the text of a scalar. `type_modifier` is only passed for types
    /// whose [`ScalarType::takes_type_modifier`] is true.
    ///
    /// # Errors
    ///
    /// Returns a [`ConversionError`] when `text` is not a valid literal for
    /// `ty`.
    fn convert(
        &mut self,
        ty: ScalarType,
        type_modifier: Option<i32>,
        text: &str,
    ) -> Result<TypedValue, ConversionError>;

    /// Convert array literal text (`{1,2,{3}}`) whose elements are of type
    /// `element`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConversionError`] when the literal is malformed or an
    /// element fails conversion.
    fn convert_array(
        &mut self,
        element: ScalarType,
        text: &str,
    ) -> Result<TypedValue, ConversionError>;
}

impl<C: ScalarConverter + ?Sized> ScalarConverter for &mut C {
    fn convert(
        &mut self,
        ty: ScalarType,
        type_modifier: Option<i32>,
        text: &str,
    ) -> Result<TypedValue, ConversionError> {
        (**self).convert(ty, type_modifier, text)
    }

    fn convert_array(
        &mut self,
        element: ScalarType,
        text: &str,
    ) -> Result<TypedValue, ConversionError> {
        (**self).convert_array(element, text)
    }
}

/// Reference converter with PostgreSQL-flavoured input rules.
///
/// - integers and floats accept surrounding whitespace,
/// - booleans accept `t/true/y/yes/on/1` and `f/false/n/no/off/0`, any case,
/// - `varchar(n)` rejects longer text, `bpchar(n)` blank-pads to `n`,
/// - `numeric(p,s)` rounds to `s` fraction digits and rejects values with
///   more than `p - s` integer digits,
/// - time types are kept as text, with fractional seconds truncated to the
///   modifier's digits,
/// - array literals use `{a,b}` syntax with `"` quoting and `NULL`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdConverter;

impl ScalarConverter for StdConverter {
    fn convert(
        &mut self,
        ty: ScalarType,
        type_modifier: Option<i32>,
        text: &str,
    ) -> Result<TypedValue, ConversionError> {
        match ty {
            ScalarType::Bool => parse_bool(text).map(TypedValue::Bool),
            ScalarType::Int2 => parse_int::<i16>(ty, text).map(TypedValue::Int2),
            ScalarType::Int4 => parse_int::<i32>(ty, text).map(TypedValue::Int4),
            ScalarType::Int8 => parse_int::<i64>(ty, text).map(TypedValue::Int8),
            ScalarType::Float4 => text
                .trim()
                .parse::<f32>()
                .map(TypedValue::Float4)
                .map_err(|_| invalid(ty, text)),
            ScalarType::Float8 => text
                .trim()
                .parse::<f64>()
                .map(TypedValue::Float8)
                .map_err(|_| invalid(ty, text)),
            ScalarType::Numeric => {
                let text = parse_numeric(text)?;
                match type_modifier {
                    Some(modifier) if modifier >= NUMERIC_MODIFIER_OFFSET => {
                        apply_numeric_modifier(&text, modifier).map(TypedValue::Numeric)
                    }
                    _ => Ok(TypedValue::Numeric(text)),
                }
            }
            ScalarType::Text => Ok(TypedValue::Text(text.into())),
            ScalarType::Varchar => {
                if let Some(limit) = type_modifier.filter(|m| *m >= 0) {
                    if text.chars().count() > limit as usize {
                        return Err(ConversionError::TooLong { ty, limit });
                    }
                }
                Ok(TypedValue::Text(text.into()))
            }
            ScalarType::Bpchar => {
                let Some(modifier) = type_modifier.filter(|m| *m >= 0) else {
                    return Ok(TypedValue::Text(text.into()));
                };
                let limit = modifier as usize;
                let trimmed = text.trim_end_matches(' ');
                let len = trimmed.chars().count();
                if len > limit {
                    return Err(ConversionError::TooLong {
                        ty,
                        limit: modifier,
                    });
                }
                let mut padded = String::with_capacity(trimmed.len() + limit - len);
                padded.push_str(trimmed);
                padded.extend(core::iter::repeat_n(' ', limit - len));
                Ok(TypedValue::Text(padded))
            }
            ScalarType::Json => Ok(TypedValue::Json(text.into())),
            ScalarType::Timestamp | ScalarType::TimestampTz | ScalarType::Interval => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    return Err(invalid(ty, text));
                }
                let digits = match (ty, type_modifier) {
                    (_, None) => None,
                    (ScalarType::Interval, Some(m)) if m & 0xFFFF == 0xFFFF => None,
                    (ScalarType::Interval, Some(m)) => Some(m & 0xFFFF),
                    (_, Some(m)) => Some(m),
                };
                let text = match digits.and_then(|d| usize::try_from(d).ok()) {
                    Some(d) => cap_fractional_seconds(trimmed, d),
                    None => trimmed.to_owned(),
                };
                Ok(TypedValue::Text(text))
            }
        }
    }

    fn convert_array(
        &mut self,
        element: ScalarType,
        text: &str,
    ) -> Result<TypedValue, ConversionError> {
        let mut reader = ArrayLiteral {
            text,
            pos: 0,
            element,
        };
        reader.skip_ws();
        let value = reader.parse_group(self)?;
        reader.skip_ws();
        if reader.pos != text.len() {
            return Err(reader.malformed("junk after closing right brace"));
        }
        Ok(value)
    }
}

fn invalid(ty: ScalarType, text: &str) -> ConversionError {
    ConversionError::InvalidSyntax {
        ty,
        text: text.into(),
    }
}

fn parse_bool(text: &str) -> Result<bool, ConversionError> {
    let t = text.trim();
    if ["t", "true", "y", "yes", "on", "1"]
        .iter()
        .any(|s| t.eq_ignore_ascii_case(s))
    {
        Ok(true)
    } else if ["f", "false", "n", "no", "off", "0"]
        .iter()
        .any(|s| t.eq_ignore_ascii_case(s))
    {
        Ok(false)
    } else {
        Err(invalid(ScalarType::Bool, text))
    }
}

fn parse_int<T>(ty: ScalarType, text: &str) -> Result<T, ConversionError>
where
    T: core::str::FromStr<Err = core::num::ParseIntError>,
{
    use core::num::IntErrorKind;

    text.trim().parse::<T>().map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => ConversionError::OutOfRange {
            ty,
            text: text.into(),
        },
        _ => invalid(ty, text),
    })
}

fn parse_numeric(text: &str) -> Result<String, ConversionError> {
    let t = text.trim();
    let digits = t.strip_prefix(['-', '+']).unwrap_or(t);
    let (mantissa, exponent) = match digits.find(['e', 'E']) {
        Some(i) => (&digits[..i], Some(&digits[i + 1..])),
        None => (digits, None),
    };
    let (int, frac) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let valid_mantissa = !(int.is_empty() && frac.is_empty())
        && int.bytes().all(|b| b.is_ascii_digit())
        && frac.bytes().all(|b| b.is_ascii_digit());
    let valid_exponent = exponent.is_none_or(|e| {
        let e = e.strip_prefix(['-', '+']).unwrap_or(e);
        !e.is_empty() && e.bytes().all(|b| b.is_ascii_digit())
    });
    if (valid_mantissa && valid_exponent) || t.eq_ignore_ascii_case("nan") {
        Ok(t.into())
    } else {
        Err(invalid(ScalarType::Numeric, text))
    }
}

/// Rounds decimal text half away from zero to the scale packed in
/// `modifier` and checks the precision.
fn apply_numeric_modifier(text: &str, modifier: i32) -> Result<String, ConversionError> {
    let overflow = || ConversionError::OutOfRange {
        ty: ScalarType::Numeric,
        text: text.into(),
    };
    if text.eq_ignore_ascii_case("nan") {
        return Ok(text.into());
    }
    let packed = modifier - NUMERIC_MODIFIER_OFFSET;
    let precision = i64::from((packed >> 16) & 0xFFFF);
    let scale_digits = packed & 0xFFFF;
    let scale = i64::from(scale_digits);

    let (negative, unsigned) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let (mantissa, exponent) = match unsigned.find(['e', 'E']) {
        Some(i) => (
            &unsigned[..i],
            unsigned[i + 1..].parse::<i64>().map_err(|_| overflow())?,
        ),
        None => (unsigned, 0),
    };
    let (int, frac) = mantissa.split_once('.').unwrap_or((mantissa, ""));

    // Significant digits, with the decimal point `point` digits from the left.
    let mut digits: Vec<u8> = int.bytes().chain(frac.bytes()).collect();
    let leading = digits.iter().take_while(|d| **d == b'0').count();
    digits.drain(..leading);
    let mut point = i64::try_from(int.len())
        .ok()
        .zip(i64::try_from(leading).ok())
        .and_then(|(int_len, leading)| (int_len - leading).checked_add(exponent))
        .ok_or_else(overflow)?;
    if digits.is_empty() {
        point = 0;
    }
    if point > precision {
        return Err(overflow());
    }

    // `scaled` holds the digits of round(value * 10^scale).
    let keep = point + scale;
    let mut scaled: Vec<u8> = Vec::new();
    let mut round_up = false;
    if let Ok(keep) = usize::try_from(keep) {
        scaled.extend(digits.iter().take(keep));
        scaled.resize(keep, b'0');
        round_up = digits.get(keep).is_some_and(|d| *d >= b'5');
    }
    if round_up {
        let mut carried = true;
        for d in scaled.iter_mut().rev() {
            if *d == b'9' {
                *d = b'0';
            } else {
                *d += 1;
                carried = false;
                break;
            }
        }
        if carried {
            scaled.insert(0, b'1');
        }
    }
    let leading = scaled.iter().take_while(|d| **d == b'0').count();
    scaled.drain(..leading);

    let int_digits = i64::try_from(scaled.len()).map_err(|_| overflow())? - scale;
    if int_digits > precision - scale {
        return Err(overflow());
    }
    let scale = usize::try_from(scale_digits).map_err(|_| overflow())?;

    let mut out = String::with_capacity(scaled.len() + 3);
    if negative && !scaled.is_empty() {
        out.push('-');
    }
    if scaled.len() <= scale {
        let mut padded = vec![b'0'; scale + 1 - scaled.len()];
        padded.extend_from_slice(&scaled);
        scaled = padded;
    }
    let (int, frac) = scaled.split_at(scaled.len() - scale);
    out.extend(int.iter().map(|d| char::from(*d)));
    if scale > 0 {
        out.push('.');
        out.extend(frac.iter().map(|d| char::from(*d)));
    }
    Ok(out)
}

/// Drops fractional second digits past `digits`. The fraction is the first
/// `.` after the first `:`.
fn cap_fractional_seconds(text: &str, digits: usize) -> String {
    let Some(colon) = text.find(':') else {
        return text.into();
    };
    let Some(dot) = text[colon..].find('.') else {
        return text.into();
    };
    let start = colon + dot + 1;
    let run = text[start..].bytes().take_while(u8::is_ascii_digit).count();
    if run <= digits {
        return text.into();
    }
    let keep_end = if digits == 0 { start - 1 } else { start + digits };
    let mut out = String::with_capacity(text.len());
    out.push_str(&text[..keep_end]);
    out.push_str(&text[start + run..]);
    out
}

/// Deepest nesting accepted in an array literal.
const MAX_DIMENSIONS: usize = 6;

#[derive(Debug, Clone, Copy)]
enum Expect {
    Element { first: bool },
    Separator,
}

fn push_item(groups: &mut [Vec<Option<TypedValue>>], item: Option<TypedValue>) {
    if let Some(group) = groups.last_mut() {
        group.push(item);
    }
}

/// Reader for array literal text.
struct ArrayLiteral<'a> {
    text: &'a str,
    pos: usize,
    element: ScalarType,
}

impl<'a> ArrayLiteral<'a> {
    fn malformed(&self, reason: &'static str) -> ConversionError {
        ConversionError::MalformedArray {
            text: self.text.into(),
            reason,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.text.as_bytes().get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    /// Reads one brace-delimited group, nested groups included.
    ///
    /// Nesting is tracked on an explicit stack and capped at
    /// `MAX_DIMENSIONS`.
    fn parse_group(&mut self, conv: &mut StdConverter) -> Result<TypedValue, ConversionError> {
        if self.peek() != Some(b'{') {
            return Err(self.malformed("array value must start with \"{\""));
        }
        self.pos += 1;
        let mut groups: Vec<Vec<Option<TypedValue>>> = vec![Vec::new()];
        let mut expect = Expect::Element { first: true };
        loop {
            self.skip_ws();
            match (expect, self.peek()) {
                (Expect::Element { first: true }, Some(b'}')) | (Expect::Separator, Some(b'}')) => {}
                (Expect::Element { .. }, Some(b'{')) => {
                    if groups.len() >= MAX_DIMENSIONS {
                        return Err(self.malformed("too many dimensions"));
                    }
                    self.pos += 1;
                    groups.push(Vec::new());
                    expect = Expect::Element { first: true };
                    continue;
                }
                (Expect::Element { .. }, Some(b'"')) => {
                    let text = self.parse_quoted()?;
                    let item = conv.convert(self.element, None, &text)?;
                    push_item(&mut groups, Some(item));
                    expect = Expect::Separator;
                    continue;
                }
                (Expect::Element { .. }, Some(b',' | b'}') | None) => {
                    return Err(self.malformed("unexpected delimiter"));
                }
                (Expect::Element { .. }, Some(_)) => {
                    let text = self.parse_unquoted();
                    let item = if text.eq_ignore_ascii_case("null") {
                        None
                    } else {
                        Some(conv.convert(self.element, None, text)?)
                    };
                    push_item(&mut groups, item);
                    expect = Expect::Separator;
                    continue;
                }
                (Expect::Separator, Some(b',')) => {
                    self.pos += 1;
                    expect = Expect::Element { first: false };
                    continue;
                }
                (Expect::Separator, _) => return Err(self.malformed("unexpected end of input")),
            }

            // Close the innermost group.
            self.pos += 1;
            let closed = TypedValue::Array(groups.pop().unwrap_or_default());
            if groups.is_empty() {
                return Ok(closed);
            }
            push_item(&mut groups, Some(closed));
            expect = Expect::Separator;
        }
    }

    fn parse_quoted(&mut self) -> Result<String, ConversionError> {
        // Skip the opening quote.
        self.pos += 1;
        let mut out = String::new();
        let mut chars = self.text[self.pos..].char_indices();
        while let Some((i, c)) = chars.next() {
            match c {
                '"' => {
                    self.pos += i + 1;
                    return Ok(out);
                }
                '\\' => match chars.next() {
                    Some((_, escaped)) => out.push(escaped),
                    None => break,
                },
                c => out.push(c),
            }
        }
        Err(self.malformed("unterminated quoted element"))
    }

    fn parse_unquoted(&mut self) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(|b| !matches!(b, b',' | b'}' | b'{' | b'"')) {
            self.pos += 1;
        }
        self.text[start..self.pos].trim_end()
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(ScalarType::Int2, "12", TypedValue::Int2(12))]
    #[case(ScalarType::Int4, " -7 ", TypedValue::Int4(-7))]
    #[case(ScalarType::Int8, "9007199254740993", TypedValue::Int8(9_007_199_254_740_993))]
    #[case(ScalarType::Float8, "2.5e3", TypedValue::Float8(2500.0))]
    #[case(ScalarType::Float4, "0.5", TypedValue::Float4(0.5))]
    #[case(ScalarType::Bool, "TRUE", TypedValue::Bool(true))]
    #[case(ScalarType::Bool, "off", TypedValue::Bool(false))]
    #[case(ScalarType::Numeric, "-12.50e2", TypedValue::Numeric("-12.50e2".into()))]
    #[case(ScalarType::Text, "", TypedValue::Text(String::new()))]
    #[case(ScalarType::Json, "{\"a\":1}", TypedValue::Json("{\"a\":1}".into()))]
    fn converts_valid_literals(
        #[case] ty: ScalarType,
        #[case] text: &str,
        #[case] expected: TypedValue,
    ) {
        assert_eq!(StdConverter.convert(ty, None, text), Ok(expected));
    }

    #[rstest]
    #[case(ScalarType::Int4, "3.5")]
    #[case(ScalarType::Int4, "abc")]
    #[case(ScalarType::Int2, "")]
    #[case(ScalarType::Bool, "maybe")]
    #[case(ScalarType::Numeric, "1.2.3")]
    #[case(ScalarType::Numeric, "e5")]
    #[case(ScalarType::Float8, "one")]
    fn rejects_invalid_literals(#[case] ty: ScalarType, #[case] text: &str) {
        assert!(matches!(
            StdConverter.convert(ty, None, text),
            Err(ConversionError::InvalidSyntax { .. })
        ));
    }

    #[test]
    fn integer_overflow_is_out_of_range() {
        assert_eq!(
            StdConverter.convert(ScalarType::Int2, None, "40000"),
            Err(ConversionError::OutOfRange {
                ty: ScalarType::Int2,
                text: "40000".into()
            })
        );
    }

    #[test]
    fn varchar_and_bpchar_modifiers() {
        assert_eq!(
            StdConverter.convert(ScalarType::Varchar, Some(3), "abcd"),
            Err(ConversionError::TooLong {
                ty: ScalarType::Varchar,
                limit: 3
            })
        );
        assert_eq!(
            StdConverter.convert(ScalarType::Varchar, Some(4), "abcd"),
            Ok(TypedValue::Text("abcd".into()))
        );
        assert_eq!(
            StdConverter.convert(ScalarType::Bpchar, Some(4), "ab"),
            Ok(TypedValue::Text("ab  ".into()))
        );
        assert_eq!(
            StdConverter.convert(ScalarType::Bpchar, Some(2), "ab   "),
            Ok(TypedValue::Text("ab".into()))
        );
    }

    #[rstest]
    #[case::rounds_half_up("1.239", 10, 2, "1.24")]
    #[case::rounds_negative("-1.235", 10, 2, "-1.24")]
    #[case::pads_scale("7", 5, 2, "7.00")]
    #[case::exponent("1.5e2", 5, 1, "150.0")]
    #[case::tiny_rounds_up("0.005", 10, 2, "0.01")]
    #[case::negative_zero("-0.001", 10, 2, "0.00")]
    #[case::integer_scale("2.5", 3, 0, "3")]
    #[case::nan("NaN", 3, 0, "NaN")]
    fn numeric_modifier_rounds_to_scale(
        #[case] text: &str,
        #[case] precision: u16,
        #[case] scale: u16,
        #[case] expected: &str,
    ) {
        let modifier = ScalarType::numeric_type_modifier(precision, scale);
        assert_eq!(
            StdConverter.convert(ScalarType::Numeric, Some(modifier), text),
            Ok(TypedValue::Numeric(expected.into()))
        );
    }

    #[rstest]
    #[case::too_many_digits("12345", 3, 0)]
    #[case::rounding_carries_over("99.995", 4, 2)]
    #[case::huge_exponent("1e400", 10, 2)]
    fn numeric_modifier_rejects_overflow(
        #[case] text: &str,
        #[case] precision: u16,
        #[case] scale: u16,
    ) {
        let modifier = ScalarType::numeric_type_modifier(precision, scale);
        assert_eq!(
            StdConverter.convert(ScalarType::Numeric, Some(modifier), text),
            Err(ConversionError::OutOfRange {
                ty: ScalarType::Numeric,
                text: text.into()
            })
        );
    }

    #[rstest]
    #[case::timestamp(ScalarType::Timestamp, Some(3), "2024-01-02 03:04:05.123456", "2024-01-02 03:04:05.123")]
    #[case::timestamptz(ScalarType::TimestampTz, Some(0), "2024-01-02 03:04:05.9+05:30", "2024-01-02 03:04:05+05:30")]
    #[case::short_fraction(ScalarType::Timestamp, Some(6), "2024-01-02 03:04:05.5", "2024-01-02 03:04:05.5")]
    #[case::no_modifier(ScalarType::Timestamp, None, " 2024-01-02 03:04:05.123456 ", "2024-01-02 03:04:05.123456")]
    #[case::interval(ScalarType::Interval, Some(2), "1 day 02:03:04.5678", "1 day 02:03:04.56")]
    #[case::interval_unrestricted(ScalarType::Interval, Some(0x7FFF_FFFF), "02:03:04.5678", "02:03:04.5678")]
    fn time_types_cap_fractional_seconds(
        #[case] ty: ScalarType,
        #[case] modifier: Option<i32>,
        #[case] text: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(
            StdConverter.convert(ty, modifier, text),
            Ok(TypedValue::Text(expected.into()))
        );
    }

    #[test]
    fn array_literals() {
        assert_eq!(
            StdConverter.convert_array(ScalarType::Int4, "{1,2,NULL}"),
            Ok(TypedValue::Array(vec![
                Some(TypedValue::Int4(1)),
                Some(TypedValue::Int4(2)),
                None
            ]))
        );
        assert_eq!(
            StdConverter.convert_array(ScalarType::Text, r#"{"a,b","q\"x",plain}"#),
            Ok(TypedValue::Array(vec![
                Some(TypedValue::Text("a,b".into())),
                Some(TypedValue::Text("q\"x".into())),
                Some(TypedValue::Text("plain".into())),
            ]))
        );
        assert_eq!(
            StdConverter.convert_array(ScalarType::Int8, "{{1},{}}"),
            Ok(TypedValue::Array(vec![
                Some(TypedValue::Array(vec![Some(TypedValue::Int8(1))])),
                Some(TypedValue::Array(vec![])),
            ]))
        );
        assert_eq!(
            StdConverter.convert_array(ScalarType::Int4, "{}"),
            Ok(TypedValue::Array(vec![]))
        );
    }

    #[rstest]
    #[case::trailing_comma("{1,}")]
    #[case::missing_comma("{1 {2}}")]
    #[case::unclosed("{{1},")]
    #[case::junk("{1}x")]
    #[case::no_brace("1,2")]
    fn rejects_malformed_array_literals(#[case] text: &str) {
        assert!(matches!(
            StdConverter.convert_array(ScalarType::Int4, text),
            Err(ConversionError::MalformedArray { .. })
        ));
    }

    #[test]
    fn array_nesting_is_capped() {
        let six = format!("{}7{}", "{".repeat(6), "}".repeat(6));
        let mut value = StdConverter.convert_array(ScalarType::Int4, &six).unwrap();
        for _ in 0..5 {
            let TypedValue::Array(mut items) = value else {
                panic!("expected an array");
            };
            assert_eq!(items.len(), 1);
            value = items.pop().flatten().unwrap();
        }
        assert_eq!(value, TypedValue::Array(vec![Some(TypedValue::Int4(7))]));

        let seven = format!("{}{}", "{".repeat(7), "}".repeat(7));
        assert!(matches!(
            StdConverter.convert_array(ScalarType::Int4, &seven),
            Err(ConversionError::MalformedArray { .. })
        ));

        let deep = format!("{}{}", "{".repeat(200_000), "}".repeat(200_000));
        assert!(matches!(
            StdConverter.convert_array(ScalarType::Int4, &deep),
            Err(ConversionError::MalformedArray { .. })
        ));
    }

    #[rstest]
    #[case("1,2")]
    #[case("{1,2")]
    #[case("{1,,2}")]
    #[case("{1} x")]
    #[case(r#"{"open}"#)]
    fn malformed_array_literals(#[case] text: &str) {
        assert!(matches!(
            StdConverter.convert_array(ScalarType::Int4, text),
            Err(ConversionError::MalformedArray { .. })
        ));
    }

    #[test]
    fn array_element_conversion_errors_propagate() {
        assert!(matches!(
            StdConverter.convert_array(ScalarType::Int4, "{1,x}"),
            Err(ConversionError::InvalidSyntax { .. })
        ));
    }
}
