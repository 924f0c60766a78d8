//! Decoding of `\uXXXX` escape sequences.
//!
//! [`UnicodeEscapeBuffer`] accumulates four ASCII hexadecimal digits and
//! yields the UTF-16 code unit they spell. Pairing of surrogates is the
//! lexer's job; see [`combine_surrogates`].

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EscapeError {
    NotHexDigit(u8),
}

/// Buffer for accumulating up to four hexadecimal digits.
#[derive(Debug, Default)]
pub(crate) struct UnicodeEscapeBuffer {
    value: u16,
    len: u8,
}

impl UnicodeEscapeBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears any accumulated digits.
    pub fn reset(&mut self) {
        self.value = 0;
        self.len = 0;
    }

    /// Feeds one byte.
    ///
    /// Returns `Ok(None)` while fewer than four digits have been seen and
    /// `Ok(Some(unit))` on the fourth, after which the buffer is reset.
    pub fn feed(&mut self, b: u8) -> Result<Option<u16>, EscapeError> {
        let digit = match b {
            b'0'..=b'9' => b - b'0',
            b'a'..=b'f' => b - b'a' + 10,
            b'A'..=b'F' => b - b'A' + 10,
            _ => return Err(EscapeError::NotHexDigit(b)),
        };
        self.value = (self.value << 4) | u16::from(digit);
        self.len += 1;

        if self.len == 4 {
            let unit = self.value;
            self.reset();
            Ok(Some(unit))
        } else {
            Ok(None)
        }
    }
}

pub(crate) fn is_high_surrogate(unit: u16) -> bool {
    (0xD800..=0xDBFF).contains(&unit)
}

pub(crate) fn is_low_surrogate(unit: u16) -> bool {
    (0xDC00..=0xDFFF).contains(&unit)
}

/// Combines a high and a low surrogate into a scalar value.
pub(crate) fn combine_surrogates(high: u16, low: u16) -> Option<char> {
    let code = 0x10000 + ((u32::from(high) - 0xD800) << 10) + (u32::from(low) - 0xDC00);
    char::from_u32(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_decoding() {
        let mut buf = UnicodeEscapeBuffer::new();
        assert_eq!(buf.feed(b'0'), Ok(None));
        assert_eq!(buf.feed(b'0'), Ok(None));
        assert_eq!(buf.feed(b'4'), Ok(None));
        assert_eq!(buf.feed(b'1'), Ok(Some(0x41)));
    }

    #[test]
    fn mixed_case_hex() {
        let mut buf = UnicodeEscapeBuffer::new();
        for b in *b"AbC" {
            assert_eq!(buf.feed(b), Ok(None));
        }
        assert_eq!(buf.feed(b'd'), Ok(Some(0xABCD)));
    }

    #[test]
    fn reset_clears_buffer() {
        let mut buf = UnicodeEscapeBuffer::new();
        assert_eq!(buf.feed(b'F'), Ok(None));
        buf.reset();
        for b in *b"004" {
            assert_eq!(buf.feed(b), Ok(None));
        }
        assert_eq!(buf.feed(b'2'), Ok(Some(0x42)));
    }

    #[test]
    fn invalid_hex_error() {
        let mut buf = UnicodeEscapeBuffer::new();
        assert_eq!(buf.feed(b'G'), Err(EscapeError::NotHexDigit(b'G')));
    }

    #[test]
    fn surrogate_pair() {
        assert!(is_high_surrogate(0xD83D));
        assert!(is_low_surrogate(0xDE00));
        assert_eq!(combine_surrogates(0xD83D, 0xDE00), Some('😀'));
    }
}
