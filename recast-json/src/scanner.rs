//! Low-level JSON scanner producing spanned tokens from an in-memory buffer.
//!
//! The scanner only tokenizes; nesting rules (comma/colon placement, balanced
//! delimiters) are enforced by the deserializer driver. String content is
//! decoded here, borrowing from the input when no escapes are present.

use alloc::borrow::Cow;
use alloc::string::String;

/// Byte range of a token in the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// Byte offset of the token's first byte.
    pub offset: usize,
    /// Length of the token in bytes.
    pub len: usize,
}

/// Hint about a number literal's format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberHint {
    /// No fraction, no exponent.
    Integer,
    /// Has a `.` or an `e`/`E` exponent.
    Float,
}

/// A decoded JSON token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'de> {
    /// `{`
    ObjectStart,
    /// `}`
    ObjectEnd,
    /// `[`
    ArrayStart,
    /// `]`
    ArrayEnd,
    /// `:`
    Colon,
    /// `,`
    Comma,
    /// `null`
    Null,
    /// `true`
    True,
    /// `false`
    False,
    /// String literal, escapes already processed.
    String(Cow<'de, str>),
    /// Number literal, kept raw; parsed by the target type.
    Number {
        /// The raw literal text.
        raw: &'de str,
        /// Integer/float classification.
        hint: NumberHint,
    },
    /// End of input.
    Eof,
}

impl Token<'_> {
    /// Short description for "unexpected token" diagnostics.
    pub fn description(&self) -> &'static str {
        match self {
            Token::ObjectStart => "`{`",
            Token::ObjectEnd => "`}`",
            Token::ArrayStart => "`[`",
            Token::ArrayEnd => "`]`",
            Token::Colon => "`:`",
            Token::Comma => "`,`",
            Token::Null => "`null`",
            Token::True | Token::False => "a boolean",
            Token::String(_) => "a string",
            Token::Number { .. } => "a number",
            Token::Eof => "end of input",
        }
    }
}

/// A token together with its source span.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken<'de> {
    /// The token.
    pub token: Token<'de>,
    /// Where it sits in the input.
    pub span: Span,
}

/// Scanner error.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanError {
    /// The error kind.
    pub kind: ScanErrorKind,
    /// Source span.
    pub span: Span,
}

/// Specific scanner error kinds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScanErrorKind {
    /// A byte that cannot start or continue any token.
    UnexpectedChar(char),
    /// Input ended mid-token.
    UnexpectedEof(&'static str),
    /// Malformed `\` escape or `\u` sequence.
    InvalidEscape,
    /// Malformed number literal.
    InvalidNumber,
}

impl core::fmt::Display for ScanErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ScanErrorKind::UnexpectedChar(ch) => write!(f, "unexpected character `{ch}`"),
            ScanErrorKind::UnexpectedEof(expected) => {
                write!(f, "unexpected end of input, expected {expected}")
            }
            ScanErrorKind::InvalidEscape => write!(f, "invalid escape sequence"),
            ScanErrorKind::InvalidNumber => write!(f, "malformed number literal"),
        }
    }
}

/// Single-pass tokenizer over a UTF-8 input buffer.
pub struct Scanner<'de> {
    input: &'de str,
    pos: usize,
}

impl<'de> Scanner<'de> {
    pub fn new(input: &'de str) -> Self {
        Scanner { input, pos: 0 }
    }

    /// Read the next token without consuming it.
    pub fn peek_token(&mut self) -> Result<SpannedToken<'de>, ScanError> {
        let saved = self.pos;
        let token = self.next_token();
        self.pos = saved;
        token
    }

    /// Read and consume the next token.
    pub fn next_token(&mut self) -> Result<SpannedToken<'de>, ScanError> {
        self.skip_whitespace();
        let start = self.pos;
        let bytes = self.input.as_bytes();

        let Some(&byte) = bytes.get(self.pos) else {
            return Ok(SpannedToken {
                token: Token::Eof,
                span: Span { offset: start, len: 0 },
            });
        };

        let token = match byte {
            b'{' => self.punct(Token::ObjectStart),
            b'}' => self.punct(Token::ObjectEnd),
            b'[' => self.punct(Token::ArrayStart),
            b']' => self.punct(Token::ArrayEnd),
            b':' => self.punct(Token::Colon),
            b',' => self.punct(Token::Comma),
            b'n' => self.keyword("null", Token::Null)?,
            b't' => self.keyword("true", Token::True)?,
            b'f' => self.keyword("false", Token::False)?,
            b'"' => self.string()?,
            b'-' | b'0'..=b'9' => self.number()?,
            _ => {
                let ch = self.input[self.pos..]
                    .chars()
                    .next()
                    .unwrap_or(char::REPLACEMENT_CHARACTER);
                return Err(self.error_at(start, ScanErrorKind::UnexpectedChar(ch)));
            }
        };

        Ok(SpannedToken {
            token,
            span: Span {
                offset: start,
                len: self.pos - start,
            },
        })
    }

    fn skip_whitespace(&mut self) {
        let bytes = self.input.as_bytes();
        while let Some(&b) = bytes.get(self.pos) {
            if matches!(b, b' ' | b'\t' | b'\n' | b'\r') {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn punct(&mut self, token: Token<'de>) -> Token<'de> {
        self.pos += 1;
        token
    }

    fn keyword(&mut self, word: &'static str, token: Token<'de>) -> Result<Token<'de>, ScanError> {
        let end = self.pos + word.len();
        if self.input.get(self.pos..end) == Some(word) {
            self.pos = end;
            Ok(token)
        } else if end > self.input.len() {
            Err(self.error_at(self.pos, ScanErrorKind::UnexpectedEof(word)))
        } else {
            let ch = self.input[self.pos..]
                .chars()
                .next()
                .unwrap_or(char::REPLACEMENT_CHARACTER);
            Err(self.error_at(self.pos, ScanErrorKind::UnexpectedChar(ch)))
        }
    }

    fn string(&mut self) -> Result<Token<'de>, ScanError> {
        let start = self.pos;
        self.pos += 1; // opening quote
        let bytes = self.input.as_bytes();
        let content_start = self.pos;

        // Fast path: scan for the closing quote; fall back to decoding only
        // when an escape shows up.
        loop {
            match bytes.get(self.pos) {
                None => return Err(self.error_at(start, ScanErrorKind::UnexpectedEof("`\"`"))),
                Some(b'"') => {
                    let content = &self.input[content_start..self.pos];
                    self.pos += 1;
                    return Ok(Token::String(Cow::Borrowed(content)));
                }
                Some(b'\\') => break,
                Some(_) => self.pos += 1,
            }
        }

        // Slow path: materialize with escapes decoded.
        let mut decoded = String::from(&self.input[content_start..self.pos]);
        loop {
            match bytes.get(self.pos) {
                None => return Err(self.error_at(start, ScanErrorKind::UnexpectedEof("`\"`"))),
                Some(b'"') => {
                    self.pos += 1;
                    return Ok(Token::String(Cow::Owned(decoded)));
                }
                Some(b'\\') => {
                    self.pos += 1;
                    let escape = *bytes
                        .get(self.pos)
                        .ok_or_else(|| self.error_at(start, ScanErrorKind::UnexpectedEof("`\"`")))?;
                    self.pos += 1;
                    match escape {
                        b'"' => decoded.push('"'),
                        b'\\' => decoded.push('\\'),
                        b'/' => decoded.push('/'),
                        b'b' => decoded.push('\u{0008}'),
                        b'f' => decoded.push('\u{000C}'),
                        b'n' => decoded.push('\n'),
                        b'r' => decoded.push('\r'),
                        b't' => decoded.push('\t'),
                        b'u' => {
                            let ch = self.unicode_escape()?;
                            decoded.push(ch);
                        }
                        _ => return Err(self.error_at(self.pos - 1, ScanErrorKind::InvalidEscape)),
                    }
                }
                Some(_) => {
                    let ch_start = self.pos;
                    let ch = self.input[ch_start..]
                        .chars()
                        .next()
                        .unwrap_or(char::REPLACEMENT_CHARACTER);
                    self.pos += ch.len_utf8();
                    decoded.push(ch);
                }
            }
        }
    }

    /// Decode the four hex digits after `\u`, pairing surrogates.
    fn unicode_escape(&mut self) -> Result<char, ScanError> {
        let unit = self.hex4()?;
        if (0xD800..0xDC00).contains(&unit) {
            // High surrogate: a `\uXXXX` low surrogate must follow.
            let bytes = self.input.as_bytes();
            if bytes.get(self.pos) != Some(&b'\\') || bytes.get(self.pos + 1) != Some(&b'u') {
                return Err(self.error_at(self.pos, ScanErrorKind::InvalidEscape));
            }
            self.pos += 2;
            let low = self.hex4()?;
            if !(0xDC00..0xE000).contains(&low) {
                return Err(self.error_at(self.pos, ScanErrorKind::InvalidEscape));
            }
            let combined = 0x10000 + ((unit as u32 - 0xD800) << 10) + (low as u32 - 0xDC00);
            char::from_u32(combined).ok_or_else(|| self.error_at(self.pos, ScanErrorKind::InvalidEscape))
        } else if (0xDC00..0xE000).contains(&unit) {
            // Unpaired low surrogate.
            Err(self.error_at(self.pos, ScanErrorKind::InvalidEscape))
        } else {
            char::from_u32(unit as u32).ok_or_else(|| self.error_at(self.pos, ScanErrorKind::InvalidEscape))
        }
    }

    fn hex4(&mut self) -> Result<u16, ScanError> {
        let end = self.pos + 4;
        let digits = self
            .input
            .get(self.pos..end)
            .ok_or_else(|| self.error_at(self.pos, ScanErrorKind::UnexpectedEof("four hex digits")))?;
        let unit = u16::from_str_radix(digits, 16)
            .map_err(|_| self.error_at(self.pos, ScanErrorKind::InvalidEscape))?;
        self.pos = end;
        Ok(unit)
    }

    fn number(&mut self) -> Result<Token<'de>, ScanError> {
        let start = self.pos;
        let bytes = self.input.as_bytes();
        let mut hint = NumberHint::Integer;

        if bytes.get(self.pos) == Some(&b'-') {
            self.pos += 1;
        }
        let int_digits = self.digits();
        if int_digits == 0 {
            return Err(self.error_at(start, ScanErrorKind::InvalidNumber));
        }
        if bytes.get(self.pos) == Some(&b'.') {
            hint = NumberHint::Float;
            self.pos += 1;
            if self.digits() == 0 {
                return Err(self.error_at(start, ScanErrorKind::InvalidNumber));
            }
        }
        if matches!(bytes.get(self.pos), Some(b'e' | b'E')) {
            hint = NumberHint::Float;
            self.pos += 1;
            if matches!(bytes.get(self.pos), Some(b'+' | b'-')) {
                self.pos += 1;
            }
            if self.digits() == 0 {
                return Err(self.error_at(start, ScanErrorKind::InvalidNumber));
            }
        }

        Ok(Token::Number {
            raw: &self.input[start..self.pos],
            hint,
        })
    }

    fn digits(&mut self) -> usize {
        let bytes = self.input.as_bytes();
        let start = self.pos;
        while matches!(bytes.get(self.pos), Some(b'0'..=b'9')) {
            self.pos += 1;
        }
        self.pos - start
    }

    fn error_at(&self, offset: usize, kind: ScanErrorKind) -> ScanError {
        let len = if self.pos > offset { self.pos - offset } else { 1 };
        ScanError {
            kind,
            span: Span { offset, len },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token<'_>> {
        let mut scanner = Scanner::new(input);
        let mut out = Vec::new();
        loop {
            let st = scanner.next_token().unwrap();
            let done = st.token == Token::Eof;
            out.push(st.token);
            if done {
                return out;
            }
        }
    }

    #[test]
    fn scans_structural_tokens_and_literals() {
        assert_eq!(
            tokens(r#"{"a": [1, -2.5, true, null]}"#),
            vec![
                Token::ObjectStart,
                Token::String(Cow::Borrowed("a")),
                Token::Colon,
                Token::ArrayStart,
                Token::Number { raw: "1", hint: NumberHint::Integer },
                Token::Comma,
                Token::Number { raw: "-2.5", hint: NumberHint::Float },
                Token::Comma,
                Token::True,
                Token::Comma,
                Token::Null,
                Token::ArrayEnd,
                Token::ObjectEnd,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn borrows_strings_without_escapes() {
        let mut scanner = Scanner::new(r#""plain""#);
        match scanner.next_token().unwrap().token {
            Token::String(Cow::Borrowed(s)) => assert_eq!(s, "plain"),
            other => panic!("expected borrowed string, got {other:?}"),
        }
    }

    #[test]
    fn decodes_escapes_and_surrogate_pairs() {
        let mut scanner = Scanner::new(r#""a\nbé😀""#);
        match scanner.next_token().unwrap().token {
            Token::String(s) => assert_eq!(s, "a\nb\u{e9}\u{1F600}"),
            other => panic!("expected string, got {other:?}"),
        }
    }

    #[test]
    fn exponent_forces_float_hint() {
        let mut scanner = Scanner::new("1e3");
        match scanner.next_token().unwrap().token {
            Token::Number { hint, raw } => {
                assert_eq!(hint, NumberHint::Float);
                assert_eq!(raw, "1e3");
            }
            other => panic!("expected number, got {other:?}"),
        }
    }

    #[test]
    fn rejects_bare_minus_and_dangling_fraction() {
        assert!(Scanner::new("-").next_token().is_err());
        assert!(Scanner::new("1.").next_token().is_err());
    }

    #[test]
    fn unterminated_string_reports_eof() {
        let err = Scanner::new("\"abc").next_token().unwrap_err();
        assert!(matches!(err.kind, ScanErrorKind::UnexpectedEof(_)));
    }

    #[test]
    fn spans_track_byte_offsets() {
        let mut scanner = Scanner::new("  true");
        let st = scanner.next_token().unwrap();
        assert_eq!(st.span, Span { offset: 2, len: 4 });
    }

    #[test]
    fn peek_does_not_consume() {
        let mut scanner = Scanner::new("42");
        let peeked = scanner.peek_token().unwrap();
        let consumed = scanner.next_token().unwrap();
        assert_eq!(peeked, consumed);
        assert_eq!(scanner.next_token().unwrap().token, Token::Eof);
    }
}
