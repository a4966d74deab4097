//! Deserialization driver and reader configuration.
//!
//! [`Deserializer::value`] is the single decision point for shape handling:
//! a natively accepted shape goes straight to the target type's constructor
//! (the coercion registry is not consulted on the matching path); a mismatch
//! resolves exactly one [`CoercionAction`] and executes it.

use alloc::borrow::Cow;
use alloc::string::String;
use std::sync::Arc;

use recast_core::{CoercionAction, Coercions, CoercionsBuilder, InputShape, LogicalType};

use crate::bind::FromJson;
use crate::error::{JsonError, JsonErrorKind, Location};
use crate::scanner::{NumberHint, ScanError, Scanner, SpannedToken, Token};
use crate::trace;

/// Streaming deserializer over an in-memory JSON document.
///
/// Holds the scanner, the input (for location reporting), and a shared handle
/// to the reader's immutable coercion registry.
pub struct Deserializer<'de> {
    input: &'de str,
    scanner: Scanner<'de>,
    coercions: Arc<Coercions>,
    /// Byte offset where the value currently being bound starts; errors
    /// raised by binding code point here.
    value_offset: usize,
}

impl<'de> Deserializer<'de> {
    pub(crate) fn new(input: &'de str, coercions: Arc<Coercions>) -> Self {
        Deserializer {
            input,
            scanner: Scanner::new(input),
            coercions,
            value_offset: 0,
        }
    }

    /// Deserialize the value at the current position into `T`.
    ///
    /// This is the coercion decision point described on the module. It is
    /// re-entered for every nested value (struct fields, array elements, map
    /// values), so configuration applies at every level of the document.
    pub fn value<T: FromJson>(&mut self) -> Result<T, JsonError> {
        let SpannedToken { token, span } = self.peek_token()?;
        self.value_offset = span.offset;

        let shape = match &token {
            Token::Null => {
                self.next_token()?;
                return T::null_value().ok_or_else(|| {
                    self.err(JsonErrorKind::NoNullRepresentation { target: T::NAME })
                });
            }
            Token::ObjectStart => InputShape::Object,
            Token::ArrayStart => InputShape::Array,
            Token::True | Token::False => InputShape::Boolean,
            Token::String(s) if s.is_empty() => InputShape::EmptyString,
            Token::String(_) => InputShape::String,
            Token::Number { hint: NumberHint::Integer, .. } => InputShape::Integer,
            Token::Number { .. } => InputShape::Float,
            Token::Eof => {
                return Err(self.err(JsonErrorKind::UnexpectedEof {
                    expected: "a JSON value",
                }));
            }
            other => {
                let got = other.description();
                self.next_token()?;
                return Err(self.err(JsonErrorKind::UnexpectedToken {
                    got,
                    expected: "a JSON value",
                }));
            }
        };

        if T::accepts(shape) {
            return T::build(self, shape);
        }

        let action = self
            .coercions
            .resolve(T::physical_key(), T::LOGICAL, shape);
        trace!(
            ty = T::NAME,
            ?shape,
            ?action,
            "coercing mismatched input shape"
        );
        match action {
            CoercionAction::Fail => Err(self.err(JsonErrorKind::InvalidShapeCoercion {
                target: T::NAME,
                shape,
            })),
            CoercionAction::AsNull => {
                self.skip_value()?;
                T::null_value().ok_or_else(|| {
                    self.err(JsonErrorKind::NoNullRepresentation { target: T::NAME })
                })
            }
            CoercionAction::AsEmpty => {
                self.skip_value()?;
                T::empty_value().ok_or_else(|| {
                    self.err(JsonErrorKind::NotEmptyConstructible {
                        target: T::NAME,
                        shape,
                    })
                })
            }
            CoercionAction::TryConvert => T::convert(self, shape),
        }
    }

    /// Drive an object: `f` is invoked once per key with the deserializer
    /// positioned on the key's value.
    pub fn object(
        &mut self,
        mut f: impl FnMut(&mut Self, &str) -> Result<(), JsonError>,
    ) -> Result<(), JsonError> {
        let open = self.next_token()?;
        if !matches!(open.token, Token::ObjectStart) {
            return Err(self.err_at(
                open.span.offset,
                JsonErrorKind::UnexpectedToken {
                    got: open.token.description(),
                    expected: "`{`",
                },
            ));
        }

        let mut first = true;
        loop {
            let st = self.next_token()?;
            match st.token {
                Token::ObjectEnd if first => return Ok(()),
                Token::String(key) => {
                    let colon = self.next_token()?;
                    if !matches!(colon.token, Token::Colon) {
                        return Err(self.err_at(
                            colon.span.offset,
                            JsonErrorKind::UnexpectedToken {
                                got: colon.token.description(),
                                expected: "`:`",
                            },
                        ));
                    }
                    f(self, &key)?;
                    let sep = self.next_token()?;
                    match sep.token {
                        Token::Comma => first = false,
                        Token::ObjectEnd => return Ok(()),
                        Token::Eof => {
                            return Err(self.err_at(
                                sep.span.offset,
                                JsonErrorKind::UnexpectedEof { expected: "`,` or `}`" },
                            ));
                        }
                        other => {
                            return Err(self.err_at(
                                sep.span.offset,
                                JsonErrorKind::UnexpectedToken {
                                    got: other.description(),
                                    expected: "`,` or `}`",
                                },
                            ));
                        }
                    }
                }
                Token::Eof => {
                    return Err(self.err_at(
                        st.span.offset,
                        JsonErrorKind::UnexpectedEof { expected: "`}`" },
                    ));
                }
                other => {
                    return Err(self.err_at(
                        st.span.offset,
                        JsonErrorKind::UnexpectedToken {
                            got: other.description(),
                            expected: if first { "a field name or `}`" } else { "a field name" },
                        },
                    ));
                }
            }
        }
    }

    /// Drive an array: `f` is invoked once per element.
    pub fn array(
        &mut self,
        mut f: impl FnMut(&mut Self) -> Result<(), JsonError>,
    ) -> Result<(), JsonError> {
        let open = self.next_token()?;
        if !matches!(open.token, Token::ArrayStart) {
            return Err(self.err_at(
                open.span.offset,
                JsonErrorKind::UnexpectedToken {
                    got: open.token.description(),
                    expected: "`[`",
                },
            ));
        }

        if matches!(self.peek_token()?.token, Token::ArrayEnd) {
            self.next_token()?;
            return Ok(());
        }
        loop {
            f(self)?;
            let sep = self.next_token()?;
            match sep.token {
                Token::Comma => {}
                Token::ArrayEnd => return Ok(()),
                Token::Eof => {
                    return Err(self.err_at(
                        sep.span.offset,
                        JsonErrorKind::UnexpectedEof { expected: "`]`" },
                    ));
                }
                other => {
                    return Err(self.err_at(
                        sep.span.offset,
                        JsonErrorKind::UnexpectedToken {
                            got: other.description(),
                            expected: "`,` or `]`",
                        },
                    ));
                }
            }
        }
    }

    /// Consume a string token and return its decoded content.
    pub fn string_value(&mut self) -> Result<Cow<'de, str>, JsonError> {
        let st = self.next_token()?;
        match st.token {
            Token::String(s) => Ok(s),
            other => Err(self.err_at(
                st.span.offset,
                JsonErrorKind::UnexpectedToken {
                    got: other.description(),
                    expected: "a string",
                },
            )),
        }
    }

    /// Consume a number token and return its raw literal text plus hint.
    pub fn number_raw(&mut self) -> Result<(&'de str, NumberHint), JsonError> {
        let st = self.next_token()?;
        match st.token {
            Token::Number { raw, hint } => Ok((raw, hint)),
            other => Err(self.err_at(
                st.span.offset,
                JsonErrorKind::UnexpectedToken {
                    got: other.description(),
                    expected: "a number",
                },
            )),
        }
    }

    /// Consume a boolean token.
    pub fn bool_value(&mut self) -> Result<bool, JsonError> {
        let st = self.next_token()?;
        match st.token {
            Token::True => Ok(true),
            Token::False => Ok(false),
            other => Err(self.err_at(
                st.span.offset,
                JsonErrorKind::UnexpectedToken {
                    got: other.description(),
                    expected: "a boolean",
                },
            )),
        }
    }

    /// Consume and discard one whole value, however deeply nested.
    pub fn skip_value(&mut self) -> Result<(), JsonError> {
        let st = self.next_token()?;
        match st.token {
            Token::ObjectStart | Token::ArrayStart => {
                let mut depth = 1usize;
                while depth > 0 {
                    let inner = self.next_token()?;
                    match inner.token {
                        Token::ObjectStart | Token::ArrayStart => depth += 1,
                        Token::ObjectEnd | Token::ArrayEnd => depth -= 1,
                        Token::Eof => {
                            return Err(self.err_at(
                                inner.span.offset,
                                JsonErrorKind::UnexpectedEof {
                                    expected: "a closing delimiter",
                                },
                            ));
                        }
                        _ => {}
                    }
                }
                Ok(())
            }
            Token::Null
            | Token::True
            | Token::False
            | Token::String(_)
            | Token::Number { .. } => Ok(()),
            Token::Eof => Err(self.err_at(
                st.span.offset,
                JsonErrorKind::UnexpectedEof { expected: "a JSON value" },
            )),
            other => Err(self.err_at(
                st.span.offset,
                JsonErrorKind::UnexpectedToken {
                    got: other.description(),
                    expected: "a JSON value",
                },
            )),
        }
    }

    /// Error constructor for `TryConvert` fallbacks that cannot interpret
    /// the input. The value must already have been consumed.
    pub fn conversion_failure<T: FromJson>(
        &self,
        shape: InputShape,
        reason: impl Into<String>,
    ) -> JsonError {
        self.err(JsonErrorKind::ConversionFailure {
            target: T::NAME,
            shape,
            reason: reason.into(),
        })
    }

    /// Error constructor for number literals that do not fit the target.
    pub fn number_out_of_range(&self, value: &str, target: &'static str) -> JsonError {
        self.err(JsonErrorKind::NumberOutOfRange {
            value: value.into(),
            target,
        })
    }

    /// Error constructor for well-shaped but invalid content.
    pub fn invalid_value(&self, message: impl Into<String>) -> JsonError {
        self.err(JsonErrorKind::InvalidValue {
            message: message.into(),
        })
    }

    /// Expect end of input after the root value.
    pub(crate) fn finish(&mut self) -> Result<(), JsonError> {
        let st = self.next_token()?;
        match st.token {
            Token::Eof => Ok(()),
            _ => Err(self.err_at(st.span.offset, JsonErrorKind::TrailingData)),
        }
    }

    fn next_token(&mut self) -> Result<SpannedToken<'de>, JsonError> {
        match self.scanner.next_token() {
            Ok(token) => Ok(token),
            Err(e) => Err(self.scan_error(e)),
        }
    }

    fn peek_token(&mut self) -> Result<SpannedToken<'de>, JsonError> {
        match self.scanner.peek_token() {
            Ok(token) => Ok(token),
            Err(e) => Err(self.scan_error(e)),
        }
    }

    fn scan_error(&self, e: ScanError) -> JsonError {
        JsonError::new(JsonErrorKind::Scan(e.kind), self.location(e.span.offset))
    }

    fn err(&self, kind: JsonErrorKind) -> JsonError {
        self.err_at(self.value_offset, kind)
    }

    fn err_at(&self, offset: usize, kind: JsonErrorKind) -> JsonError {
        JsonError::new(kind, self.location(offset))
    }

    /// Compute 1-based line/column for a byte offset.
    fn location(&self, offset: usize) -> Location {
        let offset = offset.min(self.input.len());
        let mut line = 1;
        let mut column = 1;
        for ch in self.input[..offset].chars() {
            if ch == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }
        Location { line, column, offset }
    }
}

/// A configured, reusable JSON reader.
///
/// The analog of a mapper: coercion overrides are accumulated through
/// [`Reader::builder`] and frozen into an immutable snapshot at
/// [`ReaderBuilder::build`]. A `Reader` is cheap to clone and safe to share
/// across threads; changing configuration means building a new one.
#[derive(Debug, Clone, Default)]
pub struct Reader {
    coercions: Arc<Coercions>,
}

impl Reader {
    /// Start configuring a reader.
    pub fn builder() -> ReaderBuilder {
        ReaderBuilder {
            coercions: CoercionsBuilder::new(),
        }
    }

    /// Deserialize a complete JSON document into `T`.
    ///
    /// Trailing non-whitespace input after the root value is an error.
    pub fn from_str<T: FromJson>(&self, input: &str) -> Result<T, JsonError> {
        let mut de = Deserializer::new(input, Arc::clone(&self.coercions));
        let value = de.value::<T>()?;
        de.finish()?;
        Ok(value)
    }
}

/// Builder for [`Reader`], exposing the three coercion configuration tiers.
#[derive(Debug, Default)]
pub struct ReaderBuilder {
    coercions: CoercionsBuilder,
}

impl ReaderBuilder {
    /// Install an action for `shape` at the global tier.
    #[must_use]
    pub fn coerce_defaults(mut self, shape: InputShape, action: CoercionAction) -> Self {
        self.coercions = self.coercions.defaults(shape, action);
        self
    }

    /// Install a global fallback for shapes without a specific entry.
    #[must_use]
    pub fn coerce_defaults_fallback(mut self, action: CoercionAction) -> Self {
        self.coercions = self.coercions.defaults_fallback(action);
        self
    }

    /// Install an action for `shape`, scoped to one logical type family.
    #[must_use]
    pub fn coerce_logical_type(
        mut self,
        logical: LogicalType,
        shape: InputShape,
        action: CoercionAction,
    ) -> Self {
        self.coercions = self.coercions.for_logical_type(logical, shape, action);
        self
    }

    /// Install a fallback scoped to one logical type family.
    #[must_use]
    pub fn coerce_logical_type_fallback(
        mut self,
        logical: LogicalType,
        action: CoercionAction,
    ) -> Self {
        self.coercions = self.coercions.for_logical_type_fallback(logical, action);
        self
    }

    /// Install an action for `shape`, scoped to the concrete type `T`.
    ///
    /// Keyed through [`FromJson::physical_key`], so configuration written
    /// against `T` also governs `Option<T>` positions.
    #[must_use]
    pub fn coerce_type<T: FromJson>(mut self, shape: InputShape, action: CoercionAction) -> Self {
        self.coercions = self.coercions.for_type_id(T::physical_key(), shape, action);
        self
    }

    /// Install a fallback scoped to the concrete type `T`.
    #[must_use]
    pub fn coerce_type_fallback<T: FromJson>(mut self, action: CoercionAction) -> Self {
        self.coercions = self
            .coercions
            .for_type_id_fallback(T::physical_key(), action);
        self
    }

    /// Legacy compatibility switch; see
    /// [`CoercionsBuilder::accept_empty_string_as_null`].
    #[must_use]
    pub fn accept_empty_string_as_null(mut self, enabled: bool) -> Self {
        self.coercions = self.coercions.accept_empty_string_as_null(enabled);
        self
    }

    /// Freeze the configuration into an immutable [`Reader`].
    pub fn build(self) -> Reader {
        Reader {
            coercions: Arc::new(self.coercions.build()),
        }
    }
}

/// Deserialize a value from a JSON string with built-in coercion defaults
/// only.
///
/// For configured coercion handling, build a [`Reader`] instead.
pub fn from_str<T: FromJson>(input: &str) -> Result<T, JsonError> {
    Reader::default().from_str(input)
}
