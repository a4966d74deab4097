//! Error types for JSON deserialization.
//!
//! Every error carries, where known, a [`Location`] with 1-based line/column
//! plus the byte offset, so a caller can point at the offending input. The
//! coercion-related messages are a stable contract: tests (and downstream
//! users) substring-match on them.

use alloc::string::String;
use core::fmt::{self, Display};

use recast_core::InputShape;

use crate::scanner::ScanErrorKind;

/// Position of an error in the source input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    /// 1-based line number.
    pub line: usize,
    /// 1-based column number (in characters).
    pub column: usize,
    /// Byte offset into the input.
    pub offset: usize,
}

impl Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Error type for JSON deserialization.
#[derive(Debug)]
pub struct JsonError {
    /// The specific kind of error.
    pub kind: JsonErrorKind,
    /// Where in the input the error occurred, if known.
    pub location: Option<Location>,
}

impl JsonError {
    /// Create a new error with location information.
    pub const fn new(kind: JsonErrorKind, location: Location) -> Self {
        JsonError {
            kind,
            location: Some(location),
        }
    }

    /// Create an error without location information.
    pub const fn without_location(kind: JsonErrorKind) -> Self {
        JsonError {
            kind,
            location: None,
        }
    }
}

impl Display for JsonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(location) = &self.location {
            write!(f, " at {location}")?;
        }
        Ok(())
    }
}

impl std::error::Error for JsonError {}

/// Specific error kinds for JSON deserialization.
#[derive(Debug)]
pub enum JsonErrorKind {
    /// Scanner error.
    Scan(ScanErrorKind),
    /// Unexpected token.
    UnexpectedToken {
        /// Description of the token that was found.
        got: &'static str,
        /// What was expected instead.
        expected: &'static str,
    },
    /// Unexpected end of input.
    UnexpectedEof {
        /// What was expected before EOF.
        expected: &'static str,
    },
    /// Input continued past the end of the root value.
    TrailingData,
    /// The resolved coercion action was `Fail`: the input's shape is not
    /// accepted for the target type.
    InvalidShapeCoercion {
        /// Name of the target type.
        target: &'static str,
        /// The offending input shape.
        shape: InputShape,
    },
    /// The resolved coercion action was `AsEmpty`, but the target type has
    /// no empty-instance factory. A configuration contradiction.
    NotEmptyConstructible {
        /// Name of the target type.
        target: &'static str,
        /// The offending input shape.
        shape: InputShape,
    },
    /// The `TryConvert` fallback conversion could not interpret the input.
    ConversionFailure {
        /// Name of the target type.
        target: &'static str,
        /// The offending input shape.
        shape: InputShape,
        /// Why the conversion failed.
        reason: String,
    },
    /// A null (literal or substituted via `AsNull`) reached a target type
    /// with no null representation.
    NoNullRepresentation {
        /// Name of the target type.
        target: &'static str,
    },
    /// Number literal does not fit the target type.
    NumberOutOfRange {
        /// The numeric literal.
        value: String,
        /// The target type that couldn't hold it.
        target: &'static str,
    },
    /// Value had the right shape but invalid content (e.g. a malformed
    /// timestamp string).
    InvalidValue {
        /// Description of why the value is invalid.
        message: String,
    },
}

impl Display for JsonErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsonErrorKind::Scan(e) => write!(f, "{e}"),
            JsonErrorKind::UnexpectedToken { got, expected } => {
                write!(f, "unexpected token: got {got}, expected {expected}")
            }
            JsonErrorKind::UnexpectedEof { expected } => {
                write!(f, "unexpected end of input, expected {expected}")
            }
            JsonErrorKind::TrailingData => write!(f, "input continues past the first value"),
            JsonErrorKind::InvalidShapeCoercion { target, shape } => write!(
                f,
                "Cannot deserialize value of type `{target}` from {} \
                 (set a coercion action for this shape to allow)",
                shape.description()
            ),
            JsonErrorKind::NotEmptyConstructible { target, shape } => write!(
                f,
                "Cannot coerce {} into `{target}`: type is not empty-constructible, \
                 yet the resolved coercion action was AsEmpty",
                shape.description()
            ),
            JsonErrorKind::ConversionFailure { target, shape, reason } => write!(
                f,
                "Cannot convert {} into `{target}`: {reason}",
                shape.description()
            ),
            JsonErrorKind::NoNullRepresentation { target } => write!(
                f,
                "Cannot deserialize null into `{target}`, which has no null \
                 representation (consider `Option<{target}>`)"
            ),
            JsonErrorKind::NumberOutOfRange { value, target } => {
                write!(f, "number `{value}` out of range for {target}")
            }
            JsonErrorKind::InvalidValue { message } => {
                write!(f, "invalid value: {message}")
            }
        }
    }
}

impl JsonErrorKind {
    /// Get an error code for this kind of error.
    pub const fn code(&self) -> &'static str {
        match self {
            JsonErrorKind::Scan(_) => "json::scan",
            JsonErrorKind::UnexpectedToken { .. } => "json::unexpected_token",
            JsonErrorKind::UnexpectedEof { .. } => "json::unexpected_eof",
            JsonErrorKind::TrailingData => "json::trailing_data",
            JsonErrorKind::InvalidShapeCoercion { .. } => "json::invalid_shape_coercion",
            JsonErrorKind::NotEmptyConstructible { .. } => "json::not_empty_constructible",
            JsonErrorKind::ConversionFailure { .. } => "json::conversion_failure",
            JsonErrorKind::NoNullRepresentation { .. } => "json::no_null_representation",
            JsonErrorKind::NumberOutOfRange { .. } => "json::number_out_of_range",
            JsonErrorKind::InvalidValue { .. } => "json::invalid_value",
        }
    }
}
