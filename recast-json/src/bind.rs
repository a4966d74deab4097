//! The binding trait connecting target types to the deserializer.
//!
//! `FromJson` is the type-introspection surface the coercion decision point
//! consumes: which shapes a type natively accepts, which logical family it
//! belongs to, and whether it has null/empty representations. Impls for the
//! common standard types live here; structs are generated by
//! [`bind_struct!`](crate::bind_struct).

use alloc::borrow::Cow;
use alloc::string::String;
use alloc::vec::Vec;
use core::any::TypeId;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use recast_core::{InputShape, LogicalType};

use crate::deserialize::Deserializer;
use crate::error::JsonError;

/// A type that can be bound from JSON.
pub trait FromJson: Sized + 'static {
    /// Type name used in diagnostics.
    const NAME: &'static str;

    /// The logical type family this type belongs to, for coercion defaults.
    const LOGICAL: LogicalType;

    /// Whether `shape` is natively accepted (constructed without coercion).
    fn accepts(shape: InputShape) -> bool;

    /// Construct from a natively accepted shape at the current position.
    fn build(de: &mut Deserializer<'_>, shape: InputShape) -> Result<Self, JsonError>;

    /// Best-effort conversion from a non-native shape; this is the
    /// `TryConvert` path. The default consumes the value and reports a
    /// conversion failure.
    fn convert(de: &mut Deserializer<'_>, shape: InputShape) -> Result<Self, JsonError> {
        de.skip_value()?;
        Err(de.conversion_failure::<Self>(shape, "no conversion defined for this shape"))
    }

    /// The type's null representation, if it has one.
    fn null_value() -> Option<Self> {
        None
    }

    /// The type's empty instance, if it is empty-constructible.
    fn empty_value() -> Option<Self> {
        None
    }

    /// Key used for physical-tier coercion lookups.
    ///
    /// Wrapper types that should share their inner type's configuration
    /// (notably `Option<T>`) forward this.
    fn physical_key() -> TypeId {
        TypeId::of::<Self>()
    }
}

macro_rules! impl_from_json_int {
    ($($ty:ty),* $(,)?) => {$(
        impl FromJson for $ty {
            const NAME: &'static str = stringify!($ty);
            const LOGICAL: LogicalType = LogicalType::Integer;

            fn accepts(shape: InputShape) -> bool {
                matches!(shape, InputShape::Integer)
            }

            fn build(de: &mut Deserializer<'_>, _shape: InputShape) -> Result<Self, JsonError> {
                let (raw, _hint) = de.number_raw()?;
                raw.parse::<$ty>()
                    .map_err(|_| de.number_out_of_range(raw, Self::NAME))
            }

            fn convert(de: &mut Deserializer<'_>, shape: InputShape) -> Result<Self, JsonError> {
                match shape {
                    InputShape::String | InputShape::EmptyString => {
                        let text = de.string_value()?;
                        text.trim().parse::<$ty>().map_err(|_| {
                            de.conversion_failure::<Self>(
                                shape,
                                format!("cannot parse `{text}` as {}", Self::NAME),
                            )
                        })
                    }
                    InputShape::Float => {
                        let (raw, _hint) = de.number_raw()?;
                        let value: f64 = raw.parse().map_err(|_| {
                            de.conversion_failure::<Self>(shape, "malformed number literal")
                        })?;
                        if value.fract() == 0.0
                            && value >= <$ty>::MIN as f64
                            && value <= <$ty>::MAX as f64
                        {
                            Ok(value as $ty)
                        } else {
                            Err(de.conversion_failure::<Self>(
                                shape,
                                format!(
                                    "`{raw}` has a fractional part or does not fit {}",
                                    Self::NAME
                                ),
                            ))
                        }
                    }
                    InputShape::Boolean => {
                        let flag = de.bool_value()?;
                        Ok(if flag { 1 } else { 0 })
                    }
                    _ => {
                        de.skip_value()?;
                        Err(de.conversion_failure::<Self>(
                            shape,
                            "no conversion defined for this shape",
                        ))
                    }
                }
            }
        }
    )*};
}

impl_from_json_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

macro_rules! impl_from_json_float {
    ($($ty:ty),* $(,)?) => {$(
        impl FromJson for $ty {
            const NAME: &'static str = stringify!($ty);
            const LOGICAL: LogicalType = LogicalType::Float;

            fn accepts(shape: InputShape) -> bool {
                matches!(shape, InputShape::Integer | InputShape::Float)
            }

            fn build(de: &mut Deserializer<'_>, _shape: InputShape) -> Result<Self, JsonError> {
                let (raw, _hint) = de.number_raw()?;
                raw.parse::<$ty>()
                    .map_err(|_| de.number_out_of_range(raw, Self::NAME))
            }

            fn convert(de: &mut Deserializer<'_>, shape: InputShape) -> Result<Self, JsonError> {
                match shape {
                    InputShape::String | InputShape::EmptyString => {
                        let text = de.string_value()?;
                        text.trim().parse::<$ty>().map_err(|_| {
                            de.conversion_failure::<Self>(
                                shape,
                                format!("cannot parse `{text}` as {}", Self::NAME),
                            )
                        })
                    }
                    InputShape::Boolean => {
                        let flag = de.bool_value()?;
                        Ok(if flag { 1.0 } else { 0.0 })
                    }
                    _ => {
                        de.skip_value()?;
                        Err(de.conversion_failure::<Self>(
                            shape,
                            "no conversion defined for this shape",
                        ))
                    }
                }
            }
        }
    )*};
}

impl_from_json_float!(f32, f64);

impl FromJson for bool {
    const NAME: &'static str = "bool";
    const LOGICAL: LogicalType = LogicalType::Boolean;

    fn accepts(shape: InputShape) -> bool {
        matches!(shape, InputShape::Boolean)
    }

    fn build(de: &mut Deserializer<'_>, _shape: InputShape) -> Result<Self, JsonError> {
        de.bool_value()
    }

    fn convert(de: &mut Deserializer<'_>, shape: InputShape) -> Result<Self, JsonError> {
        match shape {
            InputShape::String | InputShape::EmptyString => {
                let text = de.string_value()?;
                match text.trim() {
                    "true" => Ok(true),
                    "false" => Ok(false),
                    other => Err(de.conversion_failure::<Self>(
                        shape,
                        format!("cannot parse `{other}` as bool"),
                    )),
                }
            }
            InputShape::Integer => {
                let (raw, _hint) = de.number_raw()?;
                match raw {
                    "0" => Ok(false),
                    "1" => Ok(true),
                    _ => Err(de.conversion_failure::<Self>(
                        shape,
                        format!("cannot interpret `{raw}` as bool (only 0 and 1)"),
                    )),
                }
            }
            _ => {
                de.skip_value()?;
                Err(de.conversion_failure::<Self>(shape, "no conversion defined for this shape"))
            }
        }
    }
}

impl FromJson for String {
    const NAME: &'static str = "String";
    const LOGICAL: LogicalType = LogicalType::Textual;

    fn accepts(shape: InputShape) -> bool {
        matches!(shape, InputShape::String | InputShape::EmptyString)
    }

    fn build(de: &mut Deserializer<'_>, _shape: InputShape) -> Result<Self, JsonError> {
        Ok(de.string_value()?.into_owned())
    }

    fn convert(de: &mut Deserializer<'_>, shape: InputShape) -> Result<Self, JsonError> {
        match shape {
            // Scalars stringify to their literal text.
            InputShape::Integer | InputShape::Float => {
                let (raw, _hint) = de.number_raw()?;
                Ok(raw.into())
            }
            InputShape::Boolean => {
                let flag = de.bool_value()?;
                Ok(if flag { "true".into() } else { "false".into() })
            }
            _ => {
                de.skip_value()?;
                Err(de.conversion_failure::<Self>(shape, "no conversion defined for this shape"))
            }
        }
    }

    fn empty_value() -> Option<Self> {
        Some(String::new())
    }
}

impl<T: FromJson> FromJson for Option<T> {
    const NAME: &'static str = T::NAME;
    const LOGICAL: LogicalType = T::LOGICAL;

    fn accepts(shape: InputShape) -> bool {
        T::accepts(shape)
    }

    fn build(de: &mut Deserializer<'_>, shape: InputShape) -> Result<Self, JsonError> {
        T::build(de, shape).map(Some)
    }

    fn convert(de: &mut Deserializer<'_>, shape: InputShape) -> Result<Self, JsonError> {
        T::convert(de, shape).map(Some)
    }

    fn null_value() -> Option<Self> {
        Some(None)
    }

    // The empty instance of an optional is the absent one.
    fn empty_value() -> Option<Self> {
        Some(None)
    }

    fn physical_key() -> TypeId {
        T::physical_key()
    }
}

impl<T: FromJson> FromJson for Vec<T> {
    const NAME: &'static str = "Vec";
    const LOGICAL: LogicalType = LogicalType::Collection;

    fn accepts(shape: InputShape) -> bool {
        matches!(shape, InputShape::Array)
    }

    fn build(de: &mut Deserializer<'_>, _shape: InputShape) -> Result<Self, JsonError> {
        let mut out = Vec::new();
        de.array(|de| {
            out.push(de.value::<T>()?);
            Ok(())
        })?;
        Ok(out)
    }

    fn empty_value() -> Option<Self> {
        Some(Vec::new())
    }
}

impl<V: FromJson> FromJson for HashMap<String, V> {
    const NAME: &'static str = "HashMap";
    const LOGICAL: LogicalType = LogicalType::Map;

    fn accepts(shape: InputShape) -> bool {
        matches!(shape, InputShape::Object)
    }

    fn build(de: &mut Deserializer<'_>, _shape: InputShape) -> Result<Self, JsonError> {
        let mut out = HashMap::new();
        de.object(|de, key| {
            out.insert(key.into(), de.value::<V>()?);
            Ok(())
        })?;
        Ok(out)
    }

    fn empty_value() -> Option<Self> {
        Some(HashMap::new())
    }
}

impl FromJson for DateTime<Utc> {
    const NAME: &'static str = "DateTime<Utc>";
    const LOGICAL: LogicalType = LogicalType::DateTime;

    fn accepts(shape: InputShape) -> bool {
        matches!(shape, InputShape::String)
    }

    fn build(de: &mut Deserializer<'_>, _shape: InputShape) -> Result<Self, JsonError> {
        let text = de.string_value()?;
        DateTime::parse_from_rfc3339(&text)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| de.invalid_value(format!("malformed RFC 3339 timestamp `{text}`: {e}")))
    }

    fn convert(de: &mut Deserializer<'_>, shape: InputShape) -> Result<Self, JsonError> {
        match shape {
            // Unix timestamps: whole seconds, or fractional seconds.
            InputShape::Integer => {
                let (raw, _hint) = de.number_raw()?;
                let secs: i64 = raw.parse().map_err(|_| {
                    de.conversion_failure::<Self>(shape, format!("`{raw}` is not a Unix timestamp"))
                })?;
                DateTime::from_timestamp(secs, 0).ok_or_else(|| {
                    de.conversion_failure::<Self>(
                        shape,
                        format!("`{raw}` is out of range for a Unix timestamp"),
                    )
                })
            }
            InputShape::Float => {
                let (raw, _hint) = de.number_raw()?;
                let secs: f64 = raw.parse().map_err(|_| {
                    de.conversion_failure::<Self>(shape, "malformed number literal")
                })?;
                if !secs.is_finite() {
                    return Err(de.conversion_failure::<Self>(
                        shape,
                        format!("`{raw}` is not a Unix timestamp"),
                    ));
                }
                DateTime::from_timestamp_micros((secs * 1_000_000.0) as i64).ok_or_else(|| {
                    de.conversion_failure::<Self>(
                        shape,
                        format!("`{raw}` is out of range for a Unix timestamp"),
                    )
                })
            }
            _ => {
                de.skip_value()?;
                Err(de.conversion_failure::<Self>(shape, "no conversion defined for this shape"))
            }
        }
    }
}

// Keep Cow usable in field position for zero-copy-ish bindings that end up
// owned anyway once they cross the `FromJson: 'static` bound.
impl FromJson for Cow<'static, str> {
    const NAME: &'static str = "Cow<str>";
    const LOGICAL: LogicalType = LogicalType::Textual;

    fn accepts(shape: InputShape) -> bool {
        <String as FromJson>::accepts(shape)
    }

    fn build(de: &mut Deserializer<'_>, shape: InputShape) -> Result<Self, JsonError> {
        String::build(de, shape).map(Cow::Owned)
    }

    fn convert(de: &mut Deserializer<'_>, shape: InputShape) -> Result<Self, JsonError> {
        String::convert(de, shape).map(Cow::Owned)
    }

    fn empty_value() -> Option<Self> {
        Some(Cow::Borrowed(""))
    }
}
