//! Declarative struct binding.

/// Defines a struct and generates its [`FromJson`](crate::FromJson) impl in
/// one go.
///
/// The struct must derive (or otherwise implement) `Default`: it doubles as
/// the type's empty-instance factory, and missing fields fall back to their
/// `Default` values. Unknown fields in the input are skipped.
///
/// ```
/// recast_json::bind_struct! {
///     #[derive(Debug, Default, PartialEq)]
///     pub struct Point { pub x: f64, pub y: f64 }
/// }
///
/// let p: Point = recast_json::from_str(r#"{"x": 1.0, "y": 2.0}"#).unwrap();
/// assert_eq!(p, Point { x: 1.0, y: 2.0 });
/// ```
#[macro_export]
macro_rules! bind_struct {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $( $(#[$fmeta:meta])* $fvis:vis $field:ident : $fty:ty ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $( $(#[$fmeta])* $fvis $field : $fty, )*
        }

        impl $crate::FromJson for $name {
            const NAME: &'static str = stringify!($name);
            const LOGICAL: $crate::LogicalType = $crate::LogicalType::Struct;

            fn accepts(shape: $crate::InputShape) -> bool {
                matches!(shape, $crate::InputShape::Object)
            }

            fn build(
                de: &mut $crate::Deserializer<'_>,
                _shape: $crate::InputShape,
            ) -> ::core::result::Result<Self, $crate::JsonError> {
                $( let mut $field: ::core::option::Option<$fty> = ::core::option::Option::None; )*
                de.object(|de, key| {
                    $(
                        if key == stringify!($field) {
                            $field = ::core::option::Option::Some(de.value()?);
                            return ::core::result::Result::Ok(());
                        }
                    )*
                    de.skip_value()
                })?;

                #[allow(unused_mut)]
                let mut out = <$name as ::core::default::Default>::default();
                $(
                    if let ::core::option::Option::Some(value) = $field {
                        out.$field = value;
                    }
                )*
                ::core::result::Result::Ok(out)
            }

            fn empty_value() -> ::core::option::Option<Self> {
                ::core::option::Option::Some(<$name as ::core::default::Default>::default())
            }
        }
    };
}
