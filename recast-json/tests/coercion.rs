//! End-to-end coercion behavior: configuration tiers, action execution, and
//! the stable failure messages.

use std::sync::atomic::{AtomicUsize, Ordering};

use recast_json::{
    CoercionAction, Deserializer, FromJson, InputShape, JsonError, LogicalType, Reader,
    bind_struct, from_str,
};

bind_struct! {
    #[derive(Debug, Default, PartialEq)]
    struct Bean {
        a: String,
    }
}

fn assert_fails_from_empty<T: std::fmt::Debug>(result: Result<T, JsonError>) {
    let err = result.expect_err("empty String should have been rejected");
    assert_eq!(err.kind.code(), "json::invalid_shape_coercion");
    let message = err.to_string();
    assert!(message.contains("Cannot deserialize value of type"), "{message}");
    assert!(message.contains("from empty String"), "{message}");
    let location = err.location.expect("coercion errors carry a location");
    assert_eq!((location.line, location.column, location.offset), (1, 1, 0));
}

#[test]
fn bean_from_empty_string_fails_without_configuration() {
    recast_testhelpers::setup();
    assert_fails_from_empty(from_str::<Bean>("\"\""));
}

#[test]
fn global_as_null_turns_empty_string_into_none() {
    recast_testhelpers::setup();
    let reader = Reader::builder()
        .coerce_defaults(InputShape::EmptyString, CoercionAction::AsNull)
        .build();
    let bean: Option<Bean> = reader.from_str("\"\"").unwrap();
    assert_eq!(bean, None);
}

#[test]
fn as_null_against_a_non_optional_target_is_a_distinct_error() {
    recast_testhelpers::setup();
    let reader = Reader::builder()
        .coerce_defaults(InputShape::EmptyString, CoercionAction::AsNull)
        .build();
    let err = reader.from_str::<Bean>("\"\"").unwrap_err();
    assert_eq!(err.kind.code(), "json::no_null_representation");
    assert!(err.to_string().contains("`Bean`"), "{err}");
}

#[test]
fn global_as_empty_yields_a_default_constructed_bean() {
    recast_testhelpers::setup();
    let reader = Reader::builder()
        .coerce_defaults(InputShape::EmptyString, CoercionAction::AsEmpty)
        .build();
    let bean: Bean = reader.from_str("\"\"").unwrap();
    assert_eq!(bean, Bean::default());
}

#[test]
fn logical_tier_overrides_global_tier() {
    recast_testhelpers::setup();
    let reader = Reader::builder()
        .coerce_defaults(InputShape::EmptyString, CoercionAction::AsNull)
        .coerce_logical_type(LogicalType::Struct, InputShape::EmptyString, CoercionAction::Fail)
        .build();
    assert_fails_from_empty(reader.from_str::<Option<Bean>>("\"\""));

    // A target outside the Struct family still sees the global default.
    let n: Option<i64> = reader.from_str("\"\"").unwrap();
    assert_eq!(n, None);
}

#[test]
fn physical_tier_overrides_logical_tier() {
    recast_testhelpers::setup();
    let reader = Reader::builder()
        .coerce_logical_type(LogicalType::Struct, InputShape::EmptyString, CoercionAction::AsEmpty)
        .coerce_type::<Bean>(InputShape::EmptyString, CoercionAction::Fail)
        .build();
    assert_fails_from_empty(reader.from_str::<Bean>("\"\""));
}

#[test]
fn tier_precedence_is_independent_of_configuration_order() {
    recast_testhelpers::setup();
    bind_struct! {
        #[derive(Debug, Default, PartialEq)]
        struct OtherBean {
            b: u32,
        }
    }

    let readers = [
        Reader::builder()
            .coerce_defaults(InputShape::EmptyString, CoercionAction::AsNull)
            .coerce_logical_type(LogicalType::Struct, InputShape::EmptyString, CoercionAction::AsEmpty)
            .coerce_type::<Bean>(InputShape::EmptyString, CoercionAction::Fail)
            .build(),
        Reader::builder()
            .coerce_type::<Bean>(InputShape::EmptyString, CoercionAction::Fail)
            .coerce_defaults(InputShape::EmptyString, CoercionAction::AsNull)
            .coerce_logical_type(LogicalType::Struct, InputShape::EmptyString, CoercionAction::AsEmpty)
            .build(),
        Reader::builder()
            .coerce_logical_type(LogicalType::Struct, InputShape::EmptyString, CoercionAction::AsEmpty)
            .coerce_type::<Bean>(InputShape::EmptyString, CoercionAction::Fail)
            .coerce_defaults(InputShape::EmptyString, CoercionAction::AsNull)
            .build(),
    ];

    for reader in &readers {
        // Physical entry wins for Bean.
        assert_fails_from_empty(reader.from_str::<Bean>("\"\""));
        // Logical entry wins for other structs.
        let other: OtherBean = reader.from_str("\"\"").unwrap();
        assert_eq!(other, OtherBean::default());
        // Global entry wins for other families.
        let n: Option<i64> = reader.from_str("\"\"").unwrap();
        assert_eq!(n, None);
    }
}

#[test]
fn physical_fallback_beats_shape_specific_entries_of_lower_tiers() {
    recast_testhelpers::setup();
    let reader = Reader::builder()
        .coerce_defaults(InputShape::EmptyString, CoercionAction::AsNull)
        .coerce_type_fallback::<Bean>(CoercionAction::Fail)
        .build();
    assert_fails_from_empty(reader.from_str::<Bean>("\"\""));
}

#[test]
fn global_and_logical_fallbacks_cover_shapes_without_specific_entries() {
    recast_testhelpers::setup();

    // With no shape-specific entry anywhere, the global fallback applies to
    // every mismatched shape.
    let reader = Reader::builder()
        .coerce_defaults_fallback(CoercionAction::AsEmpty)
        .build();
    let bean: Bean = reader.from_str("\"\"").unwrap();
    assert_eq!(bean, Bean::default());
    let bean: Bean = reader.from_str("5").unwrap();
    assert_eq!(bean, Bean::default());

    // A logical-tier fallback sits above it, for its own family only.
    let reader = Reader::builder()
        .coerce_defaults_fallback(CoercionAction::AsEmpty)
        .coerce_logical_type_fallback(LogicalType::Struct, CoercionAction::AsNull)
        .build();
    let bean: Option<Bean> = reader.from_str("\"\"").unwrap();
    assert_eq!(bean, None);
    let text: String = reader.from_str("[1, 2]").unwrap();
    assert_eq!(text, "");
}

#[test]
fn try_convert_falls_through_to_the_types_own_conversion() {
    recast_testhelpers::setup();
    let reader = Reader::builder()
        .coerce_defaults(InputShape::EmptyString, CoercionAction::TryConvert)
        .build();

    // A struct has no scalar conversion.
    let err = reader.from_str::<Bean>("\"\"").unwrap_err();
    assert_eq!(err.kind.code(), "json::conversion_failure");

    // An integer's conversion parses the text, and the empty string is not a
    // number.
    let err = reader.from_str::<i32>("\"\"").unwrap_err();
    assert_eq!(err.kind.code(), "json::conversion_failure");
}

#[test]
fn legacy_switch_accepts_empty_string_as_null() {
    recast_testhelpers::setup();
    let reader = Reader::builder().accept_empty_string_as_null(true).build();
    let bean: Option<Bean> = reader.from_str("\"\"").unwrap();
    assert_eq!(bean, None);

    // An explicit global entry beats the switch regardless of call order.
    let reader = Reader::builder()
        .accept_empty_string_as_null(true)
        .coerce_defaults(InputShape::EmptyString, CoercionAction::AsEmpty)
        .build();
    let bean: Bean = reader.from_str("\"\"").unwrap();
    assert_eq!(bean, Bean::default());
}

#[test]
fn coercion_applies_to_nested_fields_through_the_physical_key() {
    recast_testhelpers::setup();
    bind_struct! {
        #[derive(Debug, Default, PartialEq)]
        struct Outer {
            bean: Option<Bean>,
        }
    }

    // Configuration written against Bean governs the Option<Bean> field.
    let reader = Reader::builder()
        .coerce_type::<Bean>(InputShape::EmptyString, CoercionAction::AsNull)
        .build();
    let outer: Outer = reader.from_str(r#"{"bean": ""}"#).unwrap();
    assert_eq!(outer, Outer { bean: None });

    // And a failing action inside a document reports the field's location.
    let reader = Reader::builder()
        .coerce_type::<Bean>(InputShape::EmptyString, CoercionAction::Fail)
        .build();
    let err = reader.from_str::<Outer>("{\n  \"bean\": \"\"\n}").unwrap_err();
    assert_eq!(err.kind.code(), "json::invalid_shape_coercion");
    let location = err.location.unwrap();
    assert_eq!(location.line, 2);
    assert_eq!(location.column, 11);
}

// Counts empty-instance factory invocations so the action-execution
// properties are observable.
static EMPTY_CALLS: AtomicUsize = AtomicUsize::new(0);

#[derive(Debug, PartialEq)]
struct Probe;

impl FromJson for Probe {
    const NAME: &'static str = "Probe";
    const LOGICAL: LogicalType = LogicalType::Struct;

    fn accepts(shape: InputShape) -> bool {
        matches!(shape, InputShape::Object)
    }

    fn build(de: &mut Deserializer<'_>, _shape: InputShape) -> Result<Self, JsonError> {
        de.object(|de, _key| de.skip_value())?;
        Ok(Probe)
    }

    fn empty_value() -> Option<Self> {
        EMPTY_CALLS.fetch_add(1, Ordering::SeqCst);
        Some(Probe)
    }
}

#[test]
fn as_null_never_invokes_the_empty_factory_and_as_empty_invokes_it_once() {
    recast_testhelpers::setup();

    let as_null = Reader::builder()
        .coerce_type::<Probe>(InputShape::EmptyString, CoercionAction::AsNull)
        .build();
    let value: Option<Probe> = as_null.from_str("\"\"").unwrap();
    assert_eq!(value, None);
    assert_eq!(EMPTY_CALLS.load(Ordering::SeqCst), 0);

    let as_empty = Reader::builder()
        .coerce_type::<Probe>(InputShape::EmptyString, CoercionAction::AsEmpty)
        .build();
    let value: Probe = as_empty.from_str("\"\"").unwrap();
    assert_eq!(value, Probe);
    assert_eq!(EMPTY_CALLS.load(Ordering::SeqCst), 1);
}

#[test]
fn as_empty_against_a_type_without_a_factory_is_a_configuration_contradiction() {
    recast_testhelpers::setup();

    #[derive(Debug)]
    struct Husk;

    impl FromJson for Husk {
        const NAME: &'static str = "Husk";
        const LOGICAL: LogicalType = LogicalType::Struct;

        fn accepts(shape: InputShape) -> bool {
            matches!(shape, InputShape::Object)
        }

        fn build(de: &mut Deserializer<'_>, _shape: InputShape) -> Result<Self, JsonError> {
            de.object(|de, _key| de.skip_value())?;
            Ok(Husk)
        }
    }

    let reader = Reader::builder()
        .coerce_type::<Husk>(InputShape::EmptyString, CoercionAction::AsEmpty)
        .build();
    let err = reader.from_str::<Husk>("\"\"").unwrap_err();
    assert_eq!(err.kind.code(), "json::not_empty_constructible");
    let message = err.to_string();
    assert!(message.contains("not empty-constructible"), "{message}");
    assert!(message.contains("`Husk`"), "{message}");
}

// A hand-written enum binding, to exercise the Enum family's defaults.
#[derive(Debug, PartialEq)]
enum Color {
    Red,
    Green,
    Blue,
}

impl FromJson for Color {
    const NAME: &'static str = "Color";
    const LOGICAL: LogicalType = LogicalType::Enum;

    fn accepts(shape: InputShape) -> bool {
        matches!(shape, InputShape::String)
    }

    fn build(de: &mut Deserializer<'_>, _shape: InputShape) -> Result<Self, JsonError> {
        let name = de.string_value()?;
        match &*name {
            "Red" => Ok(Color::Red),
            "Green" => Ok(Color::Green),
            "Blue" => Ok(Color::Blue),
            other => Err(de.invalid_value(format!("unknown Color variant `{other}`"))),
        }
    }

    fn convert(de: &mut Deserializer<'_>, shape: InputShape) -> Result<Self, JsonError> {
        match shape {
            // Variant index, as serialized by ordinal-style encoders.
            InputShape::Integer => {
                let (raw, _hint) = de.number_raw()?;
                match raw {
                    "0" => Ok(Color::Red),
                    "1" => Ok(Color::Green),
                    "2" => Ok(Color::Blue),
                    _ => Err(de.conversion_failure::<Self>(
                        shape,
                        format!("no Color variant with index {raw}"),
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

#[test]
fn enum_defaults_reject_empty_string_but_convert_variant_indices() {
    recast_testhelpers::setup();

    assert_eq!(from_str::<Color>("\"Green\"").unwrap(), Color::Green);

    // Built-in default for Enum x EmptyString is Fail.
    assert_fails_from_empty(from_str::<Color>("\"\""));

    // Built-in default for Enum x Integer is TryConvert.
    assert_eq!(from_str::<Color>("1").unwrap(), Color::Green);
    let err = from_str::<Color>("9").unwrap_err();
    assert_eq!(err.kind.code(), "json::conversion_failure");
}

#[test]
fn a_reader_is_immutable_and_shareable_across_threads() {
    recast_testhelpers::setup();
    let reader = Reader::builder()
        .coerce_defaults(InputShape::EmptyString, CoercionAction::AsEmpty)
        .build();

    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                for _ in 0..200 {
                    let bean: Bean = reader.from_str("\"\"").unwrap();
                    assert_eq!(bean, Bean::default());
                }
            });
        }
    });

    // Repeated resolution with identical inputs stays stable afterwards too.
    let bean: Bean = reader.from_str("\"\"").unwrap();
    assert_eq!(bean, Bean::default());
}
