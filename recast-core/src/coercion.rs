//! Coercion primitives: the shapes input can take, the actions available when
//! a shape does not match, and one scope's worth of overrides.

/// Outcome of a coercion decision.
///
/// No ordering among actions is meaningful; the registry always resolves to
/// exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoercionAction {
    /// Refuse the input with a structured shape-mismatch error.
    Fail,
    /// Substitute the target type's null representation.
    AsNull,
    /// Substitute the target type's empty instance.
    AsEmpty,
    /// Behave as if no configuration existed: fall through to the type's own
    /// best-effort conversion, which may itself fail.
    ///
    /// A target with no usable conversion for the shape reports a conversion
    /// failure; it is never silently replaced by a null or empty value. Use
    /// [`AsNull`](CoercionAction::AsNull) or
    /// [`AsEmpty`](CoercionAction::AsEmpty) when substitution is wanted.
    TryConvert,
}

/// The shape of an input value as classified by the parser, independent of
/// the target type.
///
/// Mismatches between an `InputShape` and the shapes a target type natively
/// accepts are what the coercion registry arbitrates. `null` is deliberately
/// not a shape: null handling is a property of the target type, not a
/// coercion decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputShape {
    /// `""` — kept distinct from [`String`](InputShape::String) because the
    /// empty string carries its own, much older set of compatibility rules.
    EmptyString,
    /// Any non-empty string.
    String,
    /// A number with no fraction or exponent.
    Integer,
    /// A number with a fraction or exponent.
    Float,
    /// `true` or `false`.
    Boolean,
    /// `[...]`
    Array,
    /// `{...}`
    Object,
    /// Raw binary data. The JSON scanner never produces this shape itself;
    /// it is reachable when a binding layer classifies e.g. a base64 payload
    /// ahead of construction.
    Binary,
}

impl InputShape {
    /// Number of distinct shapes; sizes the dense table in [`CoercionConfig`].
    pub const COUNT: usize = 8;

    /// Dense index for table storage.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Human-readable description, used verbatim in error messages.
    pub const fn description(self) -> &'static str {
        match self {
            InputShape::EmptyString => "empty String",
            InputShape::String => "String value",
            InputShape::Integer => "Integer value",
            InputShape::Float => "Floating-point value",
            InputShape::Boolean => "Boolean value",
            InputShape::Array => "Array value",
            InputShape::Object => "Object value",
            InputShape::Binary => "Binary value",
        }
    }
}

/// One scope's worth of coercion overrides: a partial map from shape to
/// action, plus an optional fallback answering for every shape that has no
/// specific entry.
///
/// Within one config, a shape-specific entry always wins over the fallback.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoercionConfig {
    actions: [Option<CoercionAction>; InputShape::COUNT],
    fallback: Option<CoercionAction>,
}

impl CoercionConfig {
    /// Install `action` for `shape`, replacing any prior entry for it.
    pub fn set(&mut self, shape: InputShape, action: CoercionAction) {
        self.actions[shape.index()] = Some(action);
    }

    /// Install a fallback action for shapes without a specific entry.
    pub fn set_fallback(&mut self, action: CoercionAction) {
        self.fallback = Some(action);
    }

    /// Look up the action for `shape`: the specific entry if present,
    /// otherwise the fallback, otherwise `None`.
    pub fn find(&self, shape: InputShape) -> Option<CoercionAction> {
        self.actions[shape.index()].or(self.fallback)
    }

    /// Whether a shape-specific entry (not the fallback) exists for `shape`.
    pub fn has_entry(&self, shape: InputShape) -> bool {
        self.actions[shape.index()].is_some()
    }
}
