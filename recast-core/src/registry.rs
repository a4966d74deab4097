//! The tiered coercion registry and its resolution algorithm.
//!
//! Three scopes layer on top of a built-in compatibility table, consulted in
//! fixed precedence order on every shape mismatch:
//!
//! 1. per-physical-type overrides (one concrete target type)
//! 2. per-logical-type overrides (one family)
//! 3. global defaults
//! 4. the built-in table
//!
//! Tier order is absolute: a shape-specific entry at a lower tier never
//! overrides a fallback entry at a higher tier. Within one tier, a
//! shape-specific entry wins over that tier's fallback.

use core::any::TypeId;
use std::collections::HashMap;

use crate::{CoercionAction, CoercionConfig, InputShape, LogicalType};

/// Immutable snapshot of all configured coercion overrides.
///
/// Built once through [`CoercionsBuilder`], then shared read-only (typically
/// behind an `Arc`) by every reader and every concurrent deserialization.
/// Reconfiguring means building a new snapshot, never mutating a live one.
#[derive(Debug, Clone, Default)]
pub struct Coercions {
    defaults: CoercionConfig,
    per_logical: [Option<CoercionConfig>; LogicalType::COUNT],
    per_type: HashMap<TypeId, CoercionConfig>,
}

impl Coercions {
    /// Resolve the action for a shape mismatch against one target type.
    ///
    /// `physical` identifies the concrete target type, `logical` its family.
    /// Never fails: absence of configuration terminates at the built-in
    /// table, and repeated calls with identical inputs always return the
    /// same action.
    pub fn resolve(
        &self,
        physical: TypeId,
        logical: LogicalType,
        shape: InputShape,
    ) -> CoercionAction {
        if let Some(config) = self.per_type.get(&physical)
            && let Some(action) = config.find(shape)
        {
            return action;
        }
        if let Some(config) = &self.per_logical[logical.index()]
            && let Some(action) = config.find(shape)
        {
            return action;
        }
        if let Some(action) = self.defaults.find(shape) {
            return action;
        }
        builtin_default(logical, shape)
    }
}

/// Built-in action applied when no tier has an entry for `(logical, shape)`.
///
/// The table is total on purpose: combinations where the shape is natively
/// accepted by the family (and therefore never reach coercion) still return
/// a deliberate value rather than panicking.
///
/// The choices mirror long-standing data-binding conventions: structured
/// targets refuse every foreign shape, scalar families convert among
/// themselves and treat the empty string as null, textual targets stringify
/// almost anything, and enums only ever come from names or indices.
pub const fn builtin_default(logical: LogicalType, shape: InputShape) -> CoercionAction {
    use crate::CoercionAction::{AsNull, Fail, TryConvert};
    use crate::{InputShape as S, LogicalType as L};

    match logical {
        // Structured targets accept nothing but their own bracketed shape.
        L::Struct | L::Map | L::Collection | L::Array => Fail,
        L::Integer | L::Float | L::Boolean | L::OtherScalar => match shape {
            S::EmptyString => AsNull,
            S::String | S::Integer | S::Float | S::Boolean => TryConvert,
            S::Array | S::Object | S::Binary => Fail,
        },
        L::Textual => match shape {
            S::Array | S::Object => Fail,
            _ => TryConvert,
        },
        L::DateTime => match shape {
            S::EmptyString => AsNull,
            S::String | S::Integer | S::Float => TryConvert,
            S::Boolean | S::Array | S::Object | S::Binary => Fail,
        },
        L::Enum => match shape {
            S::String | S::Integer => TryConvert,
            _ => Fail,
        },
    }
}

/// Accumulates coercion overrides during the build phase and produces an
/// immutable [`Coercions`] snapshot.
///
/// Within one `(tier, key, shape)` slot the last write wins. Tiers never
/// interact during configuration; precedence is applied only by
/// [`Coercions::resolve`], so the order in which different tiers are
/// configured is irrelevant.
#[derive(Debug, Default)]
pub struct CoercionsBuilder {
    coercions: Coercions,
    empty_string_as_null: bool,
}

impl CoercionsBuilder {
    /// Start from an empty configuration (built-in table only).
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `action` for `shape` at the global tier.
    #[must_use]
    pub fn defaults(mut self, shape: InputShape, action: CoercionAction) -> Self {
        self.coercions.defaults.set(shape, action);
        self
    }

    /// Install a global fallback consulted for any shape without a specific
    /// global entry.
    #[must_use]
    pub fn defaults_fallback(mut self, action: CoercionAction) -> Self {
        self.coercions.defaults.set_fallback(action);
        self
    }

    /// Install `action` for `shape`, scoped to every target in `logical`.
    #[must_use]
    pub fn for_logical_type(
        mut self,
        logical: LogicalType,
        shape: InputShape,
        action: CoercionAction,
    ) -> Self {
        self.coercions.per_logical[logical.index()]
            .get_or_insert_with(CoercionConfig::default)
            .set(shape, action);
        self
    }

    /// Install a fallback for every target in `logical`.
    #[must_use]
    pub fn for_logical_type_fallback(
        mut self,
        logical: LogicalType,
        action: CoercionAction,
    ) -> Self {
        self.coercions.per_logical[logical.index()]
            .get_or_insert_with(CoercionConfig::default)
            .set_fallback(action);
        self
    }

    /// Install `action` for `shape`, scoped to the concrete type `T`.
    #[must_use]
    pub fn for_type<T: 'static>(self, shape: InputShape, action: CoercionAction) -> Self {
        self.for_type_id(TypeId::of::<T>(), shape, action)
    }

    /// Install a fallback scoped to the concrete type `T`.
    #[must_use]
    pub fn for_type_fallback<T: 'static>(self, action: CoercionAction) -> Self {
        self.for_type_id_fallback(TypeId::of::<T>(), action)
    }

    /// Like [`for_type`](Self::for_type), keyed by an explicit [`TypeId`].
    ///
    /// Binding layers that map several Rust types onto one physical key
    /// (e.g. `Option<T>` onto `T`) configure through this entry point.
    #[must_use]
    pub fn for_type_id(
        mut self,
        physical: TypeId,
        shape: InputShape,
        action: CoercionAction,
    ) -> Self {
        self.coercions
            .per_type
            .entry(physical)
            .or_default()
            .set(shape, action);
        self
    }

    /// Fallback variant of [`for_type_id`](Self::for_type_id).
    #[must_use]
    pub fn for_type_id_fallback(mut self, physical: TypeId, action: CoercionAction) -> Self {
        self.coercions
            .per_type
            .entry(physical)
            .or_default()
            .set_fallback(action);
        self
    }

    /// Legacy compatibility switch: treat an empty string as null for any
    /// target.
    ///
    /// Materialized at [`build`](Self::build) time as a global-tier
    /// `EmptyString -> AsNull` entry — unless an explicit global entry for
    /// that shape was configured, so the switch is order-independent with
    /// respect to explicit configuration calls.
    #[must_use]
    pub fn accept_empty_string_as_null(mut self, enabled: bool) -> Self {
        self.empty_string_as_null = enabled;
        self
    }

    /// Finalize into an immutable snapshot.
    pub fn build(mut self) -> Coercions {
        if self.empty_string_as_null
            && !self.coercions.defaults.has_entry(InputShape::EmptyString)
        {
            self.coercions
                .defaults
                .set(InputShape::EmptyString, CoercionAction::AsNull);
        }
        self.coercions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CoercionAction::{AsEmpty, AsNull, Fail, TryConvert};

    struct Bean;
    struct Other;

    fn bean() -> TypeId {
        TypeId::of::<Bean>()
    }

    #[test]
    fn unconfigured_resolves_to_builtin_default() {
        let coercions = Coercions::default();
        assert_eq!(
            coercions.resolve(bean(), LogicalType::Struct, InputShape::EmptyString),
            Fail
        );
        assert_eq!(
            coercions.resolve(bean(), LogicalType::Integer, InputShape::EmptyString),
            AsNull
        );
        assert_eq!(
            coercions.resolve(bean(), LogicalType::Textual, InputShape::Integer),
            TryConvert
        );
    }

    #[test]
    fn physical_beats_logical_beats_global_in_any_configuration_order() {
        // Same three overrides, issued in every permutation of tiers.
        let built: Vec<Coercions> = vec![
            CoercionsBuilder::new()
                .defaults(InputShape::EmptyString, AsNull)
                .for_logical_type(LogicalType::Struct, InputShape::EmptyString, AsEmpty)
                .for_type::<Bean>(InputShape::EmptyString, Fail)
                .build(),
            CoercionsBuilder::new()
                .for_type::<Bean>(InputShape::EmptyString, Fail)
                .defaults(InputShape::EmptyString, AsNull)
                .for_logical_type(LogicalType::Struct, InputShape::EmptyString, AsEmpty)
                .build(),
            CoercionsBuilder::new()
                .for_logical_type(LogicalType::Struct, InputShape::EmptyString, AsEmpty)
                .for_type::<Bean>(InputShape::EmptyString, Fail)
                .defaults(InputShape::EmptyString, AsNull)
                .build(),
        ];

        for coercions in &built {
            assert_eq!(
                coercions.resolve(bean(), LogicalType::Struct, InputShape::EmptyString),
                Fail
            );
            // A different concrete type in the same family sees the logical tier.
            assert_eq!(
                coercions.resolve(TypeId::of::<Other>(), LogicalType::Struct, InputShape::EmptyString),
                AsEmpty
            );
            // A different family falls through to the global tier.
            assert_eq!(
                coercions.resolve(TypeId::of::<Other>(), LogicalType::Map, InputShape::EmptyString),
                AsNull
            );
        }
    }

    #[test]
    fn two_tier_fallthrough() {
        let coercions = CoercionsBuilder::new()
            .defaults(InputShape::EmptyString, AsNull)
            .for_logical_type(LogicalType::Struct, InputShape::EmptyString, AsEmpty)
            .build();
        assert_eq!(
            coercions.resolve(bean(), LogicalType::Struct, InputShape::EmptyString),
            AsEmpty
        );

        let coercions = CoercionsBuilder::new()
            .defaults(InputShape::EmptyString, AsNull)
            .build();
        assert_eq!(
            coercions.resolve(bean(), LogicalType::Struct, InputShape::EmptyString),
            AsNull
        );
    }

    #[test]
    fn higher_tier_fallback_beats_lower_tier_specific_entry() {
        // The global tier has a shape-specific entry, the physical tier only
        // a fallback. Tier order is absolute, so the fallback wins.
        let coercions = CoercionsBuilder::new()
            .defaults(InputShape::EmptyString, AsNull)
            .for_type_fallback::<Bean>(Fail)
            .build();
        assert_eq!(
            coercions.resolve(bean(), LogicalType::Struct, InputShape::EmptyString),
            Fail
        );
    }

    #[test]
    fn last_write_wins_within_a_tier() {
        let coercions = CoercionsBuilder::new()
            .for_type::<Bean>(InputShape::EmptyString, AsNull)
            .for_type::<Bean>(InputShape::EmptyString, AsEmpty)
            .build();
        assert_eq!(
            coercions.resolve(bean(), LogicalType::Struct, InputShape::EmptyString),
            AsEmpty
        );
    }

    #[test]
    fn resolve_is_idempotent() {
        let coercions = CoercionsBuilder::new()
            .for_logical_type(LogicalType::Struct, InputShape::Integer, AsEmpty)
            .build();
        let first = coercions.resolve(bean(), LogicalType::Struct, InputShape::Integer);
        for _ in 0..16 {
            assert_eq!(
                coercions.resolve(bean(), LogicalType::Struct, InputShape::Integer),
                first
            );
        }
    }

    #[test]
    fn legacy_switch_seeds_the_global_tier() {
        let coercions = CoercionsBuilder::new()
            .accept_empty_string_as_null(true)
            .build();
        assert_eq!(
            coercions.resolve(bean(), LogicalType::Struct, InputShape::EmptyString),
            AsNull
        );
        // Other shapes are untouched.
        assert_eq!(
            coercions.resolve(bean(), LogicalType::Struct, InputShape::Integer),
            Fail
        );
    }

    #[test]
    fn explicit_global_entry_beats_the_legacy_switch_in_either_order() {
        let before = CoercionsBuilder::new()
            .defaults(InputShape::EmptyString, Fail)
            .accept_empty_string_as_null(true)
            .build();
        let after = CoercionsBuilder::new()
            .accept_empty_string_as_null(true)
            .defaults(InputShape::EmptyString, Fail)
            .build();
        for coercions in [before, after] {
            assert_eq!(
                coercions.resolve(bean(), LogicalType::Struct, InputShape::EmptyString),
                Fail
            );
        }
    }

    #[test]
    fn builtin_table_is_total() {
        use InputShape as S;
        use LogicalType as L;
        let logicals = [
            L::Struct,
            L::Collection,
            L::Map,
            L::Integer,
            L::Float,
            L::Boolean,
            L::DateTime,
            L::Enum,
            L::Textual,
            L::Array,
            L::OtherScalar,
        ];
        let shapes = [
            S::EmptyString,
            S::String,
            S::Integer,
            S::Float,
            S::Boolean,
            S::Array,
            S::Object,
            S::Binary,
        ];
        for logical in logicals {
            for shape in shapes {
                // Must not panic, and must be stable.
                assert_eq!(
                    builtin_default(logical, shape),
                    builtin_default(logical, shape)
                );
            }
        }
    }
}
