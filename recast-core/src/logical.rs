//! Coarse type families used to set shared coercion defaults.

/// The family a concrete target type belongs to for default-setting purposes.
///
/// Every concrete target type maps to exactly one family. Classification is
/// fixed — declared once on the type's binding impl — and never changes at
/// runtime, so it can be looked up as a constant rather than inspected per
/// value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalType {
    /// Plain structs built field-by-field (the "bean" family).
    Struct,
    /// Growable homogeneous sequences: `Vec<T>`, sets.
    Collection,
    /// Keyed containers: `HashMap<String, V>` and friends.
    Map,
    /// Fixed-width integers.
    Integer,
    /// Floating-point numbers.
    Float,
    /// `bool`.
    Boolean,
    /// Dates, times, and timestamps.
    DateTime,
    /// Closed sets of named variants.
    Enum,
    /// Strings and string-like types.
    Textual,
    /// Fixed-size arrays and tuples.
    Array,
    /// Scalars that fit no other family: UUIDs, byte blobs, opaque ids.
    OtherScalar,
}

impl LogicalType {
    /// Number of distinct families; sizes the per-logical-type tier.
    pub const COUNT: usize = 11;

    /// Dense index for table storage.
    pub const fn index(self) -> usize {
        self as usize
    }
}
