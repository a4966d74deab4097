#![warn(missing_docs)]
#![warn(clippy::std_instead_of_core)]
#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

mod coercion;
mod logical;
mod registry;

pub use coercion::{CoercionAction, CoercionConfig, InputShape};
pub use logical::LogicalType;
pub use registry::{Coercions, CoercionsBuilder, builtin_default};
