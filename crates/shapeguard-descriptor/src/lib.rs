//! Type descriptors for runtime shape checks.
//!
//! A [`TypeDescriptor`] names the shape a value is expected to have. Leaf
//! descriptors point at a named predicate which is looked up through a
//! [`PredicateResolver`]; the descriptor model itself never decides what
//! "number" or "string" means. Composite descriptors combine members with OR
//! semantics.
//!
//! Runtime values are `serde_json::Value`. `Value::Null` is the absent value:
//! it satisfies an optional primitive and fails a required one without the
//! predicate ever being consulted.

mod compiled;
mod descriptor;
mod resolve;
mod shape;

pub use compiled::CompiledDescriptor;
pub use descriptor::{TypeDescriptor, OPTIONAL_MARKER};
pub use resolve::{predicate, Predicate, PredicateResolver};
pub use shape::{is_absent, Shape, ABSENT};

/// Errors raised while parsing or resolving descriptors.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("unknown predicate `{name}`")]
    UnknownPredicate { name: String },
    #[error("invalid descriptor `{input}`: {reason}")]
    InvalidSyntax { input: String, reason: &'static str },
}
