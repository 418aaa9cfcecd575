//! Predicate providers for shapeguard.
//!
//! Two providers plug into the same [`PredicateResolver`] seam:
//! [`ShapeRegistry`] is a flat table of "is-shape" checks with no notion of
//! optionality, and [`DescriptorCatalog`] layers named descriptors (which may
//! carry their own optionality) on top of another resolver.

mod catalog;
mod registry;

use std::sync::Arc;

use once_cell::sync::Lazy;

pub use catalog::DescriptorCatalog;
pub use registry::ShapeRegistry;
pub use shapeguard_descriptor::{Predicate, PredicateResolver};

static BUILTINS: Lazy<Arc<ShapeRegistry>> = Lazy::new(|| Arc::new(ShapeRegistry::with_builtins()));

/// Shared, immutable registry holding the builtin predicates.
pub fn builtins() -> Arc<ShapeRegistry> {
    BUILTINS.clone()
}
