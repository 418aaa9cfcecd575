use std::sync::Arc;

use serde_json::Value;

/// A named boolean shape check. Predicates are pure: they must not mutate
/// anything and must answer the same way for the same value.
pub type Predicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Wrap a closure as a [`Predicate`].
pub fn predicate<F>(check: F) -> Predicate
where
    F: Fn(&Value) -> bool + Send + Sync + 'static,
{
    Arc::new(check)
}

/// Capability that maps predicate names to predicates.
///
/// This is the only seam between the descriptor model and whatever library
/// knows what a "number" is. Providers decide their own naming; the engine
/// treats names as opaque.
pub trait PredicateResolver: Send + Sync {
    fn resolve(&self, name: &str) -> Option<Predicate>;

    /// Names this resolver knows, for listings and diagnostics.
    fn names(&self) -> Vec<String> {
        Vec::new()
    }
}

impl<T: PredicateResolver + ?Sized> PredicateResolver for Arc<T> {
    fn resolve(&self, name: &str) -> Option<Predicate> {
        (**self).resolve(name)
    }

    fn names(&self) -> Vec<String> {
        (**self).names()
    }
}

impl<T: PredicateResolver + ?Sized> PredicateResolver for Box<T> {
    fn resolve(&self, name: &str) -> Option<Predicate> {
        (**self).resolve(name)
    }

    fn names(&self) -> Vec<String> {
        (**self).names()
    }
}

impl<T: PredicateResolver + ?Sized> PredicateResolver for &T {
    fn resolve(&self, name: &str) -> Option<Predicate> {
        (**self).resolve(name)
    }

    fn names(&self) -> Vec<String> {
        (**self).names()
    }
}
