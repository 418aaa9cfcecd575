use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use shapeguard_descriptor::{
    predicate, CompiledDescriptor, DescriptorError, Predicate, PredicateResolver, TypeDescriptor,
    ABSENT,
};

/// Named composite validators defined on top of a base resolver.
///
/// Each entry is a full descriptor, so an entry may accept absence on its own
/// (`maybeCount = integer.isOptional`). [`DescriptorCatalog::descriptor`]
/// hands out references whose required flag mirrors that, which keeps the
/// engine's absence check consistent with the entry.
#[derive(Clone)]
pub struct DescriptorCatalog {
    base: Arc<dyn PredicateResolver>,
    entries: BTreeMap<String, CompiledDescriptor>,
}

impl DescriptorCatalog {
    pub fn new(base: Arc<dyn PredicateResolver>) -> Self {
        Self {
            base,
            entries: BTreeMap::new(),
        }
    }

    /// Define `name` as `definition`. Names inside the definition resolve
    /// against the base resolver only, so entries cannot refer to each other.
    pub fn define(
        &mut self,
        name: impl Into<String>,
        definition: &TypeDescriptor,
    ) -> Result<&mut Self, DescriptorError> {
        let name = name.into();
        let compiled = definition.compile(self.base.as_ref())?;
        tracing::debug!(target: "shapeguard::catalog", %name, %definition, "catalog entry defined");
        self.entries.insert(name, compiled);
        Ok(self)
    }

    /// Reference descriptor for a catalog entry, optional when the entry
    /// itself accepts absence.
    pub fn descriptor(&self, name: &str) -> Option<TypeDescriptor> {
        let entry = self.entries.get(name)?;
        let reference = TypeDescriptor::primitive(name);
        if entry.matches(&ABSENT) {
            Some(reference.optional())
        } else {
            Some(reference)
        }
    }

    /// Rewrite `descriptor` so required references to entries that accept
    /// absence become optional, as [`DescriptorCatalog::descriptor`] would
    /// hand them out. Other names are left alone.
    pub fn reference(&self, descriptor: &TypeDescriptor) -> TypeDescriptor {
        match descriptor {
            TypeDescriptor::Primitive {
                name,
                required: true,
            } => self
                .descriptor(name)
                .unwrap_or_else(|| descriptor.clone()),
            TypeDescriptor::Primitive { .. } => descriptor.clone(),
            TypeDescriptor::OneOf(members) => {
                TypeDescriptor::OneOf(members.iter().map(|m| self.reference(m)).collect())
            }
        }
    }

    /// The descriptor an entry was defined with.
    pub fn definition(&self, name: &str) -> Option<&TypeDescriptor> {
        self.entries.get(name).map(CompiledDescriptor::descriptor)
    }

    pub fn defines(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Whether `name` also resolves in the base resolver.
    pub fn shadows_base(&self, name: &str) -> bool {
        self.defines(name) && self.base.resolve(name).is_some()
    }

    pub fn entry_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl PredicateResolver for DescriptorCatalog {
    fn resolve(&self, name: &str) -> Option<Predicate> {
        match self.entries.get(name) {
            Some(entry) => {
                let entry = entry.clone();
                Some(predicate(move |value| entry.matches(value)))
            }
            None => self.base.resolve(name),
        }
    }

    fn names(&self) -> Vec<String> {
        let mut names: BTreeSet<String> = self.base.names().into_iter().collect();
        names.extend(self.entries.keys().cloned());
        names.into_iter().collect()
    }
}

impl fmt::Debug for DescriptorCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.entries
                    .iter()
                    .map(|(name, entry)| (name, entry.descriptor())),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins;
    use serde_json::{json, Value};

    fn catalog() -> DescriptorCatalog {
        let mut catalog = DescriptorCatalog::new(builtins());
        catalog
            .define("numeric", &TypeDescriptor::any_of(["number", "string"]))
            .unwrap()
            .define(
                "maybeCount",
                &TypeDescriptor::primitive("integer").optional(),
            )
            .unwrap();
        catalog
    }

    #[test]
    fn entries_resolve_as_predicates() {
        let c = catalog();
        let numeric = c.resolve("numeric").unwrap();
        assert!(numeric(&json!(1)));
        assert!(numeric(&json!("1")));
        assert!(!numeric(&json!(true)));
        assert!(c.resolve("boolean").is_some(), "falls through to base");
        assert!(c.resolve("missing").is_none());
    }

    #[test]
    fn descriptor_reference_carries_entry_optionality() {
        let c = catalog();
        assert_eq!(
            c.descriptor("numeric"),
            Some(TypeDescriptor::primitive("numeric"))
        );
        let maybe = c.descriptor("maybeCount").unwrap();
        assert_eq!(maybe, TypeDescriptor::primitive("maybeCount").optional());
        assert_eq!(maybe.matches(&Value::Null, &c), Ok(true));
        assert_eq!(maybe.matches(&json!(3), &c), Ok(true));
        assert_eq!(maybe.matches(&json!(3.5), &c), Ok(false));
        assert!(c.descriptor("nope").is_none());
    }

    #[test]
    fn references_pick_up_entry_optionality() {
        let c = catalog();
        let maybe = c.reference(&TypeDescriptor::primitive("maybeCount"));
        assert_eq!(maybe, TypeDescriptor::primitive("maybeCount").optional());
        assert_eq!(maybe.matches(&Value::Null, &c), Ok(true));

        let union = c.reference(&TypeDescriptor::any_of(["string", "maybeCount"]));
        assert_eq!(
            union,
            TypeDescriptor::one_of([
                TypeDescriptor::primitive("string"),
                TypeDescriptor::primitive("maybeCount").optional(),
            ])
        );
        assert_eq!(
            c.reference(&TypeDescriptor::primitive("numeric")),
            TypeDescriptor::primitive("numeric")
        );
        assert_eq!(
            c.reference(&TypeDescriptor::primitive("number")),
            TypeDescriptor::primitive("number")
        );
    }

    #[test]
    fn define_rejects_unknown_base_names() {
        let mut c = DescriptorCatalog::new(builtins());
        let err = c
            .define("broken", &TypeDescriptor::primitive("uuid"))
            .unwrap_err();
        assert_eq!(
            err,
            DescriptorError::UnknownPredicate {
                name: "uuid".into()
            }
        );
        assert!(!c.defines("broken"));
    }

    #[test]
    fn entries_do_not_see_each_other() {
        let mut c = catalog();
        assert!(c
            .define("wrapped", &TypeDescriptor::primitive("numeric"))
            .is_err());
    }

    #[test]
    fn lists_entries_and_base_names() {
        let mut c = catalog();
        c.define("string", &TypeDescriptor::primitive("any")).unwrap();
        assert!(c.shadows_base("string"));
        assert!(!c.shadows_base("numeric"));
        let names = c.names();
        assert!(names.contains(&"numeric".to_string()));
        assert!(names.contains(&"isNumber".to_string()));
        assert_eq!(
            c.entry_names().collect::<Vec<_>>(),
            vec!["maybeCount", "numeric", "string"]
        );
    }
}
