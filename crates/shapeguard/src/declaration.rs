use std::fmt;

use serde::{Deserialize, Serialize};
use shapeguard_descriptor::TypeDescriptor;

use crate::error::ConfigurationError;

/// One entry of a raw declaration: a descriptor or a list of descriptors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeclItem {
    List(Vec<TypeDescriptor>),
    One(TypeDescriptor),
}

/// Positional declaration as written by the caller, before normalization.
///
/// Two spellings are accepted:
/// * trailing descriptors, `[number, number]`: every item is a parameter and
///   there is no return descriptor;
/// * an explicit list, `[[number, number], number]`: the list holds the
///   parameters and the optional item after it is the return descriptor.
///
/// A return descriptor is only ever read after an explicit list. Every other
/// arrangement is rejected instead of guessed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Declaration {
    items: Vec<DeclItem>,
}

impl Declaration {
    pub fn from_items(items: Vec<DeclItem>) -> Self {
        Self { items }
    }

    pub fn trailing(params: Vec<TypeDescriptor>) -> Self {
        Self {
            items: params.into_iter().map(DeclItem::One).collect(),
        }
    }

    pub fn list(params: Vec<TypeDescriptor>, returns: Option<TypeDescriptor>) -> Self {
        let mut items = vec![DeclItem::List(params)];
        items.extend(returns.map(DeclItem::One));
        Self { items }
    }

    pub fn items(&self) -> &[DeclItem] {
        &self.items
    }

    pub fn normalize(&self) -> Result<Signature, ConfigurationError> {
        let mut items = self.items.iter();
        match items.next() {
            None => Ok(Signature::default()),
            Some(DeclItem::List(params)) => {
                let returns = match items.next() {
                    None => None,
                    Some(DeclItem::One(returns)) => Some(returns.clone()),
                    Some(DeclItem::List(_)) => {
                        return Err(ConfigurationError::AmbiguousDeclaration(
                            "a second descriptor list follows the parameter list",
                        ))
                    }
                };
                if items.next().is_some() {
                    return Err(ConfigurationError::AmbiguousDeclaration(
                        "only one return descriptor may follow the parameter list",
                    ));
                }
                Ok(Signature::new(params.clone(), returns))
            }
            Some(DeclItem::One(first)) => {
                let mut params = vec![first.clone()];
                for item in items {
                    match item {
                        DeclItem::One(param) => params.push(param.clone()),
                        DeclItem::List(_) => {
                            return Err(ConfigurationError::AmbiguousDeclaration(
                                "a descriptor list may only open the declaration; \
                                 declare parameters as one list followed by the return descriptor",
                            ))
                        }
                    }
                }
                Ok(Signature::new(params, None))
            }
        }
    }
}

impl From<Signature> for Declaration {
    fn from(signature: Signature) -> Self {
        Declaration::list(signature.params, signature.returns)
    }
}

/// Normalized parameter and return contract.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Signature {
    pub params: Vec<TypeDescriptor>,
    pub returns: Option<TypeDescriptor>,
}

impl Signature {
    pub fn new(params: Vec<TypeDescriptor>, returns: Option<TypeDescriptor>) -> Self {
        Self { params, returns }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (idx, param) in self.params.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{param}")?;
        }
        f.write_str(")")?;
        if let Some(returns) = &self.returns {
            write!(f, " -> {returns}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn num() -> TypeDescriptor {
        TypeDescriptor::primitive("number")
    }

    fn numeric() -> TypeDescriptor {
        TypeDescriptor::any_of(["string", "number"])
    }

    #[test]
    fn both_spellings_normalize_to_one_model() {
        let trailing = Declaration::trailing(vec![num(), num().optional()]);
        let listed = Declaration::list(vec![num(), num().optional()], None);
        assert_ne!(trailing, listed);
        assert_eq!(trailing.normalize().unwrap(), listed.normalize().unwrap());
    }

    #[test]
    fn return_descriptor_only_after_list() {
        let sig = Declaration::list(vec![numeric(), numeric()], Some(num()))
            .normalize()
            .unwrap();
        assert_eq!(sig.params.len(), 2);
        assert_eq!(sig.returns, Some(num()));

        let flat = Declaration::trailing(vec![numeric(), num()]).normalize().unwrap();
        assert_eq!(flat.params, vec![numeric(), num()]);
        assert_eq!(flat.returns, None);
    }

    #[test]
    fn single_parameter_list_is_unambiguous() {
        let sig = Declaration::list(vec![num()], Some(TypeDescriptor::primitive("string")))
            .normalize()
            .unwrap();
        assert_eq!(sig.params, vec![num()]);
        assert_eq!(sig.returns, Some(TypeDescriptor::primitive("string")));
    }

    #[test]
    fn rejects_ambiguous_arrangements() {
        let cases = [
            vec![DeclItem::One(num()), DeclItem::List(vec![num()])],
            vec![DeclItem::List(vec![num()]), DeclItem::List(vec![num()])],
            vec![
                DeclItem::List(vec![num()]),
                DeclItem::One(num()),
                DeclItem::One(num()),
            ],
        ];
        for items in cases {
            let err = Declaration::from_items(items).normalize().unwrap_err();
            assert!(matches!(err, ConfigurationError::AmbiguousDeclaration(_)));
        }
    }

    #[test]
    fn empty_declaration_has_no_contract() {
        assert_eq!(Declaration::default().normalize().unwrap(), Signature::default());
    }

    #[test]
    fn deserializes_both_spellings() {
        let flat: Declaration = serde_json::from_value(json!(["number", "number.isOptional"])).unwrap();
        let listed: Declaration = serde_json::from_value(json!([
            [{ "anyOf": ["string", "number"] }, { "anyOf": ["string", "number"] }],
            "number"
        ]))
        .unwrap();
        assert_eq!(
            flat.normalize().unwrap(),
            Signature::new(vec![num(), num().optional()], None)
        );
        assert_eq!(
            listed.normalize().unwrap(),
            Signature::new(vec![numeric(), numeric()], Some(num()))
        );
    }

    #[test]
    fn signature_display() {
        let sig = Signature::new(vec![num(), num().optional()], Some(numeric()));
        assert_eq!(
            sig.to_string(),
            "(number, number.isOptional) -> oneOf(string, number)"
        );
        let back = Declaration::from(sig.clone()).normalize().unwrap();
        assert_eq!(back, sig);
    }
}
