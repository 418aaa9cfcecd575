use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use shapeguard_descriptor::PredicateResolver;

use crate::engine::{CompiledSignature, Guard};
use crate::error::{ConfigurationError, GuardError};
use crate::guarded::Guarded;
use crate::manifest::ContractManifest;

struct Entry {
    description: Option<String>,
    signature: CompiledSignature,
}

/// Compiled contracts from a manifest, looked up by name.
pub struct ContractBook {
    guard: Guard,
    contracts: BTreeMap<String, Entry>,
}

impl ContractBook {
    /// Compile every contract in `manifest`. Aliases become a catalog layered
    /// over `base`, and the first broken alias or contract aborts the build.
    pub fn from_manifest(
        manifest: &ContractManifest,
        base: Arc<dyn PredicateResolver>,
    ) -> Result<Self, ConfigurationError> {
        let catalog = manifest.catalog(base)?;

        let mut contracts = BTreeMap::new();
        for (name, spec) in &manifest.contracts {
            let compiled = spec
                .compile(&catalog)
                .map_err(|source| ConfigurationError::Contract {
                    contract: name.clone(),
                    source: Box::new(source),
                })?;
            contracts.insert(
                name.clone(),
                Entry {
                    description: spec.description.clone(),
                    signature: compiled,
                },
            );
        }
        tracing::debug!(
            target: "shapeguard",
            contracts = contracts.len(),
            aliases = manifest.aliases.len(),
            "contract book compiled"
        );
        Ok(Self {
            guard: Guard::new(Arc::new(catalog)),
            contracts,
        })
    }

    /// Engine that resolves the manifest's aliases as well as base predicates.
    pub fn guard(&self) -> &Guard {
        &self.guard
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.contracts.keys().map(String::as_str)
    }

    pub fn description(&self, name: &str) -> Option<&str> {
        self.contracts.get(name)?.description.as_deref()
    }

    pub fn signature(&self, name: &str) -> Result<&CompiledSignature, ConfigurationError> {
        self.contracts
            .get(name)
            .map(|entry| &entry.signature)
            .ok_or_else(|| ConfigurationError::UnknownContract(name.to_string()))
    }

    /// Wrap `target` with the contract stored under `name`.
    pub fn wrap<F>(&self, name: &str, target: F) -> Result<Guarded<F>, GuardError>
    where
        F: Fn(&[Value]) -> Value,
    {
        let signature = self.signature(name)?.clone();
        Ok(Guarded::new(Some(name.to_string()), target, signature))
    }

    /// Check a recorded call: its arguments and, when given, its result.
    pub fn check_call(
        &self,
        name: &str,
        args: &[Value],
        result: Option<&Value>,
    ) -> Result<(), GuardError> {
        let signature = self.signature(name)?;
        signature.check_args(Some(name), args)?;
        if let Some(result) = result {
            signature.check_return(Some(name), result)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::ManifestFormat;
    use serde_json::json;
    use shapeguard_descriptor::DescriptorError;

    const MANIFEST: &str = r#"{
        "aliases": { "numeric": { "anyOf": ["number", "string"] } },
        "contracts": {
            "add": { "description": "adds", "signature": ["number", "number"] },
            "concat": { "signature": [["numeric", "numeric.isOptional"], "string"] }
        }
    }"#;

    fn book() -> ContractBook {
        let manifest = ContractManifest::from_str(MANIFEST, ManifestFormat::Json).unwrap();
        ContractBook::from_manifest(&manifest, shapeguard_predicates::builtins()).unwrap()
    }

    #[test]
    fn lists_contracts_and_descriptions() {
        let book = book();
        assert_eq!(book.names().collect::<Vec<_>>(), vec!["add", "concat"]);
        assert_eq!(book.description("add"), Some("adds"));
        assert_eq!(book.description("concat"), None);
        assert_eq!(
            book.signature("concat").unwrap().signature().to_string(),
            "(numeric, numeric.isOptional) -> string"
        );
    }

    #[test]
    fn checks_recorded_calls() {
        let book = book();
        assert!(book.check_call("add", &[json!(1), json!(2)], Some(&json!(3))).is_ok());
        assert!(matches!(
            book.check_call("add", &[json!(1), json!("2")], None),
            Err(GuardError::Parameter(err)) if err.index == 1
        ));
        assert!(matches!(
            book.check_call("concat", &[json!("a")], Some(&json!(1))),
            Err(GuardError::Return(_))
        ));
        assert_eq!(
            book.check_call("nope", &[], None),
            Err(GuardError::Configuration(ConfigurationError::UnknownContract(
                "nope".into()
            )))
        );
    }

    #[test]
    fn wraps_functions_by_contract_name() {
        let book = book();
        let concat = book
            .wrap("concat", |args: &[Value]| {
                let mut out = String::new();
                for arg in args {
                    match arg {
                        Value::String(s) => out.push_str(s),
                        Value::Null => {}
                        other => out.push_str(&other.to_string()),
                    }
                }
                Value::String(out)
            })
            .unwrap();
        assert_eq!(concat.call(&[json!("a"), json!(1)]).unwrap(), json!("a1"));
        assert_eq!(concat.call(&[json!(2)]).unwrap(), json!("2"));
        let err = concat.call(&[json!(true)]).unwrap_err();
        assert!(err.to_string().starts_with("concat: parameter 0"));
    }

    #[test]
    fn optional_aliases_accept_missing_and_null_arguments() {
        let manifest = ContractManifest::from_str(
            r#"{
                "aliases": { "maybeCount": "integer.isOptional" },
                "contracts": { "f": { "signature": ["maybeCount"] } }
            }"#,
            ManifestFormat::Json,
        )
        .unwrap();
        let book = ContractBook::from_manifest(&manifest, shapeguard_predicates::builtins())
            .unwrap();
        assert_eq!(book.check_call("f", &[], None), Ok(()));
        assert_eq!(book.check_call("f", &[Value::Null], None), Ok(()));
        assert_eq!(book.check_call("f", &[json!(3)], None), Ok(()));
        assert!(matches!(
            book.check_call("f", &[json!(3.5)], None),
            Err(GuardError::Parameter(err)) if err.index == 0
        ));
    }

    #[test]
    fn broken_contracts_abort_the_build() {
        let manifest = ContractManifest::from_str(
            r#"{ "contracts": { "bad": { "signature": ["number", "uuid"] } } }"#,
            ManifestFormat::Json,
        )
        .unwrap();
        let err = ContractBook::from_manifest(&manifest, shapeguard_predicates::builtins())
            .err()
            .unwrap();
        assert_eq!(
            err,
            ConfigurationError::Contract {
                contract: "bad".into(),
                source: Box::new(ConfigurationError::Parameter {
                    index: 1,
                    source: DescriptorError::UnknownPredicate {
                        name: "uuid".into()
                    },
                }),
            }
        );
    }

    #[test]
    fn broken_aliases_abort_the_build() {
        let manifest = ContractManifest::from_str(
            r#"{ "aliases": { "id": "uuid" }, "contracts": {} }"#,
            ManifestFormat::Json,
        )
        .unwrap();
        let err = ContractBook::from_manifest(&manifest, shapeguard_predicates::builtins())
            .err()
            .unwrap();
        assert!(matches!(err, ConfigurationError::Alias { ref alias, .. } if alias == "id"));
    }
}
