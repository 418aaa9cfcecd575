use std::{collections::BTreeMap, fs, path::Path, sync::Arc};

use anyhow::Context as _;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shapeguard_descriptor::{PredicateResolver, TypeDescriptor};
use shapeguard_predicates::DescriptorCatalog;
use thiserror::Error;

use crate::declaration::{Declaration, Signature};
use crate::engine::CompiledSignature;
use crate::error::ConfigurationError;

/// Supported manifest serialization formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    Json,
    Toml,
    Unknown,
}

impl ManifestFormat {
    fn detect_from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ManifestFormat::Json,
            Some(ext) if ext.eq_ignore_ascii_case("toml") => ManifestFormat::Toml,
            _ => ManifestFormat::Unknown,
        }
    }
}

/// A set of named signatures plus the aliases they may refer to.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub struct ContractManifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Named descriptors usable as predicates inside contract signatures.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    #[schemars(with = "BTreeMap<String, serde_json::Value>")]
    pub aliases: BTreeMap<String, TypeDescriptor>,
    #[serde(default)]
    pub contracts: BTreeMap<String, ContractSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub struct ContractSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Either `[param, ...]` or `[[param, ...], return]`.
    #[serde(default)]
    #[schemars(with = "Vec<serde_json::Value>")]
    pub signature: Declaration,
}

impl ContractSpec {
    /// Normalize and compile the signature against `catalog`. References to
    /// aliases that accept absence are made optional first.
    pub(crate) fn compile(
        &self,
        catalog: &DescriptorCatalog,
    ) -> Result<CompiledSignature, ConfigurationError> {
        let signature = self.signature.normalize()?;
        let signature = Signature::new(
            signature.params.iter().map(|p| catalog.reference(p)).collect(),
            signature.returns.as_ref().map(|r| catalog.reference(r)),
        );
        CompiledSignature::compile(&signature, catalog)
    }
}

impl ContractManifest {
    /// Load a manifest from a string.
    pub fn from_str(input: &str, format: ManifestFormat) -> Result<Self, ManifestLoadError> {
        match format {
            ManifestFormat::Json => serde_json::from_str::<Self>(input)
                .map_err(|err| ManifestLoadError::Parse(oops::ParseError::Json(err))),
            ManifestFormat::Toml => toml::from_str::<Self>(input)
                .map_err(|err| ManifestLoadError::Parse(oops::ParseError::Toml(err))),
            ManifestFormat::Unknown => match serde_json::from_str::<Self>(input) {
                Ok(value) => Ok(value),
                Err(json_err) => match toml::from_str::<Self>(input) {
                    Ok(value) => Ok(value),
                    Err(toml_err) => Err(ManifestLoadError::Parse(oops::ParseError::Both {
                        json: json_err,
                        toml: toml_err,
                    })),
                },
            },
        }
    }

    /// Load a manifest from disk. The format is inferred from the file extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ManifestLoadError> {
        let path = path.as_ref();
        let format = ManifestFormat::detect_from_path(path);
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest at {}", path.display()))
            .map_err(ManifestLoadError::Io)?;
        Self::from_str(&raw, format)
    }

    /// Catalog of this manifest's aliases layered over `base`. The first alias
    /// that fails to compile aborts the build.
    pub(crate) fn catalog(
        &self,
        base: Arc<dyn PredicateResolver>,
    ) -> Result<DescriptorCatalog, ConfigurationError> {
        let mut catalog = DescriptorCatalog::new(base);
        for (alias, definition) in &self.aliases {
            catalog
                .define(alias.as_str(), definition)
                .map_err(|source| ConfigurationError::Alias {
                    alias: alias.clone(),
                    source,
                })?;
        }
        Ok(catalog)
    }

    /// Check names, declarations and predicate references against `base`.
    pub fn validate(&self, base: Arc<dyn PredicateResolver>) -> ValidationReport {
        let mut report = ValidationReport::default();

        let mut catalog = DescriptorCatalog::new(base.clone());
        for (alias, definition) in &self.aliases {
            let field = format!("aliases.{alias}");
            if alias.trim().is_empty() {
                report.push_error("aliases".into(), "alias name is required".into());
            } else if !is_valid_id(alias) {
                report.push_error(
                    field.clone(),
                    "alias must contain only ASCII letters, digits, '.', '-', or '_'".into(),
                );
            }
            if let Err(err) = catalog.define(alias.as_str(), definition) {
                report.push_error(field.clone(), err.to_string());
            }
            if base.resolve(alias).is_some() {
                report.push_warning(field, format!("alias shadows the base predicate `{alias}`"));
            }
        }

        if self.contracts.is_empty() {
            report.push_warning("contracts".into(), "manifest declares no contracts".into());
        }
        for (name, spec) in &self.contracts {
            let field = format!("contracts.{name}");
            if name.trim().is_empty() {
                report.push_error("contracts".into(), "contract name is required".into());
            } else if !is_valid_id(name) {
                report.push_error(
                    field.clone(),
                    "contract name must contain only ASCII letters, digits, '.', '-', or '_'"
                        .into(),
                );
            }
            if let Err(err) = spec.compile(&catalog) {
                report.push_error(format!("{field}.signature"), err.to_string());
            }
            if spec
                .description
                .as_deref()
                .map_or(true, |d| d.trim().is_empty())
            {
                report.push_warning(
                    format!("{field}.description"),
                    "contract has no description".into(),
                );
            }
        }

        report
    }
}

/// Report emitted by [`ContractManifest::validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ValidationReport {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ValidationIssue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn push_error(&mut self, field: String, message: String) {
        self.errors.push(ValidationIssue { field, message });
    }

    pub fn push_warning(&mut self, field: String, message: String) {
        self.warnings.push(ValidationIssue { field, message });
    }
}

/// Individual validation issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
}

/// Errors encountered while loading or parsing a manifest file.
#[derive(Debug, Error)]
pub enum ManifestLoadError {
    #[error("{0:#}")]
    Io(#[source] anyhow::Error),
    #[error("{0}")]
    Parse(oops::ParseError),
}

pub mod oops {
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum ParseError {
        #[error("failed to parse manifest as JSON: {0}")]
        Json(#[source] serde_json::Error),
        #[error("failed to parse manifest as TOML: {0}")]
        Toml(#[source] toml::de::Error),
        #[error(
            "failed to parse manifest as JSON ({json}) and TOML ({toml}); specify the format explicitly"
        )]
        Both {
            #[source]
            json: serde_json::Error,
            toml: toml::de::Error,
        },
    }
}

fn is_valid_id(value: &str) -> bool {
    value
        .chars()
        .all(|c| matches!(c, 'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.'))
}
