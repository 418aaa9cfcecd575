use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::compiled::CompiledDescriptor;
use crate::resolve::PredicateResolver;
use crate::shape::is_absent;
use crate::DescriptorError;

/// Suffix that marks a primitive as optional in string form (`number.isOptional`).
pub const OPTIONAL_MARKER: &str = ".isOptional";

/// Expected shape of a runtime value.
///
/// Descriptors are plain immutable values. Marking one optional produces a new
/// descriptor, so a single descriptor can be shared by any number of
/// signatures.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawDescriptor", into = "RawDescriptor")]
pub enum TypeDescriptor {
    /// Reference to a named predicate. Absence is accepted only when
    /// `required` is false.
    Primitive { name: String, required: bool },
    /// Matches when any member matches. Carries no optionality of its own.
    OneOf(Vec<TypeDescriptor>),
}

impl TypeDescriptor {
    /// Required primitive referencing `name`. The name is taken verbatim; use
    /// [`TypeDescriptor::parse`] to honour the `.isOptional` marker.
    pub fn primitive(name: impl Into<String>) -> Self {
        TypeDescriptor::Primitive {
            name: name.into(),
            required: true,
        }
    }

    /// Parse the string form: `number` or `number.isOptional`.
    pub fn parse(input: &str) -> Result<Self, DescriptorError> {
        let trimmed = input.trim();
        let (base, required) = match trimmed.strip_suffix(OPTIONAL_MARKER) {
            Some(base) => (base, false),
            None => (trimmed, true),
        };
        validate_name(input, base)?;
        Ok(TypeDescriptor::Primitive {
            name: base.to_string(),
            required,
        })
    }

    pub fn one_of<I>(members: I) -> Self
    where
        I: IntoIterator<Item = TypeDescriptor>,
    {
        TypeDescriptor::OneOf(members.into_iter().collect())
    }

    /// Shorthand for a union of required primitives, one per name.
    pub fn any_of<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TypeDescriptor::OneOf(names.into_iter().map(TypeDescriptor::primitive).collect())
    }

    /// Copy of this descriptor that also accepts absence. On a union every
    /// member is marked optional.
    pub fn optional(&self) -> Self {
        self.with_required(false)
    }

    /// Copy of this descriptor that rejects absence.
    pub fn required(&self) -> Self {
        self.with_required(true)
    }

    fn with_required(&self, required: bool) -> Self {
        match self {
            TypeDescriptor::Primitive { name, .. } => TypeDescriptor::Primitive {
                name: name.clone(),
                required,
            },
            TypeDescriptor::OneOf(members) => {
                TypeDescriptor::OneOf(members.iter().map(|m| m.with_required(required)).collect())
            }
        }
    }

    /// Predicate names in declaration order, duplicates kept.
    pub fn predicate_names(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_names(&mut out);
        out
    }

    fn collect_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            TypeDescriptor::Primitive { name, .. } => out.push(name.as_str()),
            TypeDescriptor::OneOf(members) => {
                for member in members {
                    member.collect_names(out);
                }
            }
        }
    }

    /// Evaluate against `value`, resolving predicate names as evaluation
    /// reaches them. Union members after the first match are never resolved.
    pub fn matches<R>(&self, value: &Value, resolver: &R) -> Result<bool, DescriptorError>
    where
        R: PredicateResolver + ?Sized,
    {
        match self {
            TypeDescriptor::Primitive { name, required } => {
                let predicate =
                    resolver
                        .resolve(name)
                        .ok_or_else(|| DescriptorError::UnknownPredicate {
                            name: name.clone(),
                        })?;
                if is_absent(value) {
                    return Ok(!*required);
                }
                Ok(predicate(value))
            }
            TypeDescriptor::OneOf(members) => {
                for member in members {
                    if member.matches(value, resolver)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }

    /// Resolve every predicate name up front.
    pub fn compile<R>(&self, resolver: &R) -> Result<CompiledDescriptor, DescriptorError>
    where
        R: PredicateResolver + ?Sized,
    {
        CompiledDescriptor::compile(self, resolver)
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Primitive { name, required } => {
                f.write_str(name)?;
                if !required {
                    f.write_str(OPTIONAL_MARKER)?;
                }
                Ok(())
            }
            TypeDescriptor::OneOf(members) => {
                f.write_str("oneOf(")?;
                for (idx, member) in members.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{member}")?;
                }
                f.write_str(")")
            }
        }
    }
}

impl FromStr for TypeDescriptor {
    type Err = DescriptorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TypeDescriptor::parse(s)
    }
}

fn validate_name(input: &str, name: &str) -> Result<(), DescriptorError> {
    let reason = if name.is_empty() {
        "predicate name is empty"
    } else if name.chars().any(char::is_whitespace) {
        "predicate name contains whitespace"
    } else if name.ends_with(OPTIONAL_MARKER) {
        "optional marker may only appear once, at the end of the string form"
    } else {
        return Ok(());
    };
    Err(DescriptorError::InvalidSyntax {
        input: input.to_string(),
        reason,
    })
}

/// Surface syntax accepted in JSON/TOML documents.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawDescriptor {
    Name(String),
    AnyOf {
        #[serde(rename = "anyOf")]
        any_of: Vec<String>,
    },
    OneOf {
        #[serde(rename = "oneOf")]
        one_of: Vec<TypeDescriptor>,
    },
    Explicit {
        #[serde(rename = "type")]
        name: String,
        #[serde(default)]
        optional: bool,
    },
}

impl TryFrom<RawDescriptor> for TypeDescriptor {
    type Error = DescriptorError;

    fn try_from(raw: RawDescriptor) -> Result<Self, Self::Error> {
        match raw {
            RawDescriptor::Name(text) => TypeDescriptor::parse(&text),
            RawDescriptor::AnyOf { any_of } => {
                for name in &any_of {
                    validate_name(name, name.trim())?;
                }
                Ok(TypeDescriptor::any_of(
                    any_of.iter().map(|name| name.trim().to_string()),
                ))
            }
            RawDescriptor::OneOf { one_of } => Ok(TypeDescriptor::OneOf(one_of)),
            RawDescriptor::Explicit { name, optional } => {
                let trimmed = name.trim();
                validate_name(&name, trimmed)?;
                Ok(TypeDescriptor::Primitive {
                    name: trimmed.to_string(),
                    required: !optional,
                })
            }
        }
    }
}

impl From<TypeDescriptor> for RawDescriptor {
    fn from(descriptor: TypeDescriptor) -> Self {
        match descriptor {
            TypeDescriptor::OneOf(one_of) => RawDescriptor::OneOf { one_of },
            TypeDescriptor::Primitive { name, required } => {
                // Names the string form cannot carry keep the explicit form,
                // which deserialization then rejects instead of reinterpreting.
                if validate_name(&name, &name).is_ok() {
                    RawDescriptor::Name(
                        TypeDescriptor::Primitive { name, required }.to_string(),
                    )
                } else {
                    RawDescriptor::Explicit {
                        name,
                        optional: !required,
                    }
                }
            }
        }
    }
}
