use std::fmt;

use serde_json::Value;

use crate::descriptor::TypeDescriptor;
use crate::resolve::{Predicate, PredicateResolver};
use crate::shape::is_absent;
use crate::DescriptorError;

/// A descriptor whose predicate names have all been resolved.
///
/// Evaluation can no longer fail; unknown names were reported by
/// [`CompiledDescriptor::compile`].
#[derive(Clone)]
pub struct CompiledDescriptor {
    source: TypeDescriptor,
    root: Node,
}

#[derive(Clone)]
enum Node {
    Primitive { required: bool, predicate: Predicate },
    OneOf(Vec<Node>),
}

impl CompiledDescriptor {
    pub fn compile<R>(source: &TypeDescriptor, resolver: &R) -> Result<Self, DescriptorError>
    where
        R: PredicateResolver + ?Sized,
    {
        Ok(Self {
            source: source.clone(),
            root: Node::build(source, resolver)?,
        })
    }

    pub fn matches(&self, value: &Value) -> bool {
        self.root.matches(value)
    }

    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.source
    }
}

impl Node {
    fn build<R>(source: &TypeDescriptor, resolver: &R) -> Result<Self, DescriptorError>
    where
        R: PredicateResolver + ?Sized,
    {
        match source {
            TypeDescriptor::Primitive { name, required } => {
                let predicate =
                    resolver
                        .resolve(name)
                        .ok_or_else(|| DescriptorError::UnknownPredicate {
                            name: name.clone(),
                        })?;
                Ok(Node::Primitive {
                    required: *required,
                    predicate,
                })
            }
            TypeDescriptor::OneOf(members) => members
                .iter()
                .map(|member| Node::build(member, resolver))
                .collect::<Result<Vec<_>, _>>()
                .map(Node::OneOf),
        }
    }

    fn matches(&self, value: &Value) -> bool {
        match self {
            Node::Primitive {
                required,
                predicate,
            } => {
                if is_absent(value) {
                    !required
                } else {
                    predicate(value)
                }
            }
            Node::OneOf(members) => members.iter().any(|member| member.matches(value)),
        }
    }
}

impl fmt::Debug for CompiledDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledDescriptor")
            .field("source", &self.source)
            .finish()
    }
}

impl fmt::Display for CompiledDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.source, f)
    }
}
