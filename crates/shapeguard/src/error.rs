use shapeguard_descriptor::{DescriptorError, Shape, TypeDescriptor};

/// Any failure surfaced by a guarded call or by wrapping.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GuardError {
    #[error(transparent)]
    Parameter(#[from] ParameterTypeError),
    #[error(transparent)]
    Return(#[from] ReturnTypeError),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

impl From<DescriptorError> for GuardError {
    fn from(err: DescriptorError) -> Self {
        GuardError::Configuration(ConfigurationError::Descriptor(err))
    }
}

/// An argument failed its descriptor. The target was not called.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error(
    "{}parameter {index} expected `{expected}` (tried: {}), received {actual}",
    function_prefix(.function),
    .tried.join(", ")
)]
pub struct ParameterTypeError {
    pub function: Option<String>,
    pub index: usize,
    pub expected: TypeDescriptor,
    /// Predicate names evaluated for this position, in declaration order.
    pub tried: Vec<String>,
    pub actual: Shape,
}

/// The produced value failed the return descriptor. The target already ran.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{}return value expected `{expected}`, produced {actual}", function_prefix(.function))]
pub struct ReturnTypeError {
    pub function: Option<String>,
    pub expected: TypeDescriptor,
    pub actual: Shape,
}

/// Problems detected while building a signature, before any call happens.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),
    #[error("parameter {index} descriptor: {source}")]
    Parameter {
        index: usize,
        #[source]
        source: DescriptorError,
    },
    #[error("return descriptor: {source}")]
    Return {
        #[source]
        source: DescriptorError,
    },
    #[error("alias `{alias}`: {source}")]
    Alias {
        alias: String,
        #[source]
        source: DescriptorError,
    },
    #[error("ambiguous declaration: {0}")]
    AmbiguousDeclaration(&'static str),
    #[error("unknown contract `{0}`")]
    UnknownContract(String),
    #[error("contract `{contract}`: {source}")]
    Contract {
        contract: String,
        #[source]
        source: Box<ConfigurationError>,
    },
}

fn function_prefix(function: &Option<String>) -> String {
    match function {
        Some(name) => format!("{name}: "),
        None => String::new(),
    }
}
