use std::fmt;
use std::future::Future;

use serde_json::Value;

use crate::engine::CompiledSignature;
use crate::error::{GuardError, ParameterTypeError, ReturnTypeError};

/// A function wrapped with a checked signature.
///
/// Every call runs the full pipeline: check arguments, call the target, check
/// the result. Nothing is cached between calls and no state is shared, so a
/// `Guarded` can be called concurrently whenever the target allows it.
#[derive(Clone)]
pub struct Guarded<F> {
    name: Option<String>,
    target: F,
    signature: CompiledSignature,
}

impl<F> Guarded<F> {
    pub(crate) fn new(name: Option<String>, target: F, signature: CompiledSignature) -> Self {
        Self {
            name,
            target,
            signature,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn signature(&self) -> &CompiledSignature {
        &self.signature
    }

    pub fn check_args(&self, args: &[Value]) -> Result<(), ParameterTypeError> {
        self.signature.check_args(self.name(), args)
    }

    pub fn check_return(&self, value: &Value) -> Result<(), ReturnTypeError> {
        self.signature.check_return(self.name(), value)
    }

    /// Give back the unwrapped function.
    pub fn into_inner(self) -> F {
        self.target
    }
}

impl<F> Guarded<F>
where
    F: Fn(&[Value]) -> Value,
{
    /// Call the target with `args` exactly as given. A rejected result is
    /// dropped; whatever the target did before returning stays done.
    pub fn call(&self, args: &[Value]) -> Result<Value, GuardError> {
        self.check_args(args)?;
        let result = (self.target)(args);
        self.check_return(&result)?;
        Ok(result)
    }
}

impl<F, Fut> Guarded<F>
where
    F: Fn(Vec<Value>) -> Fut,
    Fut: Future<Output = Value>,
{
    /// Arguments are checked before the future is created; the return
    /// descriptor is applied to the value the future resolves to.
    pub async fn call_async(&self, args: Vec<Value>) -> Result<Value, GuardError> {
        self.check_args(&args)?;
        let result = (self.target)(args).await;
        self.check_return(&result)?;
        Ok(result)
    }
}

impl<F> fmt::Debug for Guarded<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guarded")
            .field("name", &self.name)
            .field("signature", &self.signature.signature().to_string())
            .finish_non_exhaustive()
    }
}
