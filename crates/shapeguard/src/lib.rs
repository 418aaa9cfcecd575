//! Validating wrappers for functions over dynamic values.
//!
//! A [`Guard`] turns a function plus a positional [`Declaration`] into a
//! [`Guarded`] callable. Each call checks the arguments against their
//! descriptors, runs the function, then checks the result against the return
//! descriptor if one was declared. Failures come back as [`GuardError`].
//!
//! ```
//! use serde_json::{json, Value};
//! use shapeguard::{guard, Guard, GuardError, TypeDescriptor};
//!
//! let number = TypeDescriptor::primitive("number");
//! let add = guard!(Guard::builtin(), |args: &[Value]| {
//!     json!(args[0].as_f64().unwrap_or_default() + args[1].as_f64().unwrap_or_default())
//! }, number.clone(), number)
//! .unwrap();
//!
//! assert_eq!(add.call(&[json!(2), json!(2)]).unwrap(), json!(4.0));
//! assert!(matches!(
//!     add.call(&[json!("2"), json!(2)]),
//!     Err(GuardError::Parameter(err)) if err.index == 0
//! ));
//! ```

mod book;
mod declaration;
mod engine;
mod error;
mod guarded;
pub mod manifest;

pub use book::ContractBook;
pub use declaration::{DeclItem, Declaration, Signature};
pub use engine::{CompiledSignature, Guard};
pub use error::{ConfigurationError, GuardError, ParameterTypeError, ReturnTypeError};
pub use guarded::Guarded;
pub use manifest::{ContractManifest, ContractSpec, ManifestFormat, ValidationReport};
pub use shapeguard_descriptor::{
    CompiledDescriptor, DescriptorError, PredicateResolver, Shape, TypeDescriptor,
};
pub use shapeguard_predicates::{DescriptorCatalog, ShapeRegistry};

/// Wrap a function with either declaration spelling.
///
/// * `guard!(engine, f, d0, d1)`: trailing descriptors, no return check.
/// * `guard!(engine, f, [d0, d1], ret)`: explicit parameter list, then an
///   optional return descriptor.
#[macro_export]
macro_rules! guard {
    ($guard:expr, $target:expr, [$($param:expr),* $(,)?] $(, $returns:expr)?) => {
        $guard.wrap(
            $target,
            &$crate::Declaration::list(vec![$($param),*], None $(.or(Some($returns)))?),
        )
    };
    ($guard:expr, $target:expr $(, $param:expr)* $(,)?) => {
        $guard.wrap($target, &$crate::Declaration::trailing(vec![$($param),*]))
    };
}
