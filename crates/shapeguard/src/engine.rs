use std::fmt;
use std::future::Future;
use std::sync::Arc;

use serde_json::Value;
use shapeguard_descriptor::{CompiledDescriptor, PredicateResolver, Shape, ABSENT};

use crate::declaration::{Declaration, Signature};
use crate::error::{ConfigurationError, GuardError, ParameterTypeError, ReturnTypeError};
use crate::guarded::Guarded;

/// Wrapping engine bound to one predicate resolver.
///
/// Engines are cheap to clone and independent of each other: two engines with
/// different resolvers can wrap functions side by side in the same process.
#[derive(Clone)]
pub struct Guard {
    resolver: Arc<dyn PredicateResolver>,
}

impl Guard {
    pub fn new(resolver: Arc<dyn PredicateResolver>) -> Self {
        Self { resolver }
    }

    /// Engine backed by the shared builtin shape registry.
    pub fn builtin() -> Self {
        Self::new(shapeguard_predicates::builtins())
    }

    pub fn resolver(&self) -> &Arc<dyn PredicateResolver> {
        &self.resolver
    }

    /// Normalize `declaration` and resolve every predicate it names.
    pub fn signature(&self, declaration: &Declaration) -> Result<CompiledSignature, GuardError> {
        let signature = declaration.normalize()?;
        let compiled = CompiledSignature::compile(&signature, self.resolver.as_ref())?;
        tracing::debug!(target: "shapeguard", signature = %signature, "signature compiled");
        Ok(compiled)
    }

    pub fn wrap<F>(&self, target: F, declaration: &Declaration) -> Result<Guarded<F>, GuardError>
    where
        F: Fn(&[Value]) -> Value,
    {
        Ok(Guarded::new(None, target, self.signature(declaration)?))
    }

    /// Like [`Guard::wrap`], with `name` reported in every error.
    pub fn wrap_named<F>(
        &self,
        name: impl Into<String>,
        target: F,
        declaration: &Declaration,
    ) -> Result<Guarded<F>, GuardError>
    where
        F: Fn(&[Value]) -> Value,
    {
        let name = name.into();
        let signature = self.signature(declaration)?;
        tracing::debug!(target: "shapeguard", function = %name, "wrapped");
        Ok(Guarded::new(Some(name), target, signature))
    }

    /// Wrap a future-returning function. The return descriptor is applied to
    /// the resolved value, see [`Guarded::call_async`].
    pub fn wrap_async<F, Fut>(
        &self,
        target: F,
        declaration: &Declaration,
    ) -> Result<Guarded<F>, GuardError>
    where
        F: Fn(Vec<Value>) -> Fut,
        Fut: Future<Output = Value>,
    {
        Ok(Guarded::new(None, target, self.signature(declaration)?))
    }
}

impl Default for Guard {
    fn default() -> Self {
        Self::builtin()
    }
}

impl fmt::Debug for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guard")
            .field("predicates", &self.resolver.names().len())
            .finish()
    }
}

/// Signature with every predicate resolved, ready to check calls.
#[derive(Clone, Debug)]
pub struct CompiledSignature {
    params: Arc<[CompiledDescriptor]>,
    returns: Option<CompiledDescriptor>,
}

impl CompiledSignature {
    pub fn compile<R>(signature: &Signature, resolver: &R) -> Result<Self, ConfigurationError>
    where
        R: PredicateResolver + ?Sized,
    {
        let params = signature
            .params
            .iter()
            .enumerate()
            .map(|(index, param)| {
                param
                    .compile(resolver)
                    .map_err(|source| ConfigurationError::Parameter { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let returns = signature
            .returns
            .as_ref()
            .map(|returns| returns.compile(resolver))
            .transpose()
            .map_err(|source| ConfigurationError::Return { source })?;
        Ok(Self {
            params: params.into(),
            returns,
        })
    }

    /// Number of declared positions.
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub fn params(&self) -> &[CompiledDescriptor] {
        &self.params
    }

    pub fn returns(&self) -> Option<&CompiledDescriptor> {
        self.returns.as_ref()
    }

    pub fn signature(&self) -> Signature {
        Signature::new(
            self.params.iter().map(|p| p.descriptor().clone()).collect(),
            self.returns.as_ref().map(|r| r.descriptor().clone()),
        )
    }

    /// Check declared positions in order and stop at the first mismatch.
    /// Missing arguments read as absent; extra arguments are ignored.
    pub fn check_args(
        &self,
        function: Option<&str>,
        args: &[Value],
    ) -> Result<(), ParameterTypeError> {
        for (index, expected) in self.params.iter().enumerate() {
            let value = args.get(index).unwrap_or(&ABSENT);
            if expected.matches(value) {
                continue;
            }
            let actual = Shape::of(value);
            tracing::trace!(
                target: "shapeguard",
                function = function.unwrap_or("<anonymous>"),
                index,
                expected = %expected,
                %actual,
                "parameter rejected"
            );
            return Err(ParameterTypeError {
                function: function.map(str::to_string),
                index,
                expected: expected.descriptor().clone(),
                tried: expected
                    .descriptor()
                    .predicate_names()
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
                actual,
            });
        }
        Ok(())
    }

    pub fn check_return(&self, function: Option<&str>, value: &Value) -> Result<(), ReturnTypeError> {
        let Some(expected) = &self.returns else {
            return Ok(());
        };
        if expected.matches(value) {
            return Ok(());
        }
        let actual = Shape::of(value);
        tracing::trace!(
            target: "shapeguard",
            function = function.unwrap_or("<anonymous>"),
            expected = %expected,
            %actual,
            "return value rejected"
        );
        Err(ReturnTypeError {
            function: function.map(str::to_string),
            expected: expected.descriptor().clone(),
            actual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shapeguard_descriptor::{DescriptorError, TypeDescriptor};
    use shapeguard_predicates::ShapeRegistry;

    fn num() -> TypeDescriptor {
        TypeDescriptor::primitive("number")
    }

    #[test]
    fn unknown_parameter_predicate_fails_at_wrap_time() {
        let guard = Guard::builtin();
        let decl = Declaration::trailing(vec![num(), TypeDescriptor::primitive("uuid")]);
        let err = guard.wrap(|_| Value::Null, &decl).unwrap_err();
        assert_eq!(
            err,
            GuardError::Configuration(ConfigurationError::Parameter {
                index: 1,
                source: DescriptorError::UnknownPredicate {
                    name: "uuid".into()
                },
            })
        );
    }

    #[test]
    fn unknown_return_predicate_fails_at_wrap_time() {
        let guard = Guard::builtin();
        let decl = Declaration::list(vec![num()], Some(TypeDescriptor::primitive("decimal")));
        assert!(matches!(
            guard.signature(&decl),
            Err(GuardError::Configuration(ConfigurationError::Return { .. }))
        ));
    }

    #[test]
    fn ambiguous_declaration_is_a_configuration_error() {
        let guard = Guard::builtin();
        let decl = Declaration::from_items(vec![
            crate::DeclItem::One(num()),
            crate::DeclItem::List(vec![num()]),
        ]);
        assert!(matches!(
            guard.signature(&decl),
            Err(GuardError::Configuration(
                ConfigurationError::AmbiguousDeclaration(_)
            ))
        ));
    }

    #[test]
    fn engines_with_different_resolvers_coexist() {
        let mut strict = ShapeRegistry::empty();
        strict.register("number", |v| v.as_i64().is_some());
        let strict = Guard::new(Arc::new(strict));
        let loose = Guard::builtin();
        let decl = Declaration::trailing(vec![num()]);
        let a = strict.signature(&decl).unwrap();
        let b = loose.signature(&decl).unwrap();
        assert!(a.check_args(None, &[json!(1.5)]).is_err());
        assert!(b.check_args(None, &[json!(1.5)]).is_ok());
    }

    #[test]
    fn missing_positions_read_as_absent_and_extras_pass() {
        let sig = Guard::builtin()
            .signature(&Declaration::trailing(vec![num(), num().optional()]))
            .unwrap();
        assert!(sig.check_args(None, &[json!(1)]).is_ok());
        assert!(sig.check_args(None, &[json!(1), json!(2), json!("extra")]).is_ok());
        let err = sig.check_args(Some("f"), &[]).unwrap_err();
        assert_eq!(err.index, 0);
        assert_eq!(err.actual, Shape::Absent);
        assert_eq!(err.tried, vec!["number".to_string()]);
    }

    #[test]
    fn compiled_signature_round_trips() {
        let decl = Declaration::list(vec![num()], Some(num().optional()));
        let sig = Guard::builtin().signature(&decl).unwrap();
        assert_eq!(sig.arity(), 1);
        assert_eq!(sig.signature(), decl.normalize().unwrap());
        assert!(sig.check_return(None, &Value::Null).is_ok());
    }
}
