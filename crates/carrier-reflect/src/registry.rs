//! Registry of named constructors.

use std::any::{self, Any};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{BoxError, InstantiationError};

type Constructor = Arc<dyn Fn() -> Result<Box<dyn Any + Send>, BoxError> + Send + Sync>;

/// Maps type identifiers to constructors.
///
/// Only registered types can be built. A type without a zero-argument
/// constructor is simply never registered, so looking it up is an ordinary
/// miss rather than a failure at construction time.
#[derive(Clone, Default)]
pub struct TypeRegistry {
    constructors: HashMap<String, Constructor>,
}

impl TypeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `ctor` under `name`, replacing any earlier registration.
    pub fn register<T, F>(&mut self, name: impl Into<String>, ctor: F) -> &mut Self
    where
        T: Any + Send,
        F: Fn() -> Result<T, BoxError> + Send + Sync + 'static,
    {
        let ctor: Constructor =
            Arc::new(move || ctor().map(|value| Box::new(value) as Box<dyn Any + Send>));
        self.constructors.insert(name.into(), ctor);
        self
    }

    /// Register `T::default` under `T`'s type name.
    pub fn register_default<T>(&mut self) -> &mut Self
    where
        T: Default + Any + Send,
    {
        self.register(any::type_name::<T>(), || Ok(T::default()))
    }

    /// Whether a constructor is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Number of registered constructors.
    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }

    /// Registered identifiers, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Construct the type registered under `name`.
    pub fn instantiate_any(&self, name: &str) -> Result<Box<dyn Any + Send>, InstantiationError> {
        let ctor = self
            .constructors
            .get(name)
            .ok_or_else(|| InstantiationError::NotRegistered {
                type_name: name.to_string(),
            })?;

        ctor().map_err(|source| InstantiationError::Constructor {
            type_name: name.to_string(),
            source,
        })
    }

    /// Construct the type registered under `name` as a `T`.
    pub fn instantiate<T: Any>(&self, name: &str) -> Result<T, InstantiationError> {
        let value = self.instantiate_any(name)?;
        match value.downcast::<T>() {
            Ok(value) => Ok(*value),
            Err(_) => Err(InstantiationError::TypeMismatch {
                type_name: name.to_string(),
                expected: any::type_name::<T>(),
            }),
        }
    }

    /// Construct `T` from its own type name.
    pub fn create<T: Any>(&self) -> Result<T, InstantiationError> {
        self.instantiate(any::type_name::<T>())
    }

    /// Like [`instantiate_any`](Self::instantiate_any), but absent on failure.
    ///
    /// Failures are logged at error level.
    pub fn try_instantiate(&self, name: &str) -> Option<Box<dyn Any + Send>> {
        self.instantiate_any(name).map_err(log_failure).ok()
    }

    /// Like [`instantiate`](Self::instantiate), but absent on failure.
    pub fn try_instantiate_as<T: Any>(&self, name: &str) -> Option<T> {
        self.instantiate(name).map_err(log_failure).ok()
    }

    /// Like [`create`](Self::create), but absent on failure.
    pub fn try_create<T: Any>(&self) -> Option<T> {
        self.create().map_err(log_failure).ok()
    }
}

fn log_failure(error: InstantiationError) {
    tracing::error!(type_name = error.type_name(), %error, "tried, but could not instantiate type");
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("types", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[derive(Debug, Default, PartialEq)]
    struct RetryPolicy {
        attempts: u32,
    }

    /// Needs a connection string, so it has no zero-argument constructor.
    #[allow(dead_code)]
    #[derive(Debug)]
    struct Connection {
        _url: String,
    }

    #[derive(Debug)]
    struct Offline;

    impl fmt::Display for Offline {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("backend offline")
        }
    }

    impl std::error::Error for Offline {}

    fn registry() -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        registry
            .register_default::<RetryPolicy>()
            .register("retry.aggressive", || Ok(RetryPolicy { attempts: 10 }))
            .register::<Connection, _>("connection", || Err(Box::new(Offline) as BoxError));
        registry
    }

    #[test]
    fn test_register_default_uses_type_name() {
        let registry = registry();

        assert!(registry.contains(any::type_name::<RetryPolicy>()));
        assert_eq!(registry.create::<RetryPolicy>().unwrap(), RetryPolicy::default());
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_instantiate_by_name() {
        let registry = registry();

        let policy: RetryPolicy = registry.instantiate("retry.aggressive").unwrap();
        assert_eq!(policy.attempts, 10);

        let any = registry.try_instantiate("retry.aggressive").unwrap();
        assert!(any.downcast_ref::<RetryPolicy>().is_some());
    }

    #[test]
    fn test_try_variant_is_absent_for_unconstructible_type() {
        let registry = registry();

        assert!(registry.try_create::<Connection>().is_none());
        assert!(registry.try_instantiate("com.example.Missing").is_none());
        assert!(registry.try_instantiate_as::<RetryPolicy>("connection").is_none());
    }

    #[test]
    fn test_strict_variant_names_type_and_keeps_cause() {
        let registry = registry();

        let err = registry.instantiate::<Connection>("connection").unwrap_err();
        assert_eq!(err.type_name(), "connection");
        assert_eq!(
            err.to_string(),
            "Could not instantiate type [connection]: backend offline"
        );
        let cause = err.source().expect("cause kept");
        assert!(cause.downcast_ref::<Offline>().is_some());
    }

    #[test]
    fn test_strict_variant_for_unregistered_type() {
        let err = TypeRegistry::new().create::<Connection>().unwrap_err();

        assert!(matches!(err, InstantiationError::NotRegistered { .. }));
        assert_eq!(err.type_name(), any::type_name::<Connection>());
    }

    #[test]
    fn test_type_mismatch() {
        let err = registry()
            .instantiate::<String>("retry.aggressive")
            .unwrap_err();

        match err {
            InstantiationError::TypeMismatch { type_name, expected } => {
                assert_eq!(type_name, "retry.aggressive");
                assert_eq!(expected, any::type_name::<String>());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_names_are_sorted() {
        let mut registry = TypeRegistry::new();
        registry.register("b", || Ok(1u8)).register("a", || Ok(2u8));

        assert_eq!(registry.names(), vec!["a", "b"]);
    }
}
