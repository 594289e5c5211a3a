//! Instantiation error types.

use thiserror::Error;

/// Error returned by a registered constructor.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur when constructing a registered type.
#[derive(Error, Debug)]
pub enum InstantiationError {
    /// No constructor is registered under the identifier.
    #[error("Could not instantiate type [{type_name}]: no constructor registered")]
    NotRegistered { type_name: String },

    /// The registered constructor failed.
    #[error("Could not instantiate type [{type_name}]: {source}")]
    Constructor {
        type_name: String,
        #[source]
        source: BoxError,
    },

    /// The constructor produced a value of a different type than requested.
    #[error("Could not instantiate type [{type_name}]: value is not a {expected}")]
    TypeMismatch {
        type_name: String,
        expected: &'static str,
    },
}

impl InstantiationError {
    /// The identifier that failed to construct.
    pub fn type_name(&self) -> &str {
        match self {
            Self::NotRegistered { type_name }
            | Self::Constructor { type_name, .. }
            | Self::TypeMismatch { type_name, .. } => type_name,
        }
    }
}
