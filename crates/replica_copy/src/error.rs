//! Error types for copy compilation and execution

use replica_core::{BeanType, CoreError, TypeRef};
use thiserror::Error;

/// Copy engine errors
#[derive(Debug, Clone, Error)]
pub enum CopyError {
    /// Introspection, construction or property access failed
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The smart converter has no rule for the requested target
    #[error("Unsupported conversion from {from} to {to}")]
    UnsupportedConversion { from: String, to: TypeRef },

    /// Text could not be parsed as a number
    #[error("Invalid number '{0}'")]
    InvalidNumber(String),

    /// The copier was compiled with a filter but none was supplied
    #[error("Copier for {source_type} -> {target_type} requires a filter")]
    MissingFilter {
        source_type: BeanType,
        target_type: BeanType,
    },

    /// The copier was compiled with a converter but none was supplied
    #[error("Copier for {source_type} -> {target_type} requires a converter")]
    MissingConverter {
        source_type: BeanType,
        target_type: BeanType,
    },

    /// The instance passed to a copier is not of its source type
    #[error("Copier expects source '{expected}', got '{found}'")]
    SourceTypeMismatch { expected: BeanType, found: BeanType },

    /// The instance passed to a copier is not of its target type
    #[error("Copier expects target '{expected}', got '{found}'")]
    TargetTypeMismatch { expected: BeanType, found: BeanType },

    /// A nested plan was executed before its compilation finished
    #[error("Nested copy plan for {0} is not available")]
    IncompletePlan(String),

    /// Invalid configuration
    #[error("Invalid copy configuration: {0}")]
    Config(String),
}

impl CopyError {
    /// Create an unsupported conversion error
    pub fn unsupported(from: impl Into<String>, to: &TypeRef) -> Self {
        CopyError::UnsupportedConversion {
            from: from.into(),
            to: to.clone(),
        }
    }
}

/// Result type for copy operations
pub type Result<T> = std::result::Result<T, CopyError>;
