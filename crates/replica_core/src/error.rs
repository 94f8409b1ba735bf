//! Error types for the core library

use thiserror::Error;

/// Result type for introspection and value operations
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised by the type model and its collaborators
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    /// The instance factory cannot build the type
    #[error("Type '{type_name}' has no accessible zero-argument constructor")]
    NoDefaultConstructor {
        type_name: String,
    },

    /// The introspector cannot enumerate properties for the type
    #[error("Failed to introspect type '{type_name}': {message}")]
    IntrospectionFailure {
        type_name: String,
        message: String,
    },

    /// Property does not exist on the bean
    #[error("Property '{property}' not found on '{type_name}'")]
    UnknownProperty {
        type_name: String,
        property: String,
    },

    /// Property exists but has no read capability
    #[error("Property '{property}' on '{type_name}' is not readable")]
    PropertyNotReadable {
        type_name: String,
        property: String,
    },

    /// Property exists but has no write capability
    #[error("Property '{property}' on '{type_name}' is not writable")]
    PropertyNotWritable {
        type_name: String,
        property: String,
    },

    /// A value or bean did not have the expected type
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: String,
        found: String,
    },
}

impl CoreError {
    /// Create a missing constructor error
    pub fn no_default_constructor(type_name: impl Into<String>) -> Self {
        CoreError::NoDefaultConstructor {
            type_name: type_name.into(),
        }
    }

    /// Create an introspection failure
    pub fn introspection(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        CoreError::IntrospectionFailure {
            type_name: type_name.into(),
            message: message.into(),
        }
    }

    /// Create an unknown property error
    pub fn unknown_property(type_name: impl Into<String>, property: impl Into<String>) -> Self {
        CoreError::UnknownProperty {
            type_name: type_name.into(),
            property: property.into(),
        }
    }

    /// Create a type mismatch error
    pub fn type_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        CoreError::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }
}
