//! Error types for the service registry

use thiserror::Error;

/// Errors that can occur while resolving a service
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// No provider is registered for the requested service type
    #[error("Service not found: {type_name}")]
    NotFound { type_name: &'static str },

    /// A capture sink was handed a value of a different type than it expects
    #[error("Type mismatch while capturing {expected}: slot produced {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// A capture sink received more than one value
    #[error("Capture sink for {type_name} already holds a value")]
    SinkReused { type_name: &'static str },

    /// A slot finished dispatch without handing a value to the sink
    #[error("Slot for {type_name} resolved without producing a value")]
    NotCaptured { type_name: &'static str },
}

impl RegistryError {
    /// Create a NotFound error for a type
    #[inline]
    pub fn not_found<T: ?Sized + 'static>() -> Self {
        Self::NotFound {
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Create a TypeMismatch error for a sink expecting `T`
    #[inline]
    pub fn type_mismatch<T: ?Sized + 'static>(found: &'static str) -> Self {
        Self::TypeMismatch {
            expected: std::any::type_name::<T>(),
            found,
        }
    }

    /// Create a SinkReused error
    #[inline]
    pub fn sink_reused<T: ?Sized + 'static>() -> Self {
        Self::SinkReused {
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Create a NotCaptured error
    #[inline]
    pub fn not_captured<T: ?Sized + 'static>() -> Self {
        Self::NotCaptured {
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Whether this error only signals an absent registration
    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result type alias for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;
