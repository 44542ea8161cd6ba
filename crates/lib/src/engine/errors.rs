//! Error types for engine object construction.

use thiserror::Error;

/// Errors raised while building engine objects.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum EngineError {
    /// A factory failed to construct its engine object.
    #[error("Failed to construct {name}: {reason}")]
    Construction {
        /// Type name of the object being built
        name: String,
        /// Why construction failed
        reason: String,
    },

    /// A service the factory depends on is not available.
    #[error("Required service unavailable: {service}")]
    ServiceUnavailable {
        /// Name of the missing service
        service: String,
    },
}

impl EngineError {
    /// Check if this error is a construction failure.
    pub fn is_construction_error(&self) -> bool {
        matches!(self, EngineError::Construction { .. })
    }

    /// Check if this error is a missing service.
    pub fn is_service_unavailable(&self) -> bool {
        matches!(self, EngineError::ServiceUnavailable { .. })
    }
}

impl From<EngineError> for crate::Error {
    fn from(err: EngineError) -> Self {
        crate::Error::Engine(err)
    }
}
