//! Error types for managed objects.

use thiserror::Error;

use crate::Identity;

/// Errors that can occur while operating on a [`ManagedObject`](crate::ManagedObject).
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ObjectError {
    /// The node was destroyed before or while the operation waited on it.
    #[error("Managed object {identity:?} has been disposed")]
    Disposed {
        /// Identity the node carried, if it ever had one
        identity: Option<Identity>,
    },

    /// The ancestor map context did not show up within the configured bound.
    #[error("Timed out after {waited_ms}ms waiting for the map context")]
    InitTimeout {
        /// How long `init` waited
        waited_ms: u64,
    },
}

impl ObjectError {
    /// Check if this error reports a destroyed node.
    pub fn is_disposed(&self) -> bool {
        matches!(self, ObjectError::Disposed { .. })
    }

    /// Check if this error is an `init` timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ObjectError::InitTimeout { .. })
    }
}

impl From<ObjectError> for crate::Error {
    fn from(err: ObjectError) -> Self {
        crate::Error::Object(err)
    }
}
