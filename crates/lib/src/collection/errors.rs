//! Error types for managed collections.

use thiserror::Error;

use crate::engine::ObjectKind;

/// Errors that can occur while adding to or removing from a
/// [`ManagedCollection`](crate::ManagedCollection).
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum CollectionError {
    /// The supplied object is not of the kind this collection holds.
    #[error("Expected an engine object of kind {expected}, got {found}")]
    TypeMismatch {
        /// Kind the collection was created for
        expected: ObjectKind,
        /// Kind of the rejected object
        found: ObjectKind,
    },

    /// A concurrent resolution task panicked or was cancelled.
    #[error("Member resolution task failed: {reason}")]
    TaskFailed {
        /// Description of the failure
        reason: String,
    },
}

impl CollectionError {
    /// Check if this error is a kind mismatch.
    pub fn is_type_mismatch(&self) -> bool {
        matches!(self, CollectionError::TypeMismatch { .. })
    }

    /// Check if this error is a failed resolution task.
    pub fn is_task_failure(&self) -> bool {
        matches!(self, CollectionError::TaskFailed { .. })
    }
}

impl From<CollectionError> for crate::Error {
    fn from(err: CollectionError) -> Self {
        crate::Error::Collection(err)
    }
}
