//! Reorder Errors
//!
//! One `ReorderError` is surfaced per session; its `Display` is the message
//! shown to the operator.

use thiserror::Error;

use crate::domain::DomainError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReorderError {
    /// A session for this scope is not idle
    #[error("A reorder is already in progress for {0}")]
    Busy(String),

    /// Unknown item, stale source index, or target out of range
    #[error("Invalid move: {0}")]
    InvalidMove(String),

    /// Planning produced something other than a 1..N permutation
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Write `failed_at` (1-based) of `total` failed in transport
    #[error("Saving the new order failed at {item_id} (write {failed_at} of {total}): {message}")]
    TransientNetworkFailure {
        failed_at: usize,
        total: usize,
        item_id: String,
        message: String,
    },

    /// Write `failed_at` (1-based) of `total` was refused by the backend
    #[error("The server rejected the new position of {item_id} (write {failed_at} of {total}): {message}")]
    ValidationRejection {
        failed_at: usize,
        total: usize,
        item_id: String,
        message: String,
    },

    /// Fetching the canonical order failed
    #[error("Could not reload the list: {0}")]
    Resync(DomainError),
}

impl ReorderError {
    /// Build the persistence error for a failed write
    pub fn from_write(failed_at: usize, total: usize, item_id: &str, error: &DomainError) -> Self {
        let message = error.to_string();
        let item_id = item_id.to_string();
        match error {
            DomainError::Transient(_) | DomainError::Internal(_) => {
                ReorderError::TransientNetworkFailure {
                    failed_at,
                    total,
                    item_id,
                    message,
                }
            }
            DomainError::NotFound(_) | DomainError::InvalidInput(_) | DomainError::Rejected(_) => {
                ReorderError::ValidationRejection {
                    failed_at,
                    total,
                    item_id,
                    message,
                }
            }
        }
    }

    /// Whether the error came out of the persistence step
    pub fn is_persistence_failure(&self) -> bool {
        matches!(
            self,
            ReorderError::TransientNetworkFailure { .. } | ReorderError::ValidationRejection { .. }
        )
    }
}
