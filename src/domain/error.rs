//! Domain Layer - Core Errors

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Common result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level errors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum DomainError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// The backend refused the request (4xx other than timeouts/throttling)
    #[error("Rejected: {0}")]
    Rejected(String),
    /// Timeouts, connection failures, 5xx
    #[error("Network failure: {0}")]
    Transient(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    /// Whether the failure came from the transport rather than the backend's judgement
    pub fn is_transient(&self) -> bool {
        matches!(self, DomainError::Transient(_))
    }
}
