//! Repository Layer - Core Traits
//!
//! Defines the abstract interface the reorder engine talks to.
//! Implementations can use the REST backend, a cache, in-memory, etc.

use async_trait::async_trait;
use crate::domain::{DomainResult, RemoteRecord, ScopeContext};

/// Backend access for ordered catalog lists
///
/// The backend only understands "set this one entity's position";
/// there is no bulk reorder.
#[async_trait]
pub trait PositionRepository: Send + Sync {
    /// List the entities of a scope in the backend's order
    async fn list(&self, scope: &ScopeContext) -> DomainResult<Vec<RemoteRecord>>;

    /// Set one entity's position. Absolute, so replaying is harmless.
    async fn set_position(&self, scope: &ScopeContext, id: &str, position: u32) -> DomainResult<()>;

    /// Drop anything cached for the scope so the next `list` hits the backend
    async fn invalidate(&self, _scope: &ScopeContext) {}
}
