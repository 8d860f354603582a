//! Resynchronizer
//!
//! Discards the cached list for a scope and reloads the backend's order into
//! the collection. Last confirmed fetch wins: a different order than expected
//! (another operator's edit, or a partial write) is reported as drift and accepted.

use std::sync::Mutex;

use crate::domain::{DomainResult, ScopeContext};
use crate::repository::PositionRepository;
use super::collection::OrderedCollection;
use super::lock;

/// Result of a reconcile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resynced {
    /// Canonical order differs from what the client expected
    pub drifted: bool,
}

pub struct Resynchronizer<'a> {
    repo: &'a dyn PositionRepository,
}

impl<'a> Resynchronizer<'a> {
    pub fn new(repo: &'a dyn PositionRepository) -> Self {
        Self { repo }
    }

    /// Refetch `scope` and replace the collection. On error the collection is untouched.
    pub async fn run(
        &self,
        scope: &ScopeContext,
        collection: &Mutex<OrderedCollection>,
        expected: &[String],
    ) -> DomainResult<Resynced> {
        self.repo.invalidate(scope).await;
        let records = self.repo.list(scope).await?;

        let mut fresh = OrderedCollection::new(scope.clone());
        fresh.load(records)?;
        let drifted = fresh.ids() != expected;
        if drifted {
            log::info!(
                "{}: server order differs from expected, accepting server order",
                scope
            );
        }
        *lock(collection) = fresh;
        Ok(Resynced { drifted })
    }
}
