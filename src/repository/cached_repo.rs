//! Cached Repository
//!
//! Keeps the last list response per scope so screens can re-render without
//! refetching. The resynchronizer calls `invalidate` to force a fresh read.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::domain::{DomainResult, RemoteRecord, ScopeContext};
use super::traits::PositionRepository;

pub struct CachedRepository<R> {
    inner: R,
    cache: Mutex<HashMap<ScopeContext, Vec<RemoteRecord>>>,
}

impl<R: PositionRepository> CachedRepository<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    pub async fn is_cached(&self, scope: &ScopeContext) -> bool {
        self.cache.lock().await.contains_key(scope)
    }
}

#[async_trait]
impl<R: PositionRepository> PositionRepository for CachedRepository<R> {
    async fn list(&self, scope: &ScopeContext) -> DomainResult<Vec<RemoteRecord>> {
        let mut cache = self.cache.lock().await;
        if let Some(records) = cache.get(scope) {
            return Ok(records.clone());
        }
        let records = self.inner.list(scope).await?;
        cache.insert(scope.clone(), records.clone());
        Ok(records)
    }

    async fn set_position(&self, scope: &ScopeContext, id: &str, position: u32) -> DomainResult<()> {
        self.inner.set_position(scope, id, position).await
    }

    async fn invalidate(&self, scope: &ScopeContext) {
        self.cache.lock().await.remove(scope);
        self.inner.invalidate(scope).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::testing::{Call, ScriptedRepository};
    use crate::repository::MemoryRepository;

    fn scope() -> ScopeContext {
        ScopeContext::products_in("sub-1")
    }

    async fn cached() -> CachedRepository<ScriptedRepository> {
        let memory = MemoryRepository::new();
        memory.seed_ids(&scope(), &["a", "b"]).await;
        CachedRepository::new(ScriptedRepository::new(memory))
    }

    #[tokio::test]
    async fn test_list_served_from_cache() {
        let repo = cached().await;

        repo.list(&scope()).await.unwrap();
        repo.list(&scope()).await.unwrap();

        assert_eq!(repo.inner().list_calls(), 1);
        assert!(repo.is_cached(&scope()).await);
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let repo = cached().await;

        repo.list(&scope()).await.unwrap();
        repo.set_position(&scope(), "b", 1).await.unwrap();
        repo.set_position(&scope(), "a", 2).await.unwrap();

        // Stale until invalidated
        let stale = repo.list(&scope()).await.unwrap();
        assert_eq!(stale[0].id, "a");

        repo.invalidate(&scope()).await;
        let fresh = repo.list(&scope()).await.unwrap();
        assert_eq!(fresh[0].id, "b");
        assert_eq!(repo.inner().list_calls(), 2);
    }

    #[tokio::test]
    async fn test_writes_pass_through() {
        let repo = cached().await;
        repo.set_position(&scope(), "a", 2).await.unwrap();

        assert_eq!(
            repo.inner().calls(),
            vec![Call::Put { id: "a".into(), position: 2 }]
        );
    }

    #[tokio::test]
    async fn test_failed_list_is_not_cached() {
        let repo = cached().await;
        repo.inner().fail_next_list(crate::domain::DomainError::Transient("down".into()));

        assert!(repo.list(&scope()).await.is_err());
        assert!(!repo.is_cached(&scope()).await);
        assert!(repo.list(&scope()).await.is_ok());
    }
}
