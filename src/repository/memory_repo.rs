//! In-Memory Repository
//!
//! Backend stand-in holding records per scope. Lists come back ordered by
//! `sortOrder` (missing values last, ties in insertion order), the way the
//! REST backend orders them.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::domain::{DomainError, DomainResult, RemoteRecord, ScopeContext};
use super::traits::PositionRepository;

#[derive(Default)]
pub struct MemoryRepository {
    scopes: Mutex<HashMap<ScopeContext, Vec<RemoteRecord>>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the records of a scope
    pub async fn seed(&self, scope: &ScopeContext, records: Vec<RemoteRecord>) {
        self.scopes.lock().await.insert(scope.clone(), records);
    }

    /// Seed a scope with ids numbered 1..N in the given order
    pub async fn seed_ids(&self, scope: &ScopeContext, ids: &[&str]) {
        let records = ids
            .iter()
            .enumerate()
            .map(|(i, id)| {
                let sort_order = i as i64 + 1;
                RemoteRecord::new(*id, Some(sort_order), json!({"id": id, "sortOrder": sort_order}))
            })
            .collect();
        self.seed(scope, records).await;
    }

    /// Ids of a scope in backend order
    pub async fn ordered_ids(&self, scope: &ScopeContext) -> Vec<String> {
        sorted(self.records(scope).await)
            .into_iter()
            .map(|r| r.id)
            .collect()
    }

    /// Raw records of a scope in insertion order
    pub async fn records(&self, scope: &ScopeContext) -> Vec<RemoteRecord> {
        self.scopes
            .lock()
            .await
            .get(scope)
            .cloned()
            .unwrap_or_default()
    }
}

fn sorted(mut records: Vec<RemoteRecord>) -> Vec<RemoteRecord> {
    records.sort_by_key(|r| (r.sort_order.is_none(), r.sort_order));
    records
}

#[async_trait]
impl PositionRepository for MemoryRepository {
    async fn list(&self, scope: &ScopeContext) -> DomainResult<Vec<RemoteRecord>> {
        Ok(sorted(self.records(scope).await))
    }

    async fn set_position(&self, scope: &ScopeContext, id: &str, position: u32) -> DomainResult<()> {
        let mut scopes = self.scopes.lock().await;
        let record = scopes
            .get_mut(scope)
            .and_then(|records| records.iter_mut().find(|r| r.id == id))
            .ok_or_else(|| DomainError::NotFound(format!("{} {} not found", scope, id)))?;

        record.sort_order = Some(position as i64);
        if let Value::Object(map) = &mut record.payload {
            map.insert("sortOrder".to_string(), json!(position));
        }
        Ok(())
    }
}
