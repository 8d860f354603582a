//! Scripted repository for engine tests: records calls, fails chosen writes,
//! and can hold writes behind a semaphore.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

use crate::domain::{DomainError, DomainResult, RemoteRecord, ScopeContext};
use super::memory_repo::MemoryRepository;
use super::traits::PositionRepository;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List,
    Put { id: String, position: u32 },
}

pub struct ScriptedRepository {
    inner: MemoryRepository,
    calls: Mutex<Vec<Call>>,
    write_failures: Mutex<HashMap<usize, DomainError>>,
    list_failures: Mutex<VecDeque<DomainError>>,
    foreign_writes: Mutex<Vec<(String, u32)>>,
    gate: Option<Arc<Semaphore>>,
    list_gate: Option<Arc<Semaphore>>,
}

impl ScriptedRepository {
    pub fn new(inner: MemoryRepository) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
            write_failures: Mutex::new(HashMap::new()),
            list_failures: Mutex::new(VecDeque::new()),
            foreign_writes: Mutex::new(Vec::new()),
            gate: None,
            list_gate: None,
        }
    }

    /// Every write waits for a permit from the returned semaphore
    pub fn gated(inner: MemoryRepository) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let mut repo = Self::new(inner);
        repo.gate = Some(gate.clone());
        (repo, gate)
    }

    /// Every list waits for a permit from the returned semaphore
    pub fn gated_lists(inner: MemoryRepository) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let mut repo = Self::new(inner);
        repo.list_gate = Some(gate.clone());
        (repo, gate)
    }

    pub fn memory(&self) -> &MemoryRepository {
        &self.inner
    }

    /// Fail the `n`th write (1-based, counted since the last `clear_calls`)
    pub fn fail_write(&self, n: usize, error: DomainError) {
        self.write_failures.lock().unwrap().insert(n, error);
    }

    pub fn fail_next_list(&self, error: DomainError) {
        self.list_failures.lock().unwrap().push_back(error);
    }

    /// Apply a write from "another operator" right before the next list
    pub fn foreign_write_before_next_list(&self, id: &str, position: u32) {
        self.foreign_writes
            .lock()
            .unwrap()
            .push((id.to_string(), position));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn puts(&self) -> Vec<(String, u32)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Put { id, position } => Some((id, position)),
                Call::List => None,
            })
            .collect()
    }

    pub fn list_calls(&self) -> usize {
        self.calls().iter().filter(|c| **c == Call::List).count()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }
}

#[async_trait]
impl PositionRepository for ScriptedRepository {
    async fn list(&self, scope: &ScopeContext) -> DomainResult<Vec<RemoteRecord>> {
        self.calls.lock().unwrap().push(Call::List);
        if let Some(gate) = &self.list_gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }

        let foreign: Vec<(String, u32)> = self.foreign_writes.lock().unwrap().drain(..).collect();
        for (id, position) in foreign {
            self.inner.set_position(scope, &id, position).await?;
        }

        let failure = self.list_failures.lock().unwrap().pop_front();
        if let Some(error) = failure {
            return Err(error);
        }
        self.inner.list(scope).await
    }

    async fn set_position(&self, scope: &ScopeContext, id: &str, position: u32) -> DomainResult<()> {
        let attempt = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(Call::Put {
                id: id.to_string(),
                position,
            });
            calls.iter().filter(|c| matches!(c, Call::Put { .. })).count()
        };

        if let Some(gate) = &self.gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }

        let failure = self.write_failures.lock().unwrap().remove(&attempt);
        if let Some(error) = failure {
            return Err(error);
        }
        self.inner.set_position(scope, id, position).await
    }
}
