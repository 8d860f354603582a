//! Persistence Sequencer
//!
//! Writes a position diff one item at a time, in ascending new-position order,
//! waiting for each acknowledgement before sending the next write. Does not
//! touch the client collection.

use crate::domain::{DomainError, ScopeContext};
use crate::repository::PositionRepository;
use super::planner::{PositionChange, PositionDiff};

/// Where a sequence stopped. Writes before `index` are persisted, the rest are not.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceFailure {
    /// 0-based index of the failed write
    pub index: usize,
    pub total: usize,
    pub change: PositionChange,
    pub error: DomainError,
}

impl SequenceFailure {
    /// Number of writes the backend acknowledged before the failure
    pub fn persisted(&self) -> usize {
        self.index
    }
}

pub struct PersistenceSequencer<'a> {
    repo: &'a dyn PositionRepository,
    scope: &'a ScopeContext,
}

impl<'a> PersistenceSequencer<'a> {
    pub fn new(repo: &'a dyn PositionRepository, scope: &'a ScopeContext) -> Self {
        Self { repo, scope }
    }

    /// Apply every change in order. `on_ack` receives the number of acknowledged
    /// writes after each one lands. Returns the number of writes on success.
    pub async fn run<F>(&self, diff: &PositionDiff, mut on_ack: F) -> Result<usize, SequenceFailure>
    where
        F: FnMut(usize) + Send,
    {
        let total = diff.len();
        for (index, change) in diff.iter().enumerate() {
            log::debug!(
                "{}: write {}/{} {} {} -> {}",
                self.scope,
                index + 1,
                total,
                change.item_id,
                change.old_position,
                change.new_position
            );
            if let Err(error) = self
                .repo
                .set_position(self.scope, &change.item_id, change.new_position)
                .await
            {
                return Err(SequenceFailure {
                    index,
                    total,
                    change: change.clone(),
                    error,
                });
            }
            on_ack(index + 1);
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ordering::ReorderPlanner;
    use crate::repository::testing::{Call, ScriptedRepository};
    use crate::repository::MemoryRepository;

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    async fn setup() -> (ScriptedRepository, ScopeContext) {
        let scope = ScopeContext::products_in("sub-1");
        let memory = MemoryRepository::new();
        memory.seed_ids(&scope, &["A", "B", "C", "D"]).await;
        (ScriptedRepository::new(memory), scope)
    }

    #[tokio::test]
    async fn test_writes_in_diff_order() {
        let (repo, scope) = setup().await;
        let diff = ReorderPlanner::plan(&ids(&["A", "B", "C", "D"]), &ids(&["D", "A", "B", "C"])).unwrap();

        let mut acks = Vec::new();
        let written = PersistenceSequencer::new(&repo, &scope)
            .run(&diff, |n| acks.push(n))
            .await
            .unwrap();

        assert_eq!(written, 4);
        assert_eq!(acks, vec![1, 2, 3, 4]);
        assert_eq!(
            repo.puts(),
            vec![
                ("D".to_string(), 1),
                ("A".to_string(), 2),
                ("B".to_string(), 3),
                ("C".to_string(), 4)
            ]
        );
        assert_eq!(repo.memory().ordered_ids(&scope).await, vec!["D", "A", "B", "C"]);
    }

    #[tokio::test]
    async fn test_stops_at_first_failure() {
        let (repo, scope) = setup().await;
        repo.fail_write(3, DomainError::Transient("502 Bad Gateway".into()));
        let diff = ReorderPlanner::plan(&ids(&["A", "B", "C", "D"]), &ids(&["D", "A", "B", "C"])).unwrap();

        let failure = PersistenceSequencer::new(&repo, &scope)
            .run(&diff, |_| {})
            .await
            .unwrap_err();

        assert_eq!(failure.index, 2);
        assert_eq!(failure.persisted(), 2);
        assert_eq!(failure.change.item_id, "B");
        // Nothing after the failed write is attempted
        assert_eq!(repo.puts().len(), 3);
        let records = repo.memory().records(&scope).await;
        let c = records.iter().find(|r| r.id == "C").unwrap();
        assert_eq!(c.sort_order, Some(3));
    }

    #[tokio::test]
    async fn test_empty_diff_makes_no_calls() {
        let (repo, scope) = setup().await;
        let order = ids(&["A", "B", "C", "D"]);
        let diff = ReorderPlanner::plan(&order, &order).unwrap();

        let written = PersistenceSequencer::new(&repo, &scope)
            .run(&diff, |_| {})
            .await
            .unwrap();

        assert_eq!(written, 0);
        assert!(repo.calls().is_empty());
    }

    #[tokio::test]
    async fn test_replaying_diff_is_idempotent() {
        let (repo, scope) = setup().await;
        let diff = ReorderPlanner::plan(&ids(&["A", "B", "C", "D"]), &ids(&["B", "D", "A", "C"])).unwrap();
        let sequencer = PersistenceSequencer::new(&repo, &scope);

        sequencer.run(&diff, |_| {}).await.unwrap();
        let once = repo.memory().records(&scope).await;
        sequencer.run(&diff, |_| {}).await.unwrap();

        assert_eq!(repo.memory().records(&scope).await, once);
        assert_eq!(repo.memory().ordered_ids(&scope).await, vec!["B", "D", "A", "C"]);
        assert!(!repo.calls().contains(&Call::List));
    }
}
