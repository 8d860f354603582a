//! Ordered Collection
//!
//! Client-visible ordering of one scope. Positions are always exactly 1..N in
//! display order; every operation that produces an ordering renumbers.

use std::collections::HashSet;

use crate::domain::{DomainError, DomainResult, Item, RemoteRecord, ScopeContext};
use super::error::ReorderError;

/// Saved ordering used for rollback
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    items: Vec<Item>,
}

impl Snapshot {
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn ids(&self) -> Vec<String> {
        self.items.iter().map(|i| i.id.clone()).collect()
    }
}

#[derive(Debug, Clone)]
pub struct OrderedCollection {
    scope: ScopeContext,
    items: Vec<Item>,
}

impl OrderedCollection {
    pub fn new(scope: ScopeContext) -> Self {
        Self {
            scope,
            items: Vec::new(),
        }
    }

    pub fn scope(&self) -> &ScopeContext {
        &self.scope
    }

    /// Replace the working set with the backend's order, renumbered 1..N.
    ///
    /// Records are ordered by `sortOrder` (missing last, ties keep response order).
    pub fn load(&mut self, records: Vec<RemoteRecord>) -> DomainResult<()> {
        let mut records = records;
        records.sort_by_key(|r| (r.sort_order.is_none(), r.sort_order));

        let mut seen = HashSet::new();
        let mut items = Vec::with_capacity(records.len());
        for record in records {
            if !seen.insert(record.id.clone()) {
                return Err(DomainError::InvalidInput(format!(
                    "Duplicate id {} in {}",
                    record.id, self.scope
                )));
            }
            items.push(Item::new(record.id, 0, record.payload));
        }
        renumber(&mut items);
        self.items = items;
        Ok(())
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn ids(&self) -> Vec<String> {
        self.items.iter().map(|i| i.id.clone()).collect()
    }

    pub fn positions(&self) -> Vec<u32> {
        self.items.iter().map(|i| i.position).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn index_of(&self, item_id: &str) -> Option<usize> {
        self.items.iter().position(|i| i.id == item_id)
    }

    /// New full ordering with `item_id` at `to_index`. Does not modify `self`.
    pub fn move_item(&self, item_id: &str, to_index: usize) -> Result<Vec<Item>, ReorderError> {
        let from = self.index_of(item_id).ok_or_else(|| {
            ReorderError::InvalidMove(format!("{} is not in {}", item_id, self.scope))
        })?;
        if to_index >= self.items.len() {
            return Err(ReorderError::InvalidMove(format!(
                "target index {} is out of range for {} items",
                to_index,
                self.items.len()
            )));
        }

        let mut ordering = self.items.clone();
        let item = ordering.remove(from);
        ordering.insert(to_index, item);
        renumber(&mut ordering);
        Ok(ordering)
    }

    /// Install an ordering produced by `move_item` (the optimistic update)
    pub fn replace(&mut self, ordering: Vec<Item>) -> Result<(), ReorderError> {
        check_permutation(&ordering)?;
        let current: HashSet<&str> = self.items.iter().map(|i| i.id.as_str()).collect();
        let next: HashSet<&str> = ordering.iter().map(|i| i.id.as_str()).collect();
        if current != next {
            return Err(ReorderError::InvariantViolation(format!(
                "ordering for {} does not contain the same items",
                self.scope
            )));
        }
        self.items = ordering;
        Ok(())
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            items: self.items.clone(),
        }
    }

    pub fn restore(&mut self, snapshot: Snapshot) {
        self.items = snapshot.items;
    }

    /// Positions are exactly 1..N in display order
    pub fn is_permutation(&self) -> bool {
        check_permutation(&self.items).is_ok()
    }
}

/// Assign positions 1..N in slice order
pub fn renumber(items: &mut [Item]) {
    for (i, item) in items.iter_mut().enumerate() {
        item.position = i as u32 + 1;
    }
}

fn check_permutation(items: &[Item]) -> Result<(), ReorderError> {
    let mut ids = HashSet::new();
    for (i, item) in items.iter().enumerate() {
        if item.position != i as u32 + 1 {
            return Err(ReorderError::InvariantViolation(format!(
                "{} has position {} at index {}",
                item.id, item.position, i
            )));
        }
        if !ids.insert(item.id.as_str()) {
            return Err(ReorderError::InvariantViolation(format!(
                "{} appears twice",
                item.id
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn collection(ids: &[&str]) -> OrderedCollection {
        let mut c = OrderedCollection::new(ScopeContext::products_in("sub-1"));
        let records = ids
            .iter()
            .enumerate()
            .map(|(i, id)| RemoteRecord::new(*id, Some(i as i64 + 1), json!({ "id": id })))
            .collect();
        c.load(records).unwrap();
        c
    }

    fn ids_of(items: &[Item]) -> Vec<&str> {
        items.iter().map(|i| i.id.as_str()).collect()
    }

    #[test]
    fn test_load_renumbers_server_order() {
        let mut c = OrderedCollection::new(ScopeContext::products_in("sub-1"));
        c.load(vec![
            RemoteRecord::new("b", Some(20), json!({})),
            RemoteRecord::new("x", None, json!({})),
            RemoteRecord::new("a", Some(10), json!({})),
            RemoteRecord::new("c", Some(20), json!({})),
        ])
        .unwrap();

        assert_eq!(c.ids(), vec!["a", "b", "c", "x"]);
        assert_eq!(c.positions(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_load_rejects_duplicates() {
        let mut c = OrderedCollection::new(ScopeContext::products_in("sub-1"));
        let err = c
            .load(vec![
                RemoteRecord::new("a", Some(1), json!({})),
                RemoteRecord::new("a", Some(2), json!({})),
            ])
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[test]
    fn test_move_last_to_front() {
        let c = collection(&["A", "B", "C", "D"]);
        let ordering = c.move_item("D", 0).unwrap();

        assert_eq!(ids_of(&ordering), vec!["D", "A", "B", "C"]);
        assert_eq!(ordering.iter().map(|i| i.position).collect::<Vec<_>>(), vec![1, 2, 3, 4]);
        // Pure: the collection itself is untouched
        assert_eq!(c.ids(), vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn test_move_forward() {
        let c = collection(&["A", "B", "C", "D"]);
        let ordering = c.move_item("A", 2).unwrap();
        assert_eq!(ids_of(&ordering), vec!["B", "C", "A", "D"]);
    }

    #[test]
    fn test_move_rejects_unknown_and_out_of_range() {
        let c = collection(&["A", "B"]);
        assert!(matches!(c.move_item("Z", 0), Err(ReorderError::InvalidMove(_))));
        assert!(matches!(c.move_item("A", 2), Err(ReorderError::InvalidMove(_))));
    }

    #[test]
    fn test_snapshot_restore() {
        let mut c = collection(&["A", "B", "C"]);
        let snapshot = c.snapshot();

        c.replace(c.move_item("C", 0).unwrap()).unwrap();
        assert_eq!(c.ids(), vec!["C", "A", "B"]);

        c.restore(snapshot.clone());
        assert_eq!(c.items(), snapshot.items());
    }

    #[test]
    fn test_replace_rejects_foreign_items() {
        let mut c = collection(&["A", "B"]);
        let other = collection(&["A", "Z"]).items().to_vec();
        assert!(matches!(c.replace(other), Err(ReorderError::InvariantViolation(_))));
    }

    #[test]
    fn test_replace_rejects_gaps() {
        let mut c = collection(&["A", "B"]);
        let mut ordering = c.items().to_vec();
        ordering[1].position = 3;
        assert!(matches!(c.replace(ordering), Err(ReorderError::InvariantViolation(_))));
        assert!(c.is_permutation());
    }

    proptest! {
        #[test]
        fn prop_moves_keep_permutation(
            n in 1usize..12,
            moves in proptest::collection::vec((0usize..12, 0usize..12), 0..20),
        ) {
            let ids: Vec<String> = (0..n).map(|i| format!("item-{}", i)).collect();
            let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
            let mut c = collection(&refs);

            for (from, to) in moves {
                let from = from % n;
                let to = to % n;
                let id = c.items()[from].id.clone();
                let ordering = c.move_item(&id, to).unwrap();
                c.replace(ordering).unwrap();

                prop_assert_eq!(c.positions(), (1..=n as u32).collect::<Vec<_>>());
                prop_assert_eq!(c.index_of(&id), Some(to));
            }

            let mut sorted = c.ids();
            sorted.sort();
            let mut expected = ids.clone();
            expected.sort();
            prop_assert_eq!(sorted, expected);
        }
    }
}
