//! Reorder Planner
//!
//! Turns an old and a new ordering into the writes the backend needs. Only
//! items whose position actually changes are included, ascending by new position.

use serde::Serialize;
use std::collections::{HashMap, HashSet};

use super::error::ReorderError;

/// One item's position change
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionChange {
    pub item_id: String,
    /// Position before the move; 0 when the backend had none
    pub old_position: i64,
    pub new_position: u32,
}

/// Changed positions, sorted ascending by `new_position`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PositionDiff {
    changes: Vec<PositionChange>,
}

impl PositionDiff {
    pub fn changes(&self) -> &[PositionChange] {
        &self.changes
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PositionChange> {
        self.changes.iter()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

impl<'a> IntoIterator for &'a PositionDiff {
    type Item = &'a PositionChange;
    type IntoIter = std::slice::Iter<'a, PositionChange>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.iter()
    }
}

pub struct ReorderPlanner;

impl ReorderPlanner {
    /// Diff two display orders of the same ids (positions are index + 1)
    pub fn plan(old_order: &[String], new_order: &[String]) -> Result<PositionDiff, ReorderError> {
        let old_positions: Vec<(String, i64)> = old_order
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i as i64 + 1))
            .collect();
        Self::plan_from(&old_positions, new_order)
    }

    /// Diff arbitrary stored positions against a display order renumbered 1..N.
    ///
    /// Used for normalisation, where the stored values may have gaps or duplicates.
    pub fn plan_from(
        old_positions: &[(String, i64)],
        new_order: &[String],
    ) -> Result<PositionDiff, ReorderError> {
        let mut old: HashMap<&str, i64> = HashMap::with_capacity(old_positions.len());
        for (id, position) in old_positions {
            if old.insert(id.as_str(), *position).is_some() {
                return Err(ReorderError::InvariantViolation(format!(
                    "{} appears twice in the old ordering",
                    id
                )));
            }
        }
        if new_order.len() != old.len() {
            return Err(ReorderError::InvariantViolation(format!(
                "new ordering has {} items, old ordering has {}",
                new_order.len(),
                old.len()
            )));
        }

        let mut seen = HashSet::with_capacity(new_order.len());
        let mut taken = HashSet::with_capacity(new_order.len());
        let mut changes = Vec::new();
        for (i, id) in new_order.iter().enumerate() {
            let new_position = i as u32 + 1;
            if !seen.insert(id.as_str()) {
                return Err(ReorderError::InvariantViolation(format!(
                    "{} appears twice in the new ordering",
                    id
                )));
            }
            if !taken.insert(new_position) {
                return Err(ReorderError::InvariantViolation(format!(
                    "position {} assigned twice",
                    new_position
                )));
            }
            let old_position = *old.get(id.as_str()).ok_or_else(|| {
                ReorderError::InvariantViolation(format!("{} is not in the old ordering", id))
            })?;
            if old_position != new_position as i64 {
                changes.push(PositionChange {
                    item_id: id.clone(),
                    old_position,
                    new_position,
                });
            }
        }

        // Built in display order, which is already ascending by new position
        Ok(PositionDiff { changes })
    }
}
