//! Item Entity
//!
//! A catalog entry as seen by the reorder engine: an id, its 1-based position
//! within the scope, and the untouched entity data owned by the CRUD layer.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Entry of an ordered collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Unique within the collection
    pub id: String,
    /// 1-based position in display order
    pub position: u32,
    /// Entity data, never interpreted here
    pub payload: Value,
}

impl Item {
    pub fn new(id: impl Into<String>, position: u32, payload: Value) -> Self {
        Self {
            id: id.into(),
            position,
            payload,
        }
    }
}

/// Entity as returned by the backend list endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteRecord {
    pub id: String,
    /// Raw `sortOrder`; may have gaps, duplicates, or be missing
    pub sort_order: Option<i64>,
    pub payload: Value,
}

impl RemoteRecord {
    pub fn new(id: impl Into<String>, sort_order: Option<i64>, payload: Value) -> Self {
        Self {
            id: id.into(),
            sort_order,
            payload,
        }
    }
}

/// Drag gesture result: move `item_id` from `from_index` to `to_index` (0-based)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRequest {
    pub item_id: String,
    pub from_index: usize,
    pub to_index: usize,
}

impl MoveRequest {
    pub fn new(item_id: impl Into<String>, from_index: usize, to_index: usize) -> Self {
        Self {
            item_id: item_id.into(),
            from_index,
            to_index,
        }
    }
}
