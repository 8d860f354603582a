//! Wire Format
//!
//! JSON shapes exchanged with the catalog REST backend.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

use crate::domain::{DomainError, DomainResult, RemoteRecord};

/// Body of `PUT /{resource}/{id}`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SortOrderBody {
    pub sort_order: u32,
}

/// List responses come either bare or wrapped in `data`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListResponse {
    Bare(Vec<Value>),
    Wrapped { data: Vec<Value> },
}

/// Parse a list response body into records, keeping each element as payload
pub fn parse_list(body: Value) -> DomainResult<Vec<RemoteRecord>> {
    let entries = match serde_json::from_value::<ListResponse>(body)
        .map_err(|e| DomainError::Internal(format!("Unexpected list response: {}", e)))?
    {
        ListResponse::Bare(entries) => entries,
        ListResponse::Wrapped { data } => data,
    };

    let mut seen = HashSet::new();
    let mut records = Vec::with_capacity(entries.len());
    for entry in entries {
        let record = parse_record(entry)?;
        if !seen.insert(record.id.clone()) {
            return Err(DomainError::InvalidInput(format!(
                "Duplicate id {} in list response",
                record.id
            )));
        }
        records.push(record);
    }
    Ok(records)
}

fn parse_record(entry: Value) -> DomainResult<RemoteRecord> {
    let id = match entry.get("id") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => {
            return Err(DomainError::InvalidInput(format!(
                "List entry without a usable id: {}",
                entry
            )))
        }
    };
    let sort_order = entry.get("sortOrder").and_then(Value::as_i64);
    Ok(RemoteRecord::new(id, sort_order, entry))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_bare_list() {
        let records = parse_list(json!([
            {"id": "a", "sortOrder": 2, "name": "Alpha"},
            {"id": 7, "sortOrder": 1},
        ]))
        .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "a");
        assert_eq!(records[0].sort_order, Some(2));
        assert_eq!(records[0].payload["name"], "Alpha");
        assert_eq!(records[1].id, "7");
    }

    #[test]
    fn test_parse_wrapped_list_without_sort_order() {
        let records = parse_list(json!({"data": [{"id": "x"}], "total": 1})).unwrap();
        assert_eq!(records[0].sort_order, None);
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let err = parse_list(json!([{"id": "a"}, {"id": "a"}])).unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[test]
    fn test_rejects_missing_id() {
        assert!(parse_list(json!([{"name": "nameless"}])).is_err());
        assert!(parse_list(json!({"items": []})).is_err());
    }

    #[test]
    fn test_sort_order_body() {
        let body = serde_json::to_value(SortOrderBody { sort_order: 3 }).unwrap();
        assert_eq!(body, json!({"sortOrder": 3}));
    }
}
