//! Reorder Observers
//!
//! How a session talks back to the screen showing the list: the current order
//! (optimistic, rolled back, or reconciled) and at most one error per session.

use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;

use crate::domain::{Item, ScopeContext};

pub trait ReorderObserver: Send + Sync {
    /// The visible order changed
    fn on_order_changed(&self, scope: &ScopeContext, items: &[Item]);

    /// A session failed; `message` is user-facing
    fn on_error(&self, scope: &ScopeContext, message: &str);
}

/// Event payload delivered to the UI shell
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ReorderEvent {
    #[serde(rename_all = "camelCase")]
    OrderChanged {
        scope: ScopeContext,
        items: Vec<Item>,
        at: i64,
    },
    #[serde(rename_all = "camelCase")]
    Error {
        scope: ScopeContext,
        message: String,
        at: i64,
    },
}

impl ReorderEvent {
    pub fn scope(&self) -> &ScopeContext {
        match self {
            ReorderEvent::OrderChanged { scope, .. } | ReorderEvent::Error { scope, .. } => scope,
        }
    }
}

/// Forwards notifications over a channel
#[derive(Clone)]
pub struct ChannelObserver {
    sender: UnboundedSender<ReorderEvent>,
}

impl ChannelObserver {
    pub fn new(sender: UnboundedSender<ReorderEvent>) -> Self {
        Self { sender }
    }
}

impl ReorderObserver for ChannelObserver {
    fn on_order_changed(&self, scope: &ScopeContext, items: &[Item]) {
        // Receiver gone means the screen is gone
        let _ = self.sender.send(ReorderEvent::OrderChanged {
            scope: scope.clone(),
            items: items.to_vec(),
            at: chrono::Utc::now().timestamp_millis(),
        });
    }

    fn on_error(&self, scope: &ScopeContext, message: &str) {
        let _ = self.sender.send(ReorderEvent::Error {
            scope: scope.clone(),
            message: message.to_string(),
            at: chrono::Utc::now().timestamp_millis(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_channel_observer_serializes_events() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let observer = ChannelObserver::new(tx);
        let scope = ScopeContext::products_in("sub-1");

        observer.on_error(&scope, "boom");
        let event = rx.try_recv().unwrap();
        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(value["type"], "error");
        assert_eq!(value["message"], "boom");
        assert_eq!(value["scope"], json!({"resource": "product", "parentId": "sub-1"}));
        assert_eq!(event.scope(), &scope);
    }

    #[test]
    fn test_dropped_receiver_is_ignored() {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        drop(rx);
        ChannelObserver::new(tx).on_order_changed(&ScopeContext::products_in("s"), &[]);
    }
}
