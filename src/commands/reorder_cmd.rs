//! Reorder Commands
//!
//! One reorder session per scope, opened when a list screen mounts and
//! dropped when it unmounts or switches scope.

use std::sync::Arc;

use crate::domain::{Item, MoveRequest, ScopeContext};
use crate::ordering::{MoveReport, ReorderError, ReorderSession};
use crate::AppState;

/// Session currently registered for `scope`
async fn session_for(state: &AppState, scope: &ScopeContext) -> Result<Arc<ReorderSession>, String> {
    // Registry lock is released before the session does any I/O
    state
        .sessions
        .lock()
        .await
        .get(scope)
        .cloned()
        .ok_or_else(|| format!("No open list for {}", scope))
}

/// Busy error when the session registered for `scope` is mid-operation
async fn ensure_replaceable(state: &AppState, scope: &ScopeContext) -> Result<(), String> {
    match state.sessions.lock().await.get(scope) {
        Some(existing) if existing.is_busy() => {
            Err(ReorderError::Busy(scope.to_string()).to_string())
        }
        _ => Ok(()),
    }
}

/// Load a list for display and register its session. An idle session for the
/// same scope is replaced; a busy one keeps the scope until it settles.
pub async fn open_reorder_list(state: &AppState, scope: ScopeContext) -> Result<Vec<Item>, String> {
    ensure_replaceable(state, &scope).await?;
    let session = ReorderSession::open(scope.clone(), state.repo.clone(), state.observer())
        .await
        .map_err(|e| e.to_string())?;
    let items = session.items();

    let mut sessions = state.sessions.lock().await;
    // A move may have started on the old session while this one was loading
    if let Some(existing) = sessions.get(&scope) {
        if existing.is_busy() {
            log::debug!("{}: reopen refused, session is {}", scope, existing.state());
            return Err(ReorderError::Busy(scope.to_string()).to_string());
        }
    }
    if sessions.insert(scope.clone(), Arc::new(session)).is_some() {
        log::debug!("{}: replaced idle session", scope);
    }
    Ok(items)
}

/// Drop the session of a list that is no longer shown. A busy session stays
/// registered, otherwise a remount could start a second writer on the scope.
pub async fn close_reorder_list(state: &AppState, scope: ScopeContext) -> Result<bool, String> {
    let mut sessions = state.sessions.lock().await;
    if sessions.get(&scope).is_some_and(|s| s.is_busy()) {
        return Err(ReorderError::Busy(scope.to_string()).to_string());
    }
    Ok(sessions.remove(&scope).is_some())
}

/// Apply a drag-drop move
pub async fn request_move(
    state: &AppState,
    scope: ScopeContext,
    item_id: String,
    from_index: usize,
    to_index: usize,
) -> Result<MoveReport, String> {
    let session = session_for(state, &scope).await?;
    session
        .request_move(MoveRequest::new(item_id, from_index, to_index))
        .await
        .map_err(|e| e.to_string())
}

/// Rewrite stored positions of a list to 1..N
pub async fn normalize_order(state: &AppState, scope: ScopeContext) -> Result<MoveReport, String> {
    let session = session_for(state, &scope).await?;
    session.normalize().await.map_err(|e| e.to_string())
}

/// Reload a list from the backend and return its order
pub async fn refresh_order(state: &AppState, scope: ScopeContext) -> Result<Vec<Item>, String> {
    let session = session_for(state, &scope).await?;
    session.refresh().await.map_err(|e| e.to_string())?;
    Ok(session.items())
}

pub async fn current_order(state: &AppState, scope: ScopeContext) -> Result<Vec<Item>, String> {
    Ok(session_for(state, &scope).await?.items())
}

/// Whether dragging is currently disabled for a list
pub async fn is_reorder_busy(state: &AppState, scope: ScopeContext) -> Result<bool, String> {
    Ok(session_for(state, &scope).await?.is_busy())
}
