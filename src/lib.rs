//! Catalog Admin Backend
//!
//! Layered architecture:
//! - domain: Catalog entities, resequencing scopes and errors
//! - repository: Backend access (REST, cached, in-memory)
//! - ordering: Drag-reorder resequencing engine
//! - commands: Handlers invoked by the admin shell
//! - config: Settings file and environment overrides

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::sync::Mutex;

pub mod domain;
pub mod repository;
pub mod ordering;
pub mod commands;
pub mod config;

use config::AdminConfig;
use domain::{DomainError, DomainResult, ScopeContext};
use ordering::{ChannelObserver, ReorderEvent, ReorderObserver, ReorderSession};
use repository::{CachedRepository, HttpRepository, PositionRepository};

/// Application state shared across commands
pub struct AppState {
    pub repo: Arc<dyn PositionRepository>,
    pub events: UnboundedSender<ReorderEvent>,
    /// Open reorder sessions, one per scope
    pub sessions: Mutex<HashMap<ScopeContext, Arc<ReorderSession>>>,
}

impl AppState {
    pub fn new(repo: Arc<dyn PositionRepository>, events: UnboundedSender<ReorderEvent>) -> Self {
        Self {
            repo,
            events,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn observer(&self) -> Arc<dyn ReorderObserver> {
        Arc::new(ChannelObserver::new(self.events.clone()))
    }
}

/// Set up logging and the REST backend. The receiver yields every
/// `ReorderEvent` for the shell to forward to its frontend.
pub fn bootstrap(config: &AdminConfig) -> DomainResult<(AppState, UnboundedReceiver<ReorderEvent>)> {
    if let Some(dir) = &config.log_dir {
        match rolling_logger::init_logger(dir.clone(), &config.app_name) {
            Ok(()) | Err(rolling_logger::LoggerError::AlreadyInitialized) => {}
            Err(e) => return Err(DomainError::Internal(format!("Failed to init logger: {}", e))),
        }
        let _ = rolling_logger::info(&format!("{} starting", config.app_name));
    }

    let http = HttpRepository::from_config(config)?;
    log::info!(
        "catalog backend at {} (timeout {} ms)",
        http.base_url(),
        config.request_timeout_ms
    );
    let repo: Arc<dyn PositionRepository> = Arc::new(CachedRepository::new(http));

    let (tx, rx) = unbounded_channel();
    Ok((AppState::new(repo, tx), rx))
}
