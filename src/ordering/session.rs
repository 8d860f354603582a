//! Reorder Session
//!
//! Per-scope state machine driving a drag-reorder from plan to reconcile:
//!
//! ```text
//! Idle -> Planning -> Persisting -> Reconciling -> Idle
//!                        |                ^
//!                        +-> RollingBack -+
//! ```
//!
//! `normalize` first fetches the stored positions in `Loading`, then plans
//! synchronously like a move. `refresh` goes straight from `Idle` to `Reconciling`.
//!
//! At most one operation runs per session. Requests arriving while the
//! session is not `Idle` are rejected with `ReorderError::Busy` and change nothing.

use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::domain::{Item, MoveRequest, ScopeContext};
use crate::repository::PositionRepository;
use super::collection::{OrderedCollection, Snapshot};
use super::error::ReorderError;
use super::lock;
use super::observer::ReorderObserver;
use super::planner::{PositionDiff, ReorderPlanner};
use super::resync::Resynchronizer;
use super::rollback::RollbackController;
use super::sequencer::PersistenceSequencer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionState {
    Idle,
    /// Fetching stored positions before planning a normalisation
    Loading,
    Planning,
    Persisting,
    RollingBack,
    Reconciling,
}

impl SessionState {
    pub fn can_transition_to(self, next: SessionState) -> bool {
        use SessionState::{Idle, Loading, Persisting, Planning, Reconciling, RollingBack};
        matches!(
            (self, next),
            (Idle, Planning)
                | (Idle, Loading)
                | (Idle, Reconciling)
                | (Loading, Planning)
                | (Loading, Idle)
                | (Planning, Persisting)
                | (Planning, Idle)
                | (Persisting, Reconciling)
                | (Persisting, RollingBack)
                | (RollingBack, Reconciling)
                | (Reconciling, Idle)
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Outcome of a completed operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveReport {
    /// Writes acknowledged by the backend
    pub writes: usize,
    /// Size of the diff
    pub total: usize,
    /// Reconciled order differed from the expected one
    pub drifted: bool,
}

impl MoveReport {
    pub fn unchanged() -> Self {
        Self {
            writes: 0,
            total: 0,
            drifted: false,
        }
    }
}

/// Data of the operation currently persisting
struct InFlight {
    snapshot: Option<Snapshot>,
    total: usize,
    cursor: usize,
}

pub struct ReorderSession {
    scope: ScopeContext,
    repo: Arc<dyn PositionRepository>,
    observer: Arc<dyn ReorderObserver>,
    collection: Mutex<OrderedCollection>,
    state: Mutex<SessionState>,
    flight: Mutex<Option<InFlight>>,
}

/// Holds the session out of `Idle`. Dropping it early (a cancelled future)
/// restores the snapshot and frees the session.
struct FlightGuard<'a> {
    session: &'a ReorderSession,
    done: bool,
}

impl FlightGuard<'_> {
    fn start(&self, snapshot: Snapshot, total: usize) {
        *lock(&self.session.flight) = Some(InFlight {
            snapshot: Some(snapshot),
            total,
            cursor: 0,
        });
    }

    fn take_snapshot(&self) -> Option<Snapshot> {
        lock(&self.session.flight)
            .as_mut()
            .and_then(|flight| flight.snapshot.take())
    }

    fn finish(mut self) {
        self.done = true;
        self.session.settle();
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        if let Some(snapshot) = self.take_snapshot() {
            lock(&self.session.collection).restore(snapshot);
        }
        log::warn!(
            "{}: operation abandoned in state {}, session reset",
            self.session.scope,
            self.session.state()
        );
        self.session.settle();
    }
}

impl ReorderSession {
    /// Session with an empty collection; call `refresh` to load it
    pub fn new(
        scope: ScopeContext,
        repo: Arc<dyn PositionRepository>,
        observer: Arc<dyn ReorderObserver>,
    ) -> Self {
        Self {
            collection: Mutex::new(OrderedCollection::new(scope.clone())),
            scope,
            repo,
            observer,
            state: Mutex::new(SessionState::Idle),
            flight: Mutex::new(None),
        }
    }

    /// Create the session for a list being shown and load its order
    pub async fn open(
        scope: ScopeContext,
        repo: Arc<dyn PositionRepository>,
        observer: Arc<dyn ReorderObserver>,
    ) -> Result<Self, ReorderError> {
        let session = Self::new(scope, repo, observer);
        session.refresh().await?;
        Ok(session)
    }

    pub fn scope(&self) -> &ScopeContext {
        &self.scope
    }

    pub fn state(&self) -> SessionState {
        *lock(&self.state)
    }

    /// The UI disables dragging while this is true
    pub fn is_busy(&self) -> bool {
        self.state() != SessionState::Idle
    }

    /// Current visible order
    pub fn items(&self) -> Vec<Item> {
        lock(&self.collection).items().to_vec()
    }

    pub fn ids(&self) -> Vec<String> {
        lock(&self.collection).ids()
    }

    /// `(acknowledged, total)` while writes are in flight
    pub fn progress(&self) -> Option<(usize, usize)> {
        lock(&self.flight)
            .as_ref()
            .map(|flight| (flight.cursor, flight.total))
    }

    /// Move `item_id` to `to_index` in the current order
    pub async fn move_to(&self, item_id: &str, to_index: usize) -> Result<MoveReport, ReorderError> {
        let from_index = lock(&self.collection).index_of(item_id).ok_or_else(|| {
            ReorderError::InvalidMove(format!("{} is not in {}", item_id, self.scope))
        })?;
        self.request_move(MoveRequest::new(item_id, from_index, to_index))
            .await
    }

    /// Run a drag-drop move end to end
    pub async fn request_move(&self, request: MoveRequest) -> Result<MoveReport, ReorderError> {
        let flight = self.begin(SessionState::Planning)?;

        let planned = {
            let collection = lock(&self.collection);
            Self::plan_move(&collection, &request)
        };
        let (snapshot, ordering, diff) = match planned {
            Ok(Some(planned)) => planned,
            Ok(None) => {
                flight.finish();
                return Ok(MoveReport::unchanged());
            }
            Err(err) => {
                flight.finish();
                if matches!(err, ReorderError::InvariantViolation(_)) {
                    self.report(&err);
                }
                return Err(err);
            }
        };

        log::debug!(
            "{}: move {} {} -> {} needs {} write(s)",
            self.scope,
            request.item_id,
            request.from_index,
            request.to_index,
            diff.len()
        );
        self.apply_optimistic(flight, snapshot, ordering, diff)
            .await
    }

    /// Rewrite the stored positions to exactly 1..N when the backend holds
    /// gaps, duplicates, or missing values. A clean list makes no writes.
    pub async fn normalize(&self) -> Result<MoveReport, ReorderError> {
        let flight = self.begin(SessionState::Loading)?;

        self.repo.invalidate(&self.scope).await;
        let records = match self.repo.list(&self.scope).await {
            Ok(records) => records,
            Err(err) => {
                flight.finish();
                let err = ReorderError::Resync(err);
                self.report(&err);
                return Err(err);
            }
        };

        if let Err(err) = self.transition(SessionState::Planning) {
            flight.finish();
            self.report(&err);
            return Err(err);
        }

        let stored: Vec<(String, i64)> = records
            .iter()
            .map(|r| (r.id.clone(), r.sort_order.unwrap_or(0)))
            .collect();
        let mut canonical = OrderedCollection::new(self.scope.clone());
        let planned = canonical
            .load(records)
            .map_err(ReorderError::Resync)
            .and_then(|_| ReorderPlanner::plan_from(&stored, &canonical.ids()));
        let diff = match planned {
            Ok(diff) => diff,
            Err(err) => {
                flight.finish();
                self.report(&err);
                return Err(err);
            }
        };

        if diff.is_empty() {
            let items = canonical.items().to_vec();
            *lock(&self.collection) = canonical;
            flight.finish();
            self.observer.on_order_changed(&self.scope, &items);
            return Ok(MoveReport::unchanged());
        }

        log::info!(
            "{}: normalising {} stored position(s)",
            self.scope,
            diff.len()
        );
        let snapshot = lock(&self.collection).snapshot();
        let ordering = canonical.items().to_vec();
        // The fresh list may differ in membership from the client view
        *lock(&self.collection) = canonical;
        self.apply_optimistic(flight, snapshot, ordering, diff)
            .await
    }

    /// Reload the canonical order while idle. Returns whether it drifted.
    pub async fn refresh(&self) -> Result<bool, ReorderError> {
        let flight = self.begin(SessionState::Reconciling)?;
        let expected = self.ids();

        let result = Resynchronizer::new(self.repo.as_ref())
            .run(&self.scope, &self.collection, &expected)
            .await;
        flight.finish();

        match result {
            Ok(resynced) => {
                self.observer.on_order_changed(&self.scope, &self.items());
                Ok(resynced.drifted)
            }
            Err(err) => {
                let err = ReorderError::Resync(err);
                self.report(&err);
                Err(err)
            }
        }
    }

    // ========================
    // Pipeline
    // ========================

    fn plan_move(
        collection: &OrderedCollection,
        request: &MoveRequest,
    ) -> Result<Option<(Snapshot, Vec<Item>, PositionDiff)>, ReorderError> {
        let current = collection.index_of(&request.item_id).ok_or_else(|| {
            ReorderError::InvalidMove(format!(
                "{} is not in {}",
                request.item_id,
                collection.scope()
            ))
        })?;
        if current != request.from_index {
            return Err(ReorderError::InvalidMove(format!(
                "{} is at index {}, not {}",
                request.item_id, current, request.from_index
            )));
        }

        let ordering = collection.move_item(&request.item_id, request.to_index)?;
        let new_order: Vec<String> = ordering.iter().map(|i| i.id.clone()).collect();
        let diff = ReorderPlanner::plan(&collection.ids(), &new_order)?;
        if diff.is_empty() {
            return Ok(None);
        }
        Ok(Some((collection.snapshot(), ordering, diff)))
    }

    /// Show `ordering` immediately, then persist, roll back on failure, and reconcile
    async fn apply_optimistic(
        &self,
        flight: FlightGuard<'_>,
        snapshot: Snapshot,
        ordering: Vec<Item>,
        diff: PositionDiff,
    ) -> Result<MoveReport, ReorderError> {
        let expected: Vec<String> = ordering.iter().map(|i| i.id.clone()).collect();
        let snapshot_ids = snapshot.ids();

        let applied = lock(&self.collection).replace(ordering);
        if let Err(err) = applied {
            flight.finish();
            self.report(&err);
            return Err(err);
        }
        flight.start(snapshot, diff.len());
        self.observer.on_order_changed(&self.scope, &self.items());

        // Persisting
        self.transition(SessionState::Persisting)?;
        let outcome = PersistenceSequencer::new(self.repo.as_ref(), &self.scope)
            .run(&diff, |acked| self.set_cursor(acked))
            .await;

        let (failure, expected) = match outcome {
            Ok(_) => (None, expected),
            Err(sequence_failure) => {
                self.transition(SessionState::RollingBack)?;
                let error = match flight.take_snapshot() {
                    Some(snapshot) => RollbackController::rollback(
                        &mut lock(&self.collection),
                        snapshot,
                        &sequence_failure,
                    ),
                    None => {
                        return Err(ReorderError::InvariantViolation(format!(
                            "{}: no snapshot to roll back to",
                            self.scope
                        )))
                    }
                };
                self.observer.on_order_changed(&self.scope, &self.items());
                (Some(error), snapshot_ids)
            }
        };
        // The optimistic order is confirmed (or rolled back), nothing left to restore
        flight.take_snapshot();

        // Reconciling
        self.transition(SessionState::Reconciling)?;
        let resync = Resynchronizer::new(self.repo.as_ref())
            .run(&self.scope, &self.collection, &expected)
            .await;
        flight.finish();

        match (failure, resync) {
            (None, Ok(resynced)) => {
                self.observer.on_order_changed(&self.scope, &self.items());
                log::info!(
                    "{}: saved {} position(s){}",
                    self.scope,
                    diff.len(),
                    if resynced.drifted { ", server order drifted" } else { "" }
                );
                Ok(MoveReport {
                    writes: diff.len(),
                    total: diff.len(),
                    drifted: resynced.drifted,
                })
            }
            (None, Err(err)) => {
                let err = ReorderError::Resync(err);
                self.report(&err);
                Err(err)
            }
            (Some(err), Ok(_)) => {
                self.observer.on_order_changed(&self.scope, &self.items());
                self.report(&err);
                Err(err)
            }
            (Some(err), Err(resync_err)) => {
                log::warn!(
                    "{}: reload after rollback failed: {}",
                    self.scope,
                    resync_err
                );
                self.report(&err);
                Err(err)
            }
        }
    }

    // ========================
    // State
    // ========================

    fn begin(&self, first: SessionState) -> Result<FlightGuard<'_>, ReorderError> {
        let mut state = lock(&self.state);
        if *state != SessionState::Idle {
            log::debug!("{}: rejected, session is {}", self.scope, *state);
            return Err(ReorderError::Busy(self.scope.to_string()));
        }
        debug_assert!(state.can_transition_to(first));
        *state = first;
        log::debug!("{}: Idle -> {}", self.scope, first);
        Ok(FlightGuard {
            session: self,
            done: false,
        })
    }

    fn transition(&self, next: SessionState) -> Result<(), ReorderError> {
        let mut state = lock(&self.state);
        if !state.can_transition_to(next) {
            let err = ReorderError::InvariantViolation(format!(
                "illegal transition {} -> {}",
                *state, next
            ));
            log::error!("{}: {}", self.scope, err);
            return Err(err);
        }
        log::debug!("{}: {} -> {}", self.scope, *state, next);
        *state = next;
        Ok(())
    }

    /// Back to `Idle`, dropping any in-flight data
    fn settle(&self) {
        *lock(&self.flight) = None;
        let mut state = lock(&self.state);
        if *state != SessionState::Idle {
            log::debug!("{}: {} -> Idle", self.scope, *state);
        }
        *state = SessionState::Idle;
    }

    fn set_cursor(&self, acked: usize) {
        if let Some(flight) = lock(&self.flight).as_mut() {
            flight.cursor = acked;
        }
    }

    fn report(&self, err: &ReorderError) {
        match err {
            ReorderError::InvariantViolation(_) => log::error!("{}: {}", self.scope, err),
            _ => log::warn!("{}: {}", self.scope, err),
        }
        self.observer.on_error(&self.scope, &err.to_string());
    }
}

impl fmt::Debug for ReorderSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReorderSession")
            .field("scope", &self.scope)
            .field("state", &self.state())
            .field("items", &self.ids())
            .finish()
    }
}
