//! Rollback Controller
//!
//! Puts the client view back to the snapshot taken before the optimistic
//! update, however many writes already landed. The reconcile that follows
//! picks up whatever partial state the backend actually holds.

use super::collection::{OrderedCollection, Snapshot};
use super::error::ReorderError;
use super::sequencer::SequenceFailure;

pub struct RollbackController;

impl RollbackController {
    /// Restore `snapshot` and turn the failure into the session's one error.
    /// Never retries.
    pub fn rollback(
        collection: &mut OrderedCollection,
        snapshot: Snapshot,
        failure: &SequenceFailure,
    ) -> ReorderError {
        log::warn!(
            "{}: write {}/{} ({} -> {}) failed: {}; {} write(s) already persisted, restoring previous order",
            collection.scope(),
            failure.index + 1,
            failure.total,
            failure.change.item_id,
            failure.change.new_position,
            failure.error,
            failure.persisted()
        );
        collection.restore(snapshot);
        ReorderError::from_write(
            failure.index + 1,
            failure.total,
            &failure.change.item_id,
            &failure.error,
        )
    }
}
