//! Store contract for the synchronization engine.
//!
//! The reconciler and sweeper talk to the local data store only through
//! [`SyncStore`]; `procesal-db` provides the Postgres implementation and
//! tests inject in-memory doubles.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::ids::{CaseId, NotificationId, ProcessActionId, TrackedProcessId};
use crate::model::{
    ActionChanges, CaseRef, NewNotification, NewProcessAction, NewTrackedProcess, ProcessAction,
    TrackedProcess,
};

/// Error from the local data store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying database failure.
    #[error("database error: {0}")]
    Database(String),

    /// A row expected to exist was not found.
    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },

    /// A natural-key uniqueness constraint was violated.
    #[error("duplicate {resource}: {key}")]
    Duplicate { resource: &'static str, key: String },
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence operations needed by the reconciler and sweeper.
///
/// Every write is idempotent on a natural key (case id for the tracked
/// process, `(tracked_process_id, external_id)` for actions), so a crash
/// between writes is safely resumable on the next sweep.
#[async_trait]
pub trait SyncStore: Send + Sync {
    /// Cases eligible for a sweep: open, with a non-blank radicado, and
    /// with the owning firm's country resolved.
    async fn eligible_cases(&self) -> StoreResult<Vec<CaseRef>>;

    /// Load a single eligible case by id, for the on-demand entry point.
    async fn case_by_id(&self, case_id: CaseId) -> StoreResult<Option<CaseRef>>;

    /// Load the tracked process mirroring a case, if one exists.
    async fn find_tracked_process(&self, case_id: CaseId) -> StoreResult<Option<TrackedProcess>>;

    /// Create the tracked process for a case on first sync.
    async fn create_tracked_process(&self, new: NewTrackedProcess) -> StoreResult<TrackedProcess>;

    /// Refresh the reconciliation heartbeat.
    async fn touch_tracking(&self, id: TrackedProcessId, at: DateTime<Utc>) -> StoreResult<()>;

    /// Record the timestamp of the most recent remote action.
    async fn set_last_activity(&self, id: TrackedProcessId, at: DateTime<Utc>) -> StoreResult<()>;

    /// Find a mirrored action by its correlation key.
    async fn find_action(
        &self,
        tracked_process_id: TrackedProcessId,
        external_id: &str,
    ) -> StoreResult<Option<ProcessAction>>;

    /// Create a newly observed action.
    async fn create_action(&self, new: NewProcessAction) -> StoreResult<ProcessAction>;

    /// Apply a changed target state to an existing action.
    async fn update_action(&self, id: ProcessActionId, changes: ActionChanges) -> StoreResult<()>;

    /// Create an internal notification record.
    async fn create_notification(&self, new: NewNotification) -> StoreResult<NotificationId>;
}
