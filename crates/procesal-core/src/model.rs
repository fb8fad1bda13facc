//! Domain records for the synchronization engine.
//!
//! The remote schema varies per jurisdiction, so the provider-sourced
//! `details` and `metadata` containers are kept as open string-keyed JSON
//! maps rather than fixed structs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ids::{CaseId, NotificationId, ProcessActionId, TrackedProcessId};

/// The slice of a case the engine needs to reconcile it.
///
/// Produced by [`crate::store::SyncStore::eligible_cases`]: open cases with a
/// non-blank radicado, together with the owning firm's country used for
/// provider resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseRef {
    /// The owning case.
    pub case_id: CaseId,
    /// The court-assigned filing/docket number used for remote lookup.
    pub radicado: String,
    /// Country of the owning firm (provider registry key).
    pub country: String,
}

/// Local lifecycle status of a tracked process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessStatus {
    /// The mirror is live and swept on schedule.
    Active,
    /// Tracking has been suspended for this case.
    Suspended,
}

impl std::fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessStatus::Active => write!(f, "active"),
            ProcessStatus::Suspended => write!(f, "suspended"),
        }
    }
}

impl std::str::FromStr for ProcessStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(ProcessStatus::Active),
            "suspended" => Ok(ProcessStatus::Suspended),
            _ => Err(format!("Unknown process status: {s}")),
        }
    }
}

/// Local mirror of a case's remote judicial process.
///
/// At most one per case; created on the first successful reconciliation that
/// finds a remote match and never deleted by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedProcess {
    /// Row id.
    pub id: TrackedProcessId,

    /// The owning case (unique).
    pub case_id: CaseId,

    /// Provider-assigned process identifier in the remote system.
    pub process_id: String,

    /// Original filing number used for the lookup.
    pub radicado: String,

    /// Provider search fields merged with provider detail fields
    /// (department, office, subject, process type, judge, ...).
    pub details: Map<String, Value>,

    /// Visibility flag from the remote source.
    pub is_private: bool,

    /// Local lifecycle status.
    pub status: ProcessStatus,

    /// Heartbeat: when reconciliation last ran for this case, updated on
    /// every sweep regardless of change.
    pub last_tracking: DateTime<Utc>,

    /// Timestamp of the most recent remote action, for freshness display.
    pub last_activity_date: Option<DateTime<Utc>>,

    /// Record creation time.
    pub created_at: DateTime<Utc>,

    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

/// Fields needed to create a [`TrackedProcess`].
#[derive(Debug, Clone)]
pub struct NewTrackedProcess {
    pub case_id: CaseId,
    pub process_id: String,
    pub radicado: String,
    pub details: Map<String, Value>,
    pub is_private: bool,
}

/// One row per discrete remote docket event (actuación).
///
/// Correlated to the remote feed solely by
/// (`tracked_process_id`, `external_id`); created when first observed,
/// updated in place when a mutable field or the metadata map differs,
/// never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessAction {
    /// Row id.
    pub id: ProcessActionId,

    /// The owning tracked process.
    pub tracked_process_id: TrackedProcessId,

    /// Provider-assigned identifier, unique within the process.
    pub external_id: String,

    /// Kind of procedural event (ruling, filing, notice, ...).
    pub action_type: String,

    /// Free-text annotation from the court record.
    pub annotation: String,

    /// When the action happened.
    pub action_date: Option<DateTime<Utc>>,

    /// Whether the remote system holds documents for this action.
    pub has_documents: bool,

    /// Standard derived fields (registration/initial/final dates) overlaid
    /// with provider-specific extras; keys absent from a later cycle are
    /// preserved, not deleted.
    pub metadata: Map<String, Value>,

    /// Record creation time.
    pub created_at: DateTime<Utc>,

    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

/// Fields needed to create a [`ProcessAction`].
#[derive(Debug, Clone)]
pub struct NewProcessAction {
    pub tracked_process_id: TrackedProcessId,
    pub external_id: String,
    pub action_type: String,
    pub annotation: String,
    pub action_date: Option<DateTime<Utc>>,
    pub has_documents: bool,
    pub metadata: Map<String, Value>,
}

/// The mutable slice of a [`ProcessAction`] written on a diff hit.
#[derive(Debug, Clone)]
pub struct ActionChanges {
    pub action_type: String,
    pub annotation: String,
    pub action_date: Option<DateTime<Utc>>,
    pub has_documents: bool,
    pub metadata: Map<String, Value>,
}

impl ActionChanges {
    /// True when applying these changes to `current` would be a no-op.
    ///
    /// `action_date` is compared by time equality and `metadata` by full
    /// structural equality; a difference in any field makes the action a
    /// write-and-notify candidate.
    pub fn matches(&self, current: &ProcessAction) -> bool {
        self.action_type == current.action_type
            && self.annotation == current.annotation
            && self.action_date == current.action_date
            && self.has_documents == current.has_documents
            && self.metadata == current.metadata
    }
}

/// Kind of internal notification emitted by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Aggregate emitted once when a case is first linked to a remote
    /// process; replaces per-action notifications for the initial backfill.
    ProcessLinked,
    /// A genuinely new action observed during steady-state sync.
    NewAction,
    /// An existing action changed during steady-state sync.
    ActionUpdated,
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationKind::ProcessLinked => write!(f, "process_linked"),
            NotificationKind::NewAction => write!(f, "new_action"),
            NotificationKind::ActionUpdated => write!(f, "action_updated"),
        }
    }
}

impl std::str::FromStr for NotificationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "process_linked" => Ok(NotificationKind::ProcessLinked),
            "new_action" => Ok(NotificationKind::NewAction),
            "action_updated" => Ok(NotificationKind::ActionUpdated),
            _ => Err(format!("Unknown notification kind: {s}")),
        }
    }
}

/// Internal notification record tied to a case (and, for per-action kinds,
/// to the action that triggered it).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub case_id: CaseId,
    pub action_id: Option<ProcessActionId>,
    pub kind: NotificationKind,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Fields needed to create a [`Notification`].
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub case_id: CaseId,
    pub action_id: Option<ProcessActionId>,
    pub kind: NotificationKind,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_action() -> ProcessAction {
        ProcessAction {
            id: ProcessActionId::new(),
            tracked_process_id: TrackedProcessId::new(),
            external_id: "ACT-1".to_string(),
            action_type: "Auto".to_string(),
            annotation: "Evidence requested".to_string(),
            action_date: Some(Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap()),
            has_documents: false,
            metadata: Map::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn changes_from(action: &ProcessAction) -> ActionChanges {
        ActionChanges {
            action_type: action.action_type.clone(),
            annotation: action.annotation.clone(),
            action_date: action.action_date,
            has_documents: action.has_documents,
            metadata: action.metadata.clone(),
        }
    }

    #[test]
    fn test_changes_match_identical_action() {
        let action = sample_action();
        assert!(changes_from(&action).matches(&action));
    }

    #[test]
    fn test_changes_detect_annotation_edit() {
        let action = sample_action();
        let mut changes = changes_from(&action);
        changes.annotation = "Evidence received".to_string();
        assert!(!changes.matches(&action));
    }

    #[test]
    fn test_changes_detect_metadata_difference() {
        let action = sample_action();
        let mut changes = changes_from(&action);
        changes
            .metadata
            .insert("registration_date".to_string(), Value::from("2026-03-02"));
        assert!(!changes.matches(&action));
    }

    #[test]
    fn test_changes_compare_action_date_by_time() {
        let action = sample_action();
        let mut changes = changes_from(&action);
        changes.action_date = Some(Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 1).unwrap());
        assert!(!changes.matches(&action));
    }

    #[test]
    fn test_process_status_roundtrip() {
        assert_eq!(
            "active".parse::<ProcessStatus>().unwrap(),
            ProcessStatus::Active
        );
        assert_eq!(ProcessStatus::Suspended.to_string(), "suspended");
        assert!("closed".parse::<ProcessStatus>().is_err());
    }

    #[test]
    fn test_notification_kind_roundtrip() {
        for kind in [
            NotificationKind::ProcessLinked,
            NotificationKind::NewAction,
            NotificationKind::ActionUpdated,
        ] {
            assert_eq!(kind.to_string().parse::<NotificationKind>().unwrap(), kind);
        }
    }
}
