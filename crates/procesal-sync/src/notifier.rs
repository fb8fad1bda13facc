//! Notification emitter.
//!
//! Thin wrapper over the store's notification write. Delivery is
//! at-least-once: the underlying action writes are idempotent, the
//! notification rows are not deduplicated.

use std::sync::Arc;

use procesal_core::ids::{CaseId, NotificationId, ProcessActionId};
use procesal_core::model::{NewNotification, NotificationKind, ProcessAction};
use procesal_core::store::{StoreResult, SyncStore};

/// Creates internal notification records tied to a case/action.
#[derive(Clone)]
pub struct Notifier {
    store: Arc<dyn SyncStore>,
}

impl Notifier {
    /// Create a notifier over the given store.
    pub fn new(store: Arc<dyn SyncStore>) -> Self {
        Self { store }
    }

    /// Aggregate notification for a completed first sync; replaces the
    /// per-action notifications an initial backfill would otherwise flood
    /// the user with.
    pub async fn process_linked(
        &self,
        case_id: CaseId,
        imported: usize,
    ) -> StoreResult<NotificationId> {
        self.store
            .create_notification(NewNotification {
                case_id,
                action_id: None,
                kind: NotificationKind::ProcessLinked,
                message: format!(
                    "Judicial process linked successfully: {imported} actions imported"
                ),
            })
            .await
    }

    /// A genuinely new action observed after the first sync.
    pub async fn new_action(
        &self,
        case_id: CaseId,
        action: &ProcessAction,
    ) -> StoreResult<NotificationId> {
        self.store
            .create_notification(NewNotification {
                case_id,
                action_id: Some(action.id),
                kind: NotificationKind::NewAction,
                message: format!("New action on the process: {}", action.action_type),
            })
            .await
    }

    /// An already-mirrored action whose remote state changed.
    pub async fn action_updated(
        &self,
        case_id: CaseId,
        action_id: ProcessActionId,
        action_type: &str,
    ) -> StoreResult<NotificationId> {
        self.store
            .create_notification(NewNotification {
                case_id,
                action_id: Some(action_id),
                kind: NotificationKind::ActionUpdated,
                message: format!("Action updated on the process: {action_type}"),
            })
            .await
    }
}
