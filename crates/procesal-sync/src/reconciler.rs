//! Case reconciliation.
//!
//! The core algorithm: resolve a provider for the case's country, load or
//! create the local mirror, fetch the remote docket, diff it against the
//! mirror field by field, persist what changed, and notify under the
//! first-sync suppression rule.

use std::sync::Arc;

use chrono::Utc;
use serde_json::{Map, Value};
use tracing::{debug, info, instrument, warn};

use procesal_core::model::{
    ActionChanges, CaseRef, NewProcessAction, NewTrackedProcess, ProcessAction, TrackedProcess,
};
use procesal_core::store::SyncStore;
use procesal_provider::registry::ProviderRegistry;
use procesal_provider::types::RemoteAction;

use crate::error::SyncResult;
use crate::locks::CaseLocks;
use crate::notifier::Notifier;

/// What one reconciliation did for one case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseOutcome {
    /// No provider registered for the firm's country; nothing touched.
    Skipped,
    /// First sync, but the radicado has no remote match yet; nothing
    /// created. Expected for recently filed cases.
    NotIndexed,
    /// The mirror was reconciled against the remote feed.
    Synced {
        /// Actions created this run.
        imported: usize,
        /// Actions updated in place this run.
        updated: usize,
        /// Whether this run created the tracked process.
        first_sync: bool,
    },
}

/// Reconciles one case's mirror against its remote judicial process.
pub struct Reconciler {
    registry: Arc<ProviderRegistry>,
    store: Arc<dyn SyncStore>,
    notifier: Notifier,
    locks: CaseLocks,
}

impl Reconciler {
    /// Create a reconciler over the given registry and store.
    pub fn new(registry: Arc<ProviderRegistry>, store: Arc<dyn SyncStore>) -> Self {
        let notifier = Notifier::new(Arc::clone(&store));
        Self {
            registry,
            store,
            notifier,
            locks: CaseLocks::new(),
        }
    }

    /// Reconcile one case.
    ///
    /// Holds the case's lock for the duration, so a sweep and an on-demand
    /// trigger for the same case serialize. An unsupported jurisdiction is
    /// a silent skip, not an error; provider failures abort only this case.
    #[instrument(skip(self, case), fields(case_id = %case.case_id, radicado = %case.radicado))]
    pub async fn process_case(&self, case: &CaseRef) -> SyncResult<CaseOutcome> {
        let _guard = self.locks.acquire(case.case_id).await;

        let Some(provider) = self.registry.resolve(&case.country).await else {
            debug!(country = %case.country, "no provider for country, skipping case");
            return Ok(CaseOutcome::Skipped);
        };

        let now = Utc::now();
        let (tracked, first_sync) = match self.store.find_tracked_process(case.case_id).await? {
            Some(tracked) => {
                // Heartbeat, updated every sweep regardless of change.
                self.store.touch_tracking(tracked.id, now).await?;
                (tracked, false)
            }
            None => {
                let Some(summary) = provider.find_by_radicado(&case.radicado).await? else {
                    info!("radicado not indexed by the remote system yet");
                    return Ok(CaseOutcome::NotIndexed);
                };

                // Details seeded from the search summary, detail fields
                // merged on top.
                let mut details = summary.fields;
                details.extend(provider.process_detail(&summary.process_id).await?);

                let tracked = self
                    .store
                    .create_tracked_process(NewTrackedProcess {
                        case_id: case.case_id,
                        process_id: summary.process_id,
                        radicado: case.radicado.clone(),
                        details,
                        is_private: summary.is_private,
                    })
                    .await?;

                info!(process_id = %tracked.process_id, "linked case to remote process");
                (tracked, true)
            }
        };

        let actions = provider.process_actions(&tracked.process_id).await?;

        let mut imported = 0usize;
        let mut updated = 0usize;
        for remote in &actions {
            match self.reconcile_action(&tracked, remote, first_sync, case).await {
                Ok(ActionResult::Created) => imported += 1,
                Ok(ActionResult::Updated) => updated += 1,
                Ok(ActionResult::Unchanged) => {}
                // Persistence failure on one action must not lose the rest
                // of the docket.
                Err(e) => {
                    warn!(
                        external_id = %remote.external_id,
                        error = %e,
                        "failed to persist action, continuing with remaining actions"
                    );
                }
            }
        }

        if first_sync && imported > 0 {
            if let Err(e) = self.notifier.process_linked(case.case_id, imported).await {
                warn!(error = %e, "failed to create linked notification");
            }
        }

        // The feed is most-recent-first; the head carries the latest
        // activity timestamp.
        if let Some(at) = actions.first().and_then(|head| head.action_date) {
            if let Err(e) = self.store.set_last_activity(tracked.id, at).await {
                warn!(error = %e, "failed to update last activity date");
            }
        }

        debug!(imported, updated, first_sync, "case reconciled");
        Ok(CaseOutcome::Synced {
            imported,
            updated,
            first_sync,
        })
    }

    /// Create or diff-update the mirror row for one remote action.
    async fn reconcile_action(
        &self,
        tracked: &TrackedProcess,
        remote: &RemoteAction,
        first_sync: bool,
        case: &CaseRef,
    ) -> SyncResult<ActionResult> {
        let existing = self
            .store
            .find_action(tracked.id, &remote.external_id)
            .await?;

        match existing {
            None => {
                let created = self
                    .store
                    .create_action(NewProcessAction {
                        tracked_process_id: tracked.id,
                        external_id: remote.external_id.clone(),
                        action_type: remote.action_type.clone(),
                        annotation: remote.annotation.clone(),
                        action_date: remote.action_date,
                        has_documents: remote.has_documents,
                        metadata: fresh_metadata(remote),
                    })
                    .await?;

                if !first_sync {
                    if let Err(e) = self.notifier.new_action(case.case_id, &created).await {
                        warn!(error = %e, "failed to create new-action notification");
                    }
                }
                Ok(ActionResult::Created)
            }
            Some(current) => {
                let changes = ActionChanges {
                    action_type: remote.action_type.clone(),
                    annotation: remote.annotation.clone(),
                    action_date: remote.action_date,
                    has_documents: remote.has_documents,
                    metadata: target_metadata(&current, remote),
                };

                if changes.matches(&current) {
                    return Ok(ActionResult::Unchanged);
                }

                let action_type = changes.action_type.clone();
                self.store.update_action(current.id, changes).await?;

                if !first_sync {
                    if let Err(e) = self
                        .notifier
                        .action_updated(case.case_id, current.id, &action_type)
                        .await
                    {
                        warn!(error = %e, "failed to create updated-action notification");
                    }
                }
                Ok(ActionResult::Updated)
            }
        }
    }
}

enum ActionResult {
    Created,
    Updated,
    Unchanged,
}

/// Metadata for a newly observed action: standard derived fields overlaid
/// with the provider's extras.
fn fresh_metadata(remote: &RemoteAction) -> Map<String, Value> {
    let mut metadata = remote.derived_metadata();
    metadata.extend(remote.extra.clone());
    metadata
}

/// Target metadata for an existing action: start from the stored map so
/// keys this cycle does not refresh are preserved, then overlay the fresh
/// standard fields and the provider's extras.
fn target_metadata(current: &ProcessAction, remote: &RemoteAction) -> Map<String, Value> {
    let mut metadata = current.metadata.clone();
    metadata.extend(remote.derived_metadata());
    metadata.extend(remote.extra.clone());
    metadata
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{remote_action, MemoryStore, ScriptedProvider};
    use chrono::TimeZone;
    use procesal_core::ids::CaseId;
    use procesal_core::model::NotificationKind;

    fn case(country: &str) -> CaseRef {
        CaseRef {
            case_id: CaseId::new(),
            radicado: "12345".to_string(),
            country: country.to_string(),
        }
    }

    async fn engine_with(
        provider: Arc<ScriptedProvider>,
    ) -> (Reconciler, Arc<MemoryStore>) {
        let registry = Arc::new(ProviderRegistry::new());
        registry.register(["CO", "Colombia"], provider).await;
        let store = Arc::new(MemoryStore::new());
        let reconciler = Reconciler::new(registry, Arc::clone(&store) as Arc<dyn SyncStore>);
        (reconciler, store)
    }

    #[tokio::test]
    async fn test_scenario_a_first_sync() {
        let provider = Arc::new(ScriptedProvider::new("PROC-1"));
        provider.set_actions(vec![remote_action("ACT-1")]).await;
        let (reconciler, store) = engine_with(provider).await;
        let case = case("CO");

        let outcome = reconciler.process_case(&case).await.unwrap();
        assert_eq!(
            outcome,
            CaseOutcome::Synced {
                imported: 1,
                updated: 0,
                first_sync: true
            }
        );

        let tracked = store.tracked(case.case_id).await.unwrap();
        assert_eq!(tracked.process_id, "PROC-1");
        assert_eq!(store.actions().await.len(), 1);

        let notifications = store.notifications().await;
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].kind, NotificationKind::ProcessLinked);
        assert!(notifications[0].message.contains('1'));
    }

    #[tokio::test]
    async fn test_first_sync_suppresses_per_action_notifications() {
        let provider = Arc::new(ScriptedProvider::new("PROC-1"));
        provider
            .set_actions(vec![
                remote_action("ACT-3"),
                remote_action("ACT-2"),
                remote_action("ACT-1"),
            ])
            .await;
        let (reconciler, store) = engine_with(provider).await;

        reconciler.process_case(&case("CO")).await.unwrap();

        let notifications = store.notifications().await;
        assert_eq!(notifications.len(), 1, "exactly one aggregate notification");
        assert_eq!(notifications[0].kind, NotificationKind::ProcessLinked);
        assert!(notifications[0].message.contains('3'));
    }

    #[tokio::test]
    async fn test_idempotence_second_run_writes_nothing() {
        let provider = Arc::new(ScriptedProvider::new("PROC-1"));
        provider
            .set_actions(vec![remote_action("ACT-2"), remote_action("ACT-1")])
            .await;
        let (reconciler, store) = engine_with(provider).await;
        let case = case("CO");

        reconciler.process_case(&case).await.unwrap();
        let creates_after_first = store.action_creates().await;
        let notifications_after_first = store.notifications().await.len();

        let outcome = reconciler.process_case(&case).await.unwrap();
        assert_eq!(
            outcome,
            CaseOutcome::Synced {
                imported: 0,
                updated: 0,
                first_sync: false
            }
        );
        assert_eq!(store.action_creates().await, creates_after_first);
        assert_eq!(store.action_updates().await, 0);
        assert_eq!(store.notifications().await.len(), notifications_after_first);
    }

    #[tokio::test]
    async fn test_scenario_b_steady_state_new_action() {
        let provider = Arc::new(ScriptedProvider::new("PROC-1"));
        provider.set_actions(vec![remote_action("ACT-1")]).await;
        let (reconciler, store) = engine_with(Arc::clone(&provider)).await;
        let case = case("CO");

        reconciler.process_case(&case).await.unwrap();

        // Next sweep sees a new head action, the old one unchanged.
        provider
            .set_actions(vec![remote_action("ACT-2"), remote_action("ACT-1")])
            .await;
        let outcome = reconciler.process_case(&case).await.unwrap();

        assert_eq!(
            outcome,
            CaseOutcome::Synced {
                imported: 1,
                updated: 0,
                first_sync: false
            }
        );
        assert_eq!(store.actions().await.len(), 2);
        assert_eq!(store.action_updates().await, 0, "no writes for ACT-1");

        let notifications = store.notifications().await;
        let new_action: Vec<_> = notifications
            .iter()
            .filter(|n| n.kind == NotificationKind::NewAction)
            .collect();
        assert_eq!(new_action.len(), 1);
        let act2 = store.action_by_external_id("ACT-2").await.unwrap();
        assert_eq!(new_action[0].action_id, Some(act2.id));
    }

    #[tokio::test]
    async fn test_scenario_c_field_change_updates_and_notifies() {
        let provider = Arc::new(ScriptedProvider::new("PROC-1"));
        let mut original = remote_action("ACT-1");
        original.annotation = "Evidence requested".to_string();
        provider.set_actions(vec![original.clone()]).await;
        let (reconciler, store) = engine_with(Arc::clone(&provider)).await;
        let case = case("CO");

        reconciler.process_case(&case).await.unwrap();

        let mut changed = original;
        changed.annotation = "Evidence received".to_string();
        provider.set_actions(vec![changed]).await;
        let outcome = reconciler.process_case(&case).await.unwrap();

        assert_eq!(
            outcome,
            CaseOutcome::Synced {
                imported: 0,
                updated: 1,
                first_sync: false
            }
        );

        let stored = store.action_by_external_id("ACT-1").await.unwrap();
        assert_eq!(stored.annotation, "Evidence received");
        assert_eq!(stored.action_type, "Auto");
        assert!(!stored.has_documents);

        let updated: Vec<_> = store
            .notifications()
            .await
            .into_iter()
            .filter(|n| n.kind == NotificationKind::ActionUpdated)
            .collect();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].action_id, Some(stored.id));
    }

    #[tokio::test]
    async fn test_metadata_merge_preserves_stale_keys() {
        let provider = Arc::new(ScriptedProvider::new("PROC-1"));
        let mut first = remote_action("ACT-1");
        first
            .extra
            .insert("codigo_regla".to_string(), Value::from("00107"));
        provider.set_actions(vec![first.clone()]).await;
        let (reconciler, store) = engine_with(Arc::clone(&provider)).await;
        let case = case("CO");

        reconciler.process_case(&case).await.unwrap();

        // This cycle the provider omits codigo_regla but changes the
        // annotation; the stored key must survive the update.
        let mut second = remote_action("ACT-1");
        second.annotation = "Nueva anotacion".to_string();
        provider.set_actions(vec![second]).await;
        reconciler.process_case(&case).await.unwrap();

        let stored = store.action_by_external_id("ACT-1").await.unwrap();
        assert_eq!(stored.annotation, "Nueva anotacion");
        assert_eq!(
            stored.metadata.get("codigo_regla").and_then(Value::as_str),
            Some("00107")
        );
    }

    #[tokio::test]
    async fn test_correlation_uniqueness_duplicate_external_ids() {
        let provider = Arc::new(ScriptedProvider::new("PROC-1"));
        provider
            .set_actions(vec![remote_action("ACT-1"), remote_action("ACT-1")])
            .await;
        let (reconciler, store) = engine_with(provider).await;

        let outcome = reconciler.process_case(&case("CO")).await.unwrap();

        // The second occurrence is an update candidate, not a second row.
        assert_eq!(store.actions().await.len(), 1);
        assert_eq!(
            outcome,
            CaseOutcome::Synced {
                imported: 1,
                updated: 0,
                first_sync: true
            }
        );
    }

    #[tokio::test]
    async fn test_unknown_country_is_silent_skip() {
        let provider = Arc::new(ScriptedProvider::new("PROC-1"));
        provider.set_actions(vec![remote_action("ACT-1")]).await;
        let (reconciler, store) = engine_with(provider).await;

        let outcome = reconciler.process_case(&case("PE")).await.unwrap();

        assert_eq!(outcome, CaseOutcome::Skipped);
        assert_eq!(store.actions().await.len(), 0);
        assert_eq!(store.notifications().await.len(), 0);
        assert_eq!(store.tracked_count().await, 0);
    }

    #[tokio::test]
    async fn test_unindexed_radicado_is_a_noop() {
        let provider = Arc::new(ScriptedProvider::unindexed());
        let (reconciler, store) = engine_with(provider).await;

        let outcome = reconciler.process_case(&case("CO")).await.unwrap();

        assert_eq!(outcome, CaseOutcome::NotIndexed);
        assert_eq!(store.tracked_count().await, 0);
        assert_eq!(store.notifications().await.len(), 0);
    }

    #[tokio::test]
    async fn test_first_sync_with_empty_docket_emits_nothing() {
        let provider = Arc::new(ScriptedProvider::new("PROC-1"));
        let (reconciler, store) = engine_with(provider).await;

        let outcome = reconciler.process_case(&case("CO")).await.unwrap();

        assert_eq!(
            outcome,
            CaseOutcome::Synced {
                imported: 0,
                updated: 0,
                first_sync: true
            }
        );
        // Linked but nothing imported: no aggregate notification.
        assert_eq!(store.notifications().await.len(), 0);
    }

    #[tokio::test]
    async fn test_details_merge_detail_over_summary() {
        let provider = Arc::new(ScriptedProvider::new("PROC-1"));
        provider
            .set_summary_field("despacho", Value::from("FROM SEARCH"))
            .await;
        provider
            .set_detail_field("despacho", Value::from("FROM DETAIL"))
            .await;
        provider
            .set_detail_field("ponente", Value::from("JUEZ 01"))
            .await;
        let (reconciler, store) = engine_with(provider).await;
        let case = case("CO");

        reconciler.process_case(&case).await.unwrap();

        let tracked = store.tracked(case.case_id).await.unwrap();
        assert_eq!(
            tracked.details.get("despacho").and_then(Value::as_str),
            Some("FROM DETAIL")
        );
        assert_eq!(
            tracked.details.get("ponente").and_then(Value::as_str),
            Some("JUEZ 01")
        );
    }

    #[tokio::test]
    async fn test_steady_state_refreshes_heartbeat() {
        let provider = Arc::new(ScriptedProvider::new("PROC-1"));
        let (reconciler, store) = engine_with(provider).await;
        let case = case("CO");

        reconciler.process_case(&case).await.unwrap();
        assert_eq!(store.tracking_touches().await, 0, "first sync creates, not touches");

        reconciler.process_case(&case).await.unwrap();
        assert_eq!(store.tracking_touches().await, 1);
    }

    #[tokio::test]
    async fn test_last_activity_from_feed_head() {
        let provider = Arc::new(ScriptedProvider::new("PROC-1"));
        let head_date = Utc.with_ymd_and_hms(2026, 5, 2, 10, 0, 0).unwrap();
        let mut head = remote_action("ACT-2");
        head.action_date = Some(head_date);
        provider.set_actions(vec![head, remote_action("ACT-1")]).await;
        let (reconciler, store) = engine_with(provider).await;
        let case = case("CO");

        reconciler.process_case(&case).await.unwrap();

        let tracked = store.tracked(case.case_id).await.unwrap();
        assert_eq!(tracked.last_activity_date, Some(head_date));
    }

    #[tokio::test]
    async fn test_provider_failure_propagates() {
        let provider = Arc::new(ScriptedProvider::new("PROC-1"));
        provider.fail_actions().await;
        let (reconciler, _store) = engine_with(provider).await;

        let result = reconciler.process_case(&case("CO")).await;
        assert!(matches!(result, Err(crate::SyncError::Provider(_))));
    }
}
