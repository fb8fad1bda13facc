//! In-memory doubles for engine tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use procesal_core::ids::{CaseId, NotificationId, ProcessActionId, TrackedProcessId};
use procesal_core::model::{
    ActionChanges, CaseRef, NewNotification, NewProcessAction, NewTrackedProcess, Notification,
    ProcessAction, ProcessStatus, TrackedProcess,
};
use procesal_core::store::{StoreError, StoreResult, SyncStore};
use procesal_provider::error::{ProviderError, ProviderResult};
use procesal_provider::traits::CourtProvider;
use procesal_provider::types::{ProcessSummary, RemoteAction};

/// A minimal remote action for tests; callers tweak fields as needed.
pub fn remote_action(external_id: &str) -> RemoteAction {
    RemoteAction {
        external_id: external_id.to_string(),
        action_type: "Auto".to_string(),
        annotation: format!("Anotacion {external_id}"),
        action_date: Some(Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap()),
        registration_date: None,
        initial_date: None,
        final_date: None,
        has_documents: false,
        extra: Map::new(),
    }
}

#[derive(Default)]
struct MemoryState {
    cases: Vec<CaseRef>,
    tracked: HashMap<CaseId, TrackedProcess>,
    actions: Vec<ProcessAction>,
    notifications: Vec<Notification>,
}

/// In-memory [`SyncStore`] with write counters, so tests can assert not
/// only the final state but how many writes produced it.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    action_creates: AtomicUsize,
    action_updates: AtomicUsize,
    tracking_touches: AtomicUsize,
    fail_action_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a case into the eligible set.
    pub async fn add_case(&self, case: CaseRef) {
        self.state.lock().await.cases.push(case);
    }

    /// Make every action create/update fail, for failure-tolerance tests.
    pub fn fail_action_writes(&self) {
        self.fail_action_writes.store(true, Ordering::SeqCst);
    }

    pub async fn tracked(&self, case_id: CaseId) -> Option<TrackedProcess> {
        self.state.lock().await.tracked.get(&case_id).cloned()
    }

    pub async fn tracked_count(&self) -> usize {
        self.state.lock().await.tracked.len()
    }

    pub async fn actions(&self) -> Vec<ProcessAction> {
        self.state.lock().await.actions.clone()
    }

    pub async fn action_by_external_id(&self, external_id: &str) -> Option<ProcessAction> {
        self.state
            .lock()
            .await
            .actions
            .iter()
            .find(|a| a.external_id == external_id)
            .cloned()
    }

    pub async fn notifications(&self) -> Vec<Notification> {
        self.state.lock().await.notifications.clone()
    }

    pub async fn action_creates(&self) -> usize {
        self.action_creates.load(Ordering::SeqCst)
    }

    pub async fn action_updates(&self) -> usize {
        self.action_updates.load(Ordering::SeqCst)
    }

    pub async fn tracking_touches(&self) -> usize {
        self.tracking_touches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SyncStore for MemoryStore {
    async fn eligible_cases(&self) -> StoreResult<Vec<CaseRef>> {
        Ok(self.state.lock().await.cases.clone())
    }

    async fn case_by_id(&self, case_id: CaseId) -> StoreResult<Option<CaseRef>> {
        Ok(self
            .state
            .lock()
            .await
            .cases
            .iter()
            .find(|c| c.case_id == case_id)
            .cloned())
    }

    async fn find_tracked_process(&self, case_id: CaseId) -> StoreResult<Option<TrackedProcess>> {
        Ok(self.state.lock().await.tracked.get(&case_id).cloned())
    }

    async fn create_tracked_process(&self, new: NewTrackedProcess) -> StoreResult<TrackedProcess> {
        let mut state = self.state.lock().await;
        if state.tracked.contains_key(&new.case_id) {
            return Err(StoreError::Duplicate {
                resource: "tracked_process",
                key: new.case_id.to_string(),
            });
        }
        let now = Utc::now();
        let tracked = TrackedProcess {
            id: TrackedProcessId::new(),
            case_id: new.case_id,
            process_id: new.process_id,
            radicado: new.radicado,
            details: new.details,
            is_private: new.is_private,
            status: ProcessStatus::Active,
            last_tracking: now,
            last_activity_date: None,
            created_at: now,
            updated_at: now,
        };
        state.tracked.insert(new.case_id, tracked.clone());
        Ok(tracked)
    }

    async fn touch_tracking(&self, id: TrackedProcessId, at: DateTime<Utc>) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        let tracked = state
            .tracked
            .values_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| StoreError::NotFound {
                resource: "tracked_process",
                id: id.to_string(),
            })?;
        tracked.last_tracking = at;
        tracked.updated_at = at;
        self.tracking_touches.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn set_last_activity(&self, id: TrackedProcessId, at: DateTime<Utc>) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        let tracked = state
            .tracked
            .values_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| StoreError::NotFound {
                resource: "tracked_process",
                id: id.to_string(),
            })?;
        tracked.last_activity_date = Some(at);
        Ok(())
    }

    async fn find_action(
        &self,
        tracked_process_id: TrackedProcessId,
        external_id: &str,
    ) -> StoreResult<Option<ProcessAction>> {
        Ok(self
            .state
            .lock()
            .await
            .actions
            .iter()
            .find(|a| a.tracked_process_id == tracked_process_id && a.external_id == external_id)
            .cloned())
    }

    async fn create_action(&self, new: NewProcessAction) -> StoreResult<ProcessAction> {
        if self.fail_action_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Database("injected write failure".to_string()));
        }
        let mut state = self.state.lock().await;
        if state
            .actions
            .iter()
            .any(|a| a.tracked_process_id == new.tracked_process_id && a.external_id == new.external_id)
        {
            return Err(StoreError::Duplicate {
                resource: "process_action",
                key: new.external_id,
            });
        }
        let now = Utc::now();
        let action = ProcessAction {
            id: ProcessActionId::new(),
            tracked_process_id: new.tracked_process_id,
            external_id: new.external_id,
            action_type: new.action_type,
            annotation: new.annotation,
            action_date: new.action_date,
            has_documents: new.has_documents,
            metadata: new.metadata,
            created_at: now,
            updated_at: now,
        };
        state.actions.push(action.clone());
        self.action_creates.fetch_add(1, Ordering::SeqCst);
        Ok(action)
    }

    async fn update_action(&self, id: ProcessActionId, changes: ActionChanges) -> StoreResult<()> {
        if self.fail_action_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Database("injected write failure".to_string()));
        }
        let mut state = self.state.lock().await;
        let action = state
            .actions
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| StoreError::NotFound {
                resource: "process_action",
                id: id.to_string(),
            })?;
        action.action_type = changes.action_type;
        action.annotation = changes.annotation;
        action.action_date = changes.action_date;
        action.has_documents = changes.has_documents;
        action.metadata = changes.metadata;
        action.updated_at = Utc::now();
        self.action_updates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn create_notification(&self, new: NewNotification) -> StoreResult<NotificationId> {
        let mut state = self.state.lock().await;
        let id = NotificationId::new();
        state.notifications.push(Notification {
            id,
            case_id: new.case_id,
            action_id: new.action_id,
            kind: new.kind,
            message: new.message,
            created_at: Utc::now(),
        });
        Ok(id)
    }
}

#[derive(Default)]
struct ScriptedState {
    summary_fields: Map<String, Value>,
    detail_fields: Map<String, Value>,
    actions: Vec<RemoteAction>,
    fail_actions: bool,
    fail_radicados: Vec<String>,
}

/// Scripted [`CourtProvider`]; tests set what each call returns.
pub struct ScriptedProvider {
    process_id: Option<String>,
    state: Mutex<ScriptedState>,
    actions_calls: AtomicUsize,
}

impl ScriptedProvider {
    /// Provider whose search matches every radicado onto `process_id`.
    pub fn new(process_id: &str) -> Self {
        Self {
            process_id: Some(process_id.to_string()),
            state: Mutex::new(ScriptedState::default()),
            actions_calls: AtomicUsize::new(0),
        }
    }

    /// Provider whose search never matches.
    pub fn unindexed() -> Self {
        Self {
            process_id: None,
            state: Mutex::new(ScriptedState::default()),
            actions_calls: AtomicUsize::new(0),
        }
    }

    pub async fn set_actions(&self, actions: Vec<RemoteAction>) {
        self.state.lock().await.actions = actions;
    }

    pub async fn set_summary_field(&self, key: &str, value: Value) {
        self.state
            .lock()
            .await
            .summary_fields
            .insert(key.to_string(), value);
    }

    pub async fn set_detail_field(&self, key: &str, value: Value) {
        self.state
            .lock()
            .await
            .detail_fields
            .insert(key.to_string(), value);
    }

    /// Make `process_actions` fail from now on.
    pub async fn fail_actions(&self) {
        self.state.lock().await.fail_actions = true;
    }

    /// Make the search fail for one specific radicado.
    pub async fn fail_radicado(&self, radicado: &str) {
        self.state
            .lock()
            .await
            .fail_radicados
            .push(radicado.to_string());
    }

    pub fn actions_calls(&self) -> usize {
        self.actions_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CourtProvider for ScriptedProvider {
    fn jurisdiction(&self) -> &str {
        "Scripted"
    }

    async fn find_by_radicado(&self, radicado: &str) -> ProviderResult<Option<ProcessSummary>> {
        let state = self.state.lock().await;
        if state.fail_radicados.iter().any(|r| r == radicado) {
            return Err(ProviderError::connection_failed("scripted search failure"));
        }
        Ok(self.process_id.as_ref().map(|process_id| ProcessSummary {
            process_id: process_id.clone(),
            is_private: false,
            fields: state.summary_fields.clone(),
        }))
    }

    async fn process_detail(&self, _process_id: &str) -> ProviderResult<Map<String, Value>> {
        Ok(self.state.lock().await.detail_fields.clone())
    }

    async fn process_actions(&self, _process_id: &str) -> ProviderResult<Vec<RemoteAction>> {
        self.actions_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().await;
        if state.fail_actions {
            return Err(ProviderError::connection_failed("scripted actions failure"));
        }
        Ok(state.actions.clone())
    }
}
