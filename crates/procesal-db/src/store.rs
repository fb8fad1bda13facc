//! `SyncStore` implementation over Postgres.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::PgPool;
use uuid::Uuid;

use procesal_core::ids::{CaseId, NotificationId, ProcessActionId, TrackedProcessId};
use procesal_core::model::{
    ActionChanges, CaseRef, NewNotification, NewProcessAction, NewTrackedProcess, ProcessAction,
    ProcessStatus, TrackedProcess,
};
use procesal_core::store::{StoreError, StoreResult, SyncStore};

/// Postgres-backed store for the sync engine.
#[derive(Clone)]
pub struct PgSyncStore {
    pool: PgPool,
}

impl PgSyncStore {
    /// Create a store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn db_err(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db) = e {
        if db.is_unique_violation() {
            return StoreError::Duplicate {
                resource: "row",
                key: db.message().to_string(),
            };
        }
    }
    StoreError::Database(e.to_string())
}

/// JSONB column payloads come back as `Value`; anything but an object is
/// treated as empty rather than failing the whole read.
fn as_map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

#[async_trait]
impl SyncStore for PgSyncStore {
    async fn eligible_cases(&self) -> StoreResult<Vec<CaseRef>> {
        let rows: Vec<CaseRow> = sqlx::query_as(
            r"
            SELECT c.id AS case_id, c.radicado, f.country
            FROM cases c
            JOIN firms f ON f.id = c.firm_id
            WHERE c.status = 'open' AND btrim(c.radicado) <> ''
            ORDER BY c.created_at
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows.into_iter().map(CaseRow::into_ref).collect())
    }

    async fn case_by_id(&self, case_id: CaseId) -> StoreResult<Option<CaseRef>> {
        let row: Option<CaseRow> = sqlx::query_as(
            r"
            SELECT c.id AS case_id, c.radicado, f.country
            FROM cases c
            JOIN firms f ON f.id = c.firm_id
            WHERE c.id = $1 AND c.status = 'open' AND btrim(c.radicado) <> ''
            ",
        )
        .bind(case_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.map(CaseRow::into_ref))
    }

    async fn find_tracked_process(&self, case_id: CaseId) -> StoreResult<Option<TrackedProcess>> {
        let row: Option<TrackedProcessRow> = sqlx::query_as(
            r"
            SELECT id, case_id, process_id, radicado, details, is_private,
                   status, last_tracking, last_activity_date, created_at, updated_at
            FROM tracked_processes
            WHERE case_id = $1
            ",
        )
        .bind(case_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.map(TrackedProcessRow::into_record))
    }

    async fn create_tracked_process(&self, new: NewTrackedProcess) -> StoreResult<TrackedProcess> {
        let row: TrackedProcessRow = sqlx::query_as(
            r"
            INSERT INTO tracked_processes
                (case_id, process_id, radicado, details, is_private, status)
            VALUES ($1, $2, $3, $4, $5, 'active')
            RETURNING id, case_id, process_id, radicado, details, is_private,
                      status, last_tracking, last_activity_date, created_at, updated_at
            ",
        )
        .bind(new.case_id.as_uuid())
        .bind(&new.process_id)
        .bind(&new.radicado)
        .bind(Value::Object(new.details))
        .bind(new.is_private)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.into_record())
    }

    async fn touch_tracking(&self, id: TrackedProcessId, at: DateTime<Utc>) -> StoreResult<()> {
        let result = sqlx::query(
            r"
            UPDATE tracked_processes
            SET last_tracking = $2, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id.as_uuid())
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                resource: "tracked process",
                id: id.to_string(),
            });
        }
        Ok(())
    }

    async fn set_last_activity(&self, id: TrackedProcessId, at: DateTime<Utc>) -> StoreResult<()> {
        sqlx::query(
            r"
            UPDATE tracked_processes
            SET last_activity_date = $2, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id.as_uuid())
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }

    async fn find_action(
        &self,
        tracked_process_id: TrackedProcessId,
        external_id: &str,
    ) -> StoreResult<Option<ProcessAction>> {
        let row: Option<ProcessActionRow> = sqlx::query_as(
            r"
            SELECT id, tracked_process_id, external_id, action_type, annotation,
                   action_date, has_documents, metadata, created_at, updated_at
            FROM process_actions
            WHERE tracked_process_id = $1 AND external_id = $2
            ",
        )
        .bind(tracked_process_id.as_uuid())
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.map(ProcessActionRow::into_record))
    }

    async fn create_action(&self, new: NewProcessAction) -> StoreResult<ProcessAction> {
        let row: ProcessActionRow = sqlx::query_as(
            r"
            INSERT INTO process_actions
                (tracked_process_id, external_id, action_type, annotation,
                 action_date, has_documents, metadata)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, tracked_process_id, external_id, action_type, annotation,
                      action_date, has_documents, metadata, created_at, updated_at
            ",
        )
        .bind(new.tracked_process_id.as_uuid())
        .bind(&new.external_id)
        .bind(&new.action_type)
        .bind(&new.annotation)
        .bind(new.action_date)
        .bind(new.has_documents)
        .bind(Value::Object(new.metadata))
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.into_record())
    }

    async fn update_action(&self, id: ProcessActionId, changes: ActionChanges) -> StoreResult<()> {
        let result = sqlx::query(
            r"
            UPDATE process_actions
            SET action_type = $2, annotation = $3, action_date = $4,
                has_documents = $5, metadata = $6, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id.as_uuid())
        .bind(&changes.action_type)
        .bind(&changes.annotation)
        .bind(changes.action_date)
        .bind(changes.has_documents)
        .bind(Value::Object(changes.metadata))
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                resource: "process action",
                id: id.to_string(),
            });
        }
        Ok(())
    }

    async fn create_notification(&self, new: NewNotification) -> StoreResult<NotificationId> {
        let (id,): (Uuid,) = sqlx::query_as(
            r"
            INSERT INTO notifications (case_id, action_id, kind, message)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            ",
        )
        .bind(new.case_id.as_uuid())
        .bind(new.action_id.map(|id| id.as_uuid()))
        .bind(new.kind.to_string())
        .bind(&new.message)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(NotificationId::from_uuid(id))
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CaseRow {
    case_id: Uuid,
    radicado: String,
    country: String,
}

impl CaseRow {
    fn into_ref(self) -> CaseRef {
        CaseRef {
            case_id: CaseId::from_uuid(self.case_id),
            radicado: self.radicado,
            country: self.country,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TrackedProcessRow {
    id: Uuid,
    case_id: Uuid,
    process_id: String,
    radicado: String,
    details: Value,
    is_private: bool,
    status: String,
    last_tracking: DateTime<Utc>,
    last_activity_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TrackedProcessRow {
    fn into_record(self) -> TrackedProcess {
        TrackedProcess {
            id: TrackedProcessId::from_uuid(self.id),
            case_id: CaseId::from_uuid(self.case_id),
            process_id: self.process_id,
            radicado: self.radicado,
            details: as_map(self.details),
            is_private: self.is_private,
            status: self.status.parse().unwrap_or(ProcessStatus::Active),
            last_tracking: self.last_tracking,
            last_activity_date: self.last_activity_date,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProcessActionRow {
    id: Uuid,
    tracked_process_id: Uuid,
    external_id: String,
    action_type: String,
    annotation: String,
    action_date: Option<DateTime<Utc>>,
    has_documents: bool,
    metadata: Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProcessActionRow {
    fn into_record(self) -> ProcessAction {
        ProcessAction {
            id: ProcessActionId::from_uuid(self.id),
            tracked_process_id: TrackedProcessId::from_uuid(self.tracked_process_id),
            external_id: self.external_id,
            action_type: self.action_type,
            annotation: self.annotation,
            action_date: self.action_date,
            has_documents: self.has_documents,
            metadata: as_map(self.metadata),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
