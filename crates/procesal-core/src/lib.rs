//! Procesal Core Library
//!
//! Shared types for the judicial-process synchronization engine.
//!
//! # Modules
//!
//! - [`ids`] - Strongly typed identifiers (`CaseId`, `TrackedProcessId`, ...)
//! - [`model`] - Domain records (`TrackedProcess`, `ProcessAction`, `Notification`)
//! - [`store`] - The `SyncStore` contract implemented by `procesal-db` and by
//!   test doubles

pub mod ids;
pub mod model;
pub mod store;

pub use ids::{CaseId, NotificationId, ProcessActionId, TrackedProcessId};
pub use model::{
    ActionChanges, CaseRef, NewNotification, NewProcessAction, NewTrackedProcess, Notification,
    NotificationKind, ProcessAction, ProcessStatus, TrackedProcess,
};
pub use store::{StoreError, StoreResult, SyncStore};
