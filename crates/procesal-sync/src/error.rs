//! Engine error types.

use thiserror::Error;

use procesal_core::ids::CaseId;
use procesal_core::store::StoreError;
use procesal_provider::error::ProviderError;

/// Error from reconciling a single case.
///
/// The sweep treats every variant as recoverable at the batch level (log
/// and continue); the on-demand entry point propagates it to its caller.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The remote court system failed (transport, status, parse).
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The local store failed outside the per-action tolerance.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The requested case does not exist or is not eligible for sync.
    #[error("case not found or not eligible: {case_id}")]
    CaseNotFound { case_id: CaseId },
}

/// Result type for engine operations.
pub type SyncResult<T> = Result<T, SyncError>;
