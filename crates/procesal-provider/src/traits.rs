//! Provider contract
//!
//! The capability a country adapter must expose to the reconciler,
//! independent of the jurisdiction's remote schema.

use async_trait::async_trait;

use crate::error::ProviderResult;
use crate::types::{ProcessSummary, RemoteAction};

/// A remote judicial-records source for one jurisdiction.
///
/// Each operation maps to one external call cycle. Implementations own
/// request encoding, response parsing and date-format tolerance; the
/// reconciler only sees the generic shapes.
#[async_trait]
pub trait CourtProvider: Send + Sync {
    /// Human-readable jurisdiction name, for logs.
    fn jurisdiction(&self) -> &str;

    /// Look up a process by its filing number.
    ///
    /// Returns `Ok(None)` when the radicado has no match in the remote
    /// system; that is an expected outcome for recently filed cases, not
    /// an error. Errors are reserved for transport, parse and
    /// unexpected-status failures.
    async fn find_by_radicado(&self, radicado: &str) -> ProviderResult<Option<ProcessSummary>>;

    /// Fetch the supplementary detail fields the jurisdiction exposes for
    /// a process. Keys are country-specific and opaque to the caller.
    async fn process_detail(
        &self,
        process_id: &str,
    ) -> ProviderResult<serde_json::Map<String, serde_json::Value>>;

    /// Fetch the docket actions for a process, in the remote system's
    /// order (most recent first). Callers must not re-sort.
    async fn process_actions(&self, process_id: &str) -> ProviderResult<Vec<RemoteAction>>;
}
