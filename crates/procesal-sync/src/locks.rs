//! Per-case mutual exclusion.
//!
//! An on-demand reconciliation may run concurrently with an in-flight
//! periodic sweep; both entry points take the case's lock before touching
//! it, so two reconciliations for the same case serialize instead of
//! interleaving writes.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use procesal_core::ids::CaseId;

/// Keyed locks, one per case.
///
/// Entries are created on first use and kept for the life of the engine;
/// the map is bounded by the number of tracked cases.
pub struct CaseLocks {
    inner: Mutex<HashMap<CaseId, Arc<Mutex<()>>>>,
}

impl CaseLocks {
    /// Create an empty lock table.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Acquire the lock for one case, waiting if another reconciliation
    /// holds it.
    pub async fn acquire(&self, case_id: CaseId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut table = self.inner.lock().await;
            Arc::clone(table.entry(case_id).or_default())
        };
        lock.lock_owned().await
    }
}

impl Default for CaseLocks {
    fn default() -> Self {
        Self::new()
    }
}
