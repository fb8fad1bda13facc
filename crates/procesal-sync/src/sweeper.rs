//! Periodic sweep over all eligible cases.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, instrument, warn};

use procesal_core::ids::CaseId;
use procesal_core::store::SyncStore;
use procesal_provider::registry::ProviderRegistry;

use crate::error::{SyncError, SyncResult};
use crate::reconciler::{CaseOutcome, Reconciler};

/// Pacing knobs for the sweep.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// Pause between consecutive cases. The remote court systems are
    /// shared public infrastructure; one second is the floor in
    /// production.
    pub pause_between_cases: Duration,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            pause_between_cases: Duration::from_secs(1),
        }
    }
}

/// Tally of one sweep pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepSummary {
    /// Eligible cases considered.
    pub total: usize,
    /// Cases reconciled against their remote process.
    pub synced: usize,
    /// Cases with no provider for their country.
    pub skipped: usize,
    /// First-sync cases whose radicado has no remote match yet.
    pub not_indexed: usize,
    /// Cases aborted by a provider or store error.
    pub failed: usize,
    /// Actions created across the pass.
    pub imported: usize,
    /// Actions updated across the pass.
    pub updated: usize,
}

/// Drives the [`Reconciler`] over every eligible case, sequentially.
pub struct Sweeper {
    store: Arc<dyn SyncStore>,
    reconciler: Reconciler,
    config: SweepConfig,
}

impl Sweeper {
    /// Build a sweeper over the given registry and store.
    pub fn new(
        registry: Arc<ProviderRegistry>,
        store: Arc<dyn SyncStore>,
        config: SweepConfig,
    ) -> Self {
        let reconciler = Reconciler::new(registry, Arc::clone(&store));
        Self {
            store,
            reconciler,
            config,
        }
    }

    /// One full pass over all eligible cases.
    ///
    /// Strictly sequential with a fixed pause between cases. A failing
    /// case is logged and counted, never allowed to abort the rest of the
    /// batch.
    #[instrument(skip(self))]
    pub async fn run_sweep(&self) -> SyncResult<SweepSummary> {
        let cases = self.store.eligible_cases().await?;
        let mut summary = SweepSummary {
            total: cases.len(),
            ..SweepSummary::default()
        };
        info!(total = summary.total, "sweep started");

        for (i, case) in cases.iter().enumerate() {
            match self.reconciler.process_case(case).await {
                Ok(CaseOutcome::Synced {
                    imported, updated, ..
                }) => {
                    summary.synced += 1;
                    summary.imported += imported;
                    summary.updated += updated;
                }
                Ok(CaseOutcome::Skipped) => summary.skipped += 1,
                Ok(CaseOutcome::NotIndexed) => summary.not_indexed += 1,
                Err(e) => {
                    summary.failed += 1;
                    error!(
                        case_id = %case.case_id,
                        radicado = %case.radicado,
                        error = %e,
                        "case sync failed, continuing sweep"
                    );
                }
            }

            if i + 1 < cases.len() && !self.config.pause_between_cases.is_zero() {
                tokio::time::sleep(self.config.pause_between_cases).await;
            }
        }

        info!(
            synced = summary.synced,
            skipped = summary.skipped,
            not_indexed = summary.not_indexed,
            failed = summary.failed,
            imported = summary.imported,
            updated = summary.updated,
            "sweep finished"
        );
        Ok(summary)
    }

    /// Reconcile one case on demand.
    ///
    /// Unlike the sweep this propagates the case's error to the caller;
    /// the per-case lock still serializes it against an in-flight sweep.
    #[instrument(skip(self), fields(case_id = %case_id))]
    pub async fn reconcile_case(&self, case_id: CaseId) -> SyncResult<CaseOutcome> {
        let Some(case) = self.store.case_by_id(case_id).await? else {
            warn!("on-demand sync requested for unknown or ineligible case");
            return Err(SyncError::CaseNotFound { case_id });
        };
        self.reconciler.process_case(&case).await
    }
}
