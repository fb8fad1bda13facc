//! Judicial-process synchronization engine.
//!
//! The [`Reconciler`] mirrors one case's remote procedural history into the
//! local store, diffing field by field and emitting notifications only for
//! genuinely new information; the [`Sweeper`] runs it sequentially over all
//! eligible cases with per-case failure isolation and courtesy pacing
//! toward the rate-limited remote systems.
//!
//! Entry points, both idempotent and safe to call repeatedly:
//!
//! - [`Sweeper::run_sweep`]: one full pass over all eligible cases.
//! - [`Sweeper::reconcile_case`]: one case on demand; unlike the sweep,
//!   this propagates the case's error to the caller.

pub mod error;
pub mod locks;
pub mod notifier;
pub mod reconciler;
pub mod schedule;
pub mod sweeper;

pub use error::{SyncError, SyncResult};
pub use locks::CaseLocks;
pub use notifier::Notifier;
pub use reconciler::{CaseOutcome, Reconciler};
pub use schedule::SweepSchedule;
pub use sweeper::{SweepConfig, SweepSummary, Sweeper};

#[cfg(test)]
pub(crate) mod testing;
