//! # Court Provider Framework
//!
//! Abstractions for reading judicial-process records from country-specific
//! court systems.
//!
//! Each jurisdiction exposes its own remote schema; a [`CourtProvider`]
//! reduces it to three operations the reconciler understands (search by
//! radicado, process detail, process actions). Providers are looked up at
//! runtime through a [`ProviderRegistry`] keyed by country, so jurisdictions
//! without an adapter are skipped rather than failed.
//!
//! ## Example
//!
//! ```ignore
//! use procesal_provider::prelude::*;
//!
//! let registry = ProviderRegistry::new();
//! registry.register(["CO", "Colombia"], colombia_provider).await;
//!
//! if let Some(provider) = registry.resolve("colombia").await {
//!     if let Some(summary) = provider.find_by_radicado("11001...").await? {
//!         let actions = provider.process_actions(&summary.process_id).await?;
//!     }
//! }
//! ```

pub mod error;
pub mod registry;
pub mod traits;
pub mod types;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{ProviderError, ProviderResult};
    pub use crate::registry::ProviderRegistry;
    pub use crate::traits::CourtProvider;
    pub use crate::types::{ProcessSummary, RemoteAction};
}

// Re-export async_trait for provider implementors
pub use async_trait::async_trait;
