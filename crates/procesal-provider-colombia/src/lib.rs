//! Colombia court provider
//!
//! Implements [`procesal_provider::traits::CourtProvider`] against the Rama
//! Judicial "Consulta de Procesos Nacional Unificada" REST API: search by
//! radicado, process detail, and paginated actuaciones. The API returns
//! timestamps in a bare local format with no offset and uses literal `null`
//! for absent dates, so parsing goes through the tolerant [`fecha::Fecha`]
//! type.

pub mod config;
pub mod fecha;
pub mod provider;

pub use config::ColombiaConfig;
pub use provider::ColombiaProvider;
