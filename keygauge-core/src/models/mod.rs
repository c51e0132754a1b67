//! Domain models for keygauge.
//!
//! This module contains the core data structures representing providers,
//! credentials, metrics, and usage categories.
//!
//! ## Submodules
//!
//! - [`provider`] - Provider kinds
//! - [`credential`] - Opaque credentials with masking
//! - [`metric`] - Canonical metric and failure records
//! - [`category`] - Usage categories and derived quantities

mod category;
mod credential;
mod metric;
mod provider;

// Re-export everything at the models level
pub use category::{DerivedValues, Sample, UsageCategory};
pub use credential::Credential;
pub use metric::{
    DETAIL_DERIVED, DETAIL_ERROR, DETAIL_LIMIT_STRATEGY, DETAIL_SUCCESS, Detail, Failure, Metric,
};
pub use provider::ProviderKind;
