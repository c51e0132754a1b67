// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `keygauge` Core
//!
//! Core types, models, and limit strategies for the `keygauge` collector.
//!
//! This crate provides the foundational abstractions used across all other
//! `keygauge` crates, including:
//!
//! - The canonical [`Metric`] every provider is reduced to
//! - Credentials and their masked identifiers
//! - Usage categories and the derived quantities emitted per category
//! - The three limit-resolution strategies
//! - Error types
//!
//! ## Key Types
//!
//! ### Provider Types
//! - [`ProviderKind`] - Enum of all supported API providers
//! - [`UsageCategory`] - How a provider's usage/limit pair is interpreted
//!
//! ### Metric Types
//! - [`Metric`] - Normalized `(usage, limit, provider, credential_id, detail)` record
//! - [`Failure`] - A credential whose fetch could not complete
//! - [`DerivedValues`] - used/limit/remaining/ratio computed per category
//! - [`Sample`] - A metric with its category and derived values, as handed to a sink
//!
//! ### Credentials
//! - [`Credential`] - Opaque secret that never prints unmasked
//!
//! ### Limit Resolution
//! - [`LimitStrategy`] - Which policy produced a metric's limit
//! - [`LimitBands`] - Heuristic usage-band table
//! - [`allocate_cost`] - Cost-proportional allocation

pub mod error;
pub mod limits;
pub mod models;

// Re-export error types
pub use error::CoreError;

// Re-export limit strategies
pub use limits::{LimitBand, LimitBands, LimitStrategy, allocate_cost};

// Re-export all model types
pub use models::{
    // Credentials
    Credential,
    // Categories
    DerivedValues,
    Sample,
    UsageCategory,
    // Metrics
    Detail,
    Failure,
    Metric,
    // Providers
    ProviderKind,
};
