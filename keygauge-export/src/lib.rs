// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `keygauge` Export
//!
//! Turns collected metrics into Prometheus gauges.
//!
//! - [`PrometheusExporter`] - Gauge families fed from [`keygauge_core::Sample`]s
//! - [`PushGateway`] - Pushes the text exposition to a push gateway
//! - [`log_summary`] - Logs every family and sample

pub mod error;
pub mod gauges;
pub mod push;
pub mod summary;

pub use error::ExportError;
pub use gauges::{MetricsSink, PrometheusExporter};
pub use push::PushGateway;
pub use summary::log_summary;
