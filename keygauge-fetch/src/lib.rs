// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `keygauge` Fetch
//!
//! HTTP plumbing and the concurrency harness of the `keygauge` collector.
//!
//! ## Building Blocks
//!
//! - [`http::HttpClient`] - HTTP client with tracing and status mapping
//! - [`retry::RetryPolicy`] - Bounded retry of transient failures
//! - [`pacing::Pacer`] - Provider-mandated pauses between calls
//! - [`error::FetchError`] - Errors, classified by [`error::ErrorClass`]
//!
//! ## Adapters
//!
//! - [`adapter::UsageAdapter`] - `credential -> Metric` for one provider
//! - [`adapter::SessionLogin`] - Opaque login step returning a session token
//!
//! ## Fan-out / Join
//!
//! - [`processor::KeyProcessor`] - One adapter across many credentials;
//!   one metric per credential, failures isolated per credential
//! - [`collector::Collector`] - Every enabled provider concurrently;
//!   failures isolated per provider
//!
//! ## Example
//!
//! ```ignore
//! use keygauge_fetch::{Collector, FetchContext, FetchSettings, task_for};
//!
//! let ctx = Arc::new(FetchContext::new(FetchSettings::default())?);
//! let collector = Collector::with_tasks(vec![task_for(adapter, credentials)]);
//! let report = collector.collect(&ctx).await;
//! ```

pub mod adapter;
pub mod collector;
pub mod context;
pub mod error;
pub mod http;
pub mod pacing;
pub mod processor;
pub mod retry;

// Errors
pub use error::{ErrorClass, FetchError};

// HTTP
pub use http::{HttpClient, ResponseExt, bearer, endpoint, header_map};

// Context & settings
pub use context::{Credentials, FetchContext, FetchSettings, ProviderSettings};

// Adapters & harness
pub use adapter::{SessionLogin, UsageAdapter};
pub use collector::{
    CollectionReport, Collected, Collector, MultiKeyTask, ProviderFailure, ProviderTask,
    SingleKeyTask, task_for,
};
pub use pacing::Pacer;
pub use processor::{KeyOutcome, KeyProcessor, ProcessReport};
pub use retry::{RetryPolicy, RetryingAdapter};
