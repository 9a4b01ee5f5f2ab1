//! Top-level error types for the application.
//!
//! `BustError` is the successor to the teacher's `DirustError`: it unifies
//! startup/validation failures (config, I/O, HTTP client construction) under
//! one type so `main` can bubble a single `Result` out to the OS. Runtime
//! errors from long-lived components (Store, Poller, Collector, Monitor) do
//! not travel through this type — they are posted on the dedicated
//! `WorkerError` channel (see `supervisor.rs`) instead, matching spec.md's
//! distinction between startup-fatal and pipeline-fatal errors.

use crate::expander::ExpanderError;
use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum BustError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("expander error: {0}")]
    Expander(#[from] ExpanderError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Validation failures surfaced at startup only, before any component runs.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("base url must start with http:// or https://")]
    InvalidBaseUrl,

    #[error("workers must be at least 1")]
    InvalidWorkers,

    #[error("queue-size must be at least 1")]
    InvalidQueueSize,

    #[error("poller-batch-size must be at least 1")]
    InvalidBatchSize,
}

/// What a worker (Poller, Prober, Collector, Monitor) reports on fatal failure.
///
/// The Supervisor observes the first of these and initiates shutdown; it is
/// not itself a `std::error::Error` impl because it is a pipeline event, not
/// a propagated `Result` — mirroring `WorkerError{who, error}` in spec.md §4.7.
#[derive(Debug)]
pub struct WorkerError {
    pub who: &'static str,
    pub error: BustError,
}
