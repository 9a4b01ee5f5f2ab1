//! src/supervisor.rs
//!
//! Wires every component together, performs resume-time reconciliation,
//! propagates shutdown, and reports fatal worker errors. Generalizes
//! `main()` in `original_source/main.go` (the Go entry point that
//! constructs `DBConn`, the various workers, and wires their channels)
//! into a single owning struct, since Rust's task model makes the
//! Supervisor's handle-ownership explicit rather than implicit in a long
//! `main` function.

use std::sync::Arc;

use reqwest::Client;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::Config;
use crate::error::{BustError, WorkerError};
use crate::expander::Expander;
use crate::monitor::{DashboardSink, LogSink};
use crate::prober::{self, ProbeCounter, Request, Response};
use crate::store::Store;
use crate::{collector, poller};

/// Outcome of a completed run, surfaced for tests and for the CLI's exit
/// code decision.
pub struct RunOutcome {
    pub drained: bool,
    pub fatal_error: Option<BustError>,
}

pub struct Supervisor {
    config: Config,
    store: Arc<Store>,
    dashboard: Arc<dyn DashboardSink>,
    halt: CancellationToken,
}

impl Supervisor {
    pub async fn new(config: Config) -> Result<Self, BustError> {
        let store = Arc::new(Store::open(&config.db).await?);
        Ok(Self {
            config,
            store,
            dashboard: Arc::new(LogSink),
            halt: CancellationToken::new(),
        })
    }

    pub fn with_dashboard(mut self, dashboard: Arc<dyn DashboardSink>) -> Self {
        self.dashboard = dashboard;
        self
    }

    /// The cancellation token this run will observe. Exposed so an external
    /// adapter (e.g. the TUI's quit-key listener) can trigger the same
    /// shutdown path as an OS interrupt or drain.
    pub fn halt_handle(&self) -> CancellationToken {
        self.halt.clone()
    }

    /// Runs the full startup -> steady-state -> shutdown sequence
    /// described in spec.md §4.7, returning once the pipeline has drained,
    /// a fatal error occurred, or an external interrupt was observed.
    pub async fn run(self, words: Vec<String>, extensions: Vec<String>) -> Result<RunOutcome, BustError> {
        let Supervisor {
            config,
            store,
            dashboard,
            halt,
        } = self;

        store.create_schema().await?;
        if config.clear_db {
            store.clear().await?;
        }

        // Reconciliation: the entire resume-safety mechanism (spec.md
        // §4.7 step 2). Must run before the Poller starts claiming.
        store.reset_inflight().await?;
        store.reset_failed().await?;

        let client = Client::builder()
            .user_agent(concat!("bustrs/", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::none())
            .timeout_opt(config.request_timeout())
            .build()?;

        let expander = Arc::new(Expander::new(
            store.clone(),
            Arc::new(words),
            Arc::new(extensions),
        ));
        let counter = Arc::new(ProbeCounter::new());

        let (request_tx, request_rx) = mpsc::channel::<Request>(config.queue_size);
        let (response_tx, response_rx) = mpsc::channel::<Response>(config.queue_size);
        let (seed_tx, seed_rx) = oneshot::channel::<String>();
        let (drain_tx, mut drain_rx) = mpsc::channel::<()>(1);
        let (err_tx, mut err_rx) = mpsc::channel::<WorkerError>(16);

        let poller_handle = tokio::spawn(poller::run(
            store.clone(),
            config.poller_batch_size,
            request_tx,
            err_tx.clone(),
            halt.clone(),
        ));

        let prober_handles = prober::spawn_pool(
            config.workers,
            client,
            request_rx,
            response_tx,
            counter.clone(),
            halt.clone(),
        );

        let collector_handle = tokio::spawn(collector::run(
            store.clone(),
            expander.clone(),
            config.recurse,
            seed_rx,
            response_rx,
            err_tx.clone(),
            halt.clone(),
        ));

        let monitor_handle = tokio::spawn(crate::monitor::run(
            store.clone(),
            counter.clone(),
            dashboard.clone(),
            drain_tx,
            err_tx.clone(),
            halt.clone(),
        ));
        drop(err_tx);

        // Seed the initial base URL through the Collector's seed channel,
        // keeping expansion funneled through a single code path (spec.md
        // §4.7 step 4).
        let _ = seed_tx.send(config.url.clone());

        let mut fatal_error = None;
        let drained = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupt received, shutting down");
                false
            }
            _ = drain_rx.recv() => {
                info!("work queue drained");
                true
            }
            Some(worker_err) = err_rx.recv() => {
                error!(who = worker_err.who, error = %worker_err.error, "fatal worker error");
                fatal_error = Some(worker_err.error);
                false
            }
        };

        // Shutdown order matters (spec.md §4.7/§9): stop the Poller before
        // the Prober pool, drain the Prober pool before the Collector, and
        // only then stop the Monitor — this prevents losing the terminal
        // status of an in-flight probe.
        halt.cancel();

        let best_effort = fatal_error.is_some();

        if !best_effort {
            let _ = poller_handle.await;
            for handle in prober_handles {
                let _ = handle.await;
            }
            let _ = collector_handle.await;
            let _ = monitor_handle.await;
        } else {
            poller_handle.abort();
            for handle in prober_handles {
                handle.abort();
            }
            collector_handle.abort();
            monitor_handle.abort();
        }

        store.close().await;

        Ok(RunOutcome {
            drained,
            fatal_error,
        })
    }
}

trait ClientBuilderExt {
    fn timeout_opt(self, timeout: Option<std::time::Duration>) -> Self;
}

impl ClientBuilderExt for reqwest::ClientBuilder {
    fn timeout_opt(self, timeout: Option<std::time::Duration>) -> Self {
        match timeout {
            Some(t) => self.timeout(t),
            None => self,
        }
    }
}
