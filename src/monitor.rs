//! src/monitor.rs
//!
//! Samples Store counters every 3 seconds, computes throughput from the
//! shared probe counter, publishes to an optional dashboard adapter (or the
//! log sink if none is attached), and signals drain to the Supervisor.
//! Generalizes `Monitor`/`checkRemainingRequests` in `original_source/
//! libgetgood/monitor.go`.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::WorkerError;
use crate::prober::ProbeCounter;
use crate::store::Store;

const MONITOR_PERIOD: Duration = Duration::from_secs(3);

/// The dashboard adapter interface (spec.md §6). Generalizes the Go
/// `Terminal` interface in `original_source/logger/terminal-hook.go` and
/// `ui/terminal.go`'s widget setters. A `LogSink` default is supplied for
/// when no dashboard is attached.
pub trait DashboardSink: Send + Sync {
    fn add_log(&self, line: &str);
    fn set_requests_per_second(&self, rps: f64);
    fn set_completed(&self, completed: u64, total: u64);
    fn set_failed(&self, failed: u64);
}

/// Default sink: writes everything to the `tracing` log, matching spec.md
/// §6 ("Absent: core writes these to the log sink").
pub struct LogSink;

impl DashboardSink for LogSink {
    fn add_log(&self, line: &str) {
        info!(target: "dashboard", "{line}");
    }

    fn set_requests_per_second(&self, rps: f64) {
        info!(target: "dashboard", requests_per_second = rps, "throughput");
    }

    fn set_completed(&self, completed: u64, total: u64) {
        info!(target: "dashboard", completed, total, "progress");
    }

    fn set_failed(&self, failed: u64) {
        info!(target: "dashboard", failed, "failures");
    }
}

pub async fn run(
    store: Arc<Store>,
    counter: Arc<ProbeCounter>,
    sink: Arc<dyn DashboardSink>,
    drain_tx: mpsc::Sender<()>,
    err_tx: mpsc::Sender<WorkerError>,
    halt: CancellationToken,
) {
    debug!("monitor starting");

    let mut last_issued = counter.load();
    let mut last_tick = Instant::now();

    loop {
        tokio::select! {
            _ = halt.cancelled() => break,
            _ = tokio::time::sleep(MONITOR_PERIOD) => {}
        }

        let (remaining, completed, total, failed) = match sample(&store).await {
            Ok(values) => values,
            Err(e) => {
                let _ = err_tx
                    .send(WorkerError {
                        who: "monitor",
                        error: e.into(),
                    })
                    .await;
                break;
            }
        };

        let now = Instant::now();
        let elapsed = now.duration_since(last_tick).as_secs_f64().max(f64::EPSILON);
        let issued = counter.load();
        let rps = (issued.saturating_sub(last_issued)) as f64 / elapsed;
        last_issued = issued;
        last_tick = now;

        info!(remaining, completed, total, failed, requests_per_second = rps, "store status");
        sink.set_requests_per_second(rps);
        sink.set_completed(completed, total);
        sink.set_failed(failed);

        if remaining == 0 {
            let _ = drain_tx.send(()).await;
        }
    }

    debug!("monitor stopped");
}

async fn sample(store: &Store) -> Result<(u64, u64, u64, u64), crate::store::StoreError> {
    let remaining = store.count_remaining().await?;
    let completed = store.count_completed().await?;
    let total = store.count_total().await?;
    let failed = store.count_failed().await?;
    Ok((remaining, completed, total, failed))
}
