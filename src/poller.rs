//! src/poller.rs
//!
//! A single producer that periodically claims a batch of unprocessed
//! records and hands them to the bounded work queue. Generalizes
//! `Poller`/`pollDatabase` in `original_source/libgetgood/poller.go`,
//! translating its non-blocking `select`/`default` enqueue attempt into
//! `mpsc::Sender::try_send`.
//!
//! The claim-before-enqueue protocol (spec.md §4.3, §9) is mandatory: the
//! bulk `set_inflight` call must complete before any of the claimed URIs is
//! offered to the queue, so a crash between claim and enqueue leaves the
//! URI durably `Inflight` (recoverable on the next run's reconciliation)
//! rather than silently lost or double-dispatched.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::WorkerError;
use crate::prober::Request;
use crate::store::Store;

const POLL_INTERVAL: Duration = Duration::from_secs(1);
const QUEUE_FULL_BACKOFF: Duration = Duration::from_secs(5);

pub async fn run(
    store: Arc<Store>,
    batch_size: u32,
    requests: mpsc::Sender<Request>,
    err_tx: mpsc::Sender<WorkerError>,
    halt: CancellationToken,
) {
    debug!("poller starting");

    loop {
        tokio::select! {
            _ = halt.cancelled() => break,
            _ = tokio::time::sleep(POLL_INTERVAL) => {}
        }

        match poll_once(&store, batch_size, &requests).await {
            Ok(ClaimOutcome::QueueFull) => {
                info!("request queue full, pausing poller");
                tokio::select! {
                    _ = halt.cancelled() => break,
                    _ = tokio::time::sleep(QUEUE_FULL_BACKOFF) => {}
                }
            }
            Ok(ClaimOutcome::Drained) => {}
            Err(e) => {
                let _ = err_tx
                    .send(WorkerError {
                        who: "poller",
                        error: e.into(),
                    })
                    .await;
                break;
            }
        }
    }

    debug!("poller stopped");
}

enum ClaimOutcome {
    /// All claimed URIs were enqueued (batch may have been empty).
    Drained,
    /// The work queue refused an enqueue; the poller backs off.
    QueueFull,
}

async fn poll_once(
    store: &Store,
    batch_size: u32,
    requests: &mpsc::Sender<Request>,
) -> Result<ClaimOutcome, crate::store::StoreError> {
    let uris = store.get_incomplete(batch_size).await?;
    if uris.is_empty() {
        return Ok(ClaimOutcome::Drained);
    }

    // The claim must be durable before any URI reaches the queue.
    store.set_inflight(&uris).await?;

    for uri in uris {
        match requests.try_send(Request { uri }) {
            Ok(()) => {}
            Err(_) => {
                // Queue is full (or closed during shutdown). Remaining
                // claimed URIs stay `Inflight`; they are re-picked after
                // the next run's reconciliation, or simply drained by the
                // pool shortly once queue space frees up.
                return Ok(ClaimOutcome::QueueFull);
            }
        }
    }

    Ok(ClaimOutcome::Drained)
}
