//! src/collector.rs
//!
//! The sole writer of terminal status transitions (`Processed`/`Failed`).
//! Consumes two input sources — a one-shot seed (the Supervisor's initial
//! base URL) and the prober pool's completion stream — the seed first,
//! then the completion stream for the rest of the run. Generalizes
//! `Updater`/`handleResponse` in `original_source/libgetgood/updater.go`.
//!
//! Recursion is handled in-line: on a `Processed(200)` with recursion
//! enabled, the Collector calls `Expander::expand` directly in the same
//! task, rather than routing back through a channel — spec.md §9 warns
//! against bypassing the Store on the recursion edge, and keeping the
//! Expander a plain owned handle (not a channel) means there is no separate
//! edge to accidentally bypass it with.
//!
//! The completion loop deliberately does *not* race a halt signal: spec.md
//! §4.7/§9 calls the shutdown ordering "load-bearing" — the Collector must
//! keep running until every Prober has actually stopped and dropped its
//! sender, not merely until told to stop at the same instant as the rest
//! of the pipeline. Relying on `completions.recv()` returning `None` once
//! every Prober's `Response` sender is dropped (which happens only after
//! the Supervisor has awaited all prober handles) gives that ordering for
//! free, and also guarantees every buffered completion is drained before
//! the loop exits — a halt raced against `recv()` could instead win on a
//! poll where completions were still buffered.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::WorkerError;
use crate::expander::{Expander, ExpanderError};
use crate::prober::Response;
use crate::store::Store;

pub async fn run(
    store: Arc<Store>,
    expander: Arc<Expander>,
    recurse: bool,
    seed: oneshot::Receiver<String>,
    mut completions: mpsc::Receiver<Response>,
    err_tx: mpsc::Sender<WorkerError>,
    halt: CancellationToken,
) {
    debug!("collector starting");

    // The seed is a single event delivered once at startup; consume it
    // before entering the steady-state loop so it never becomes a
    // perpetually-ready `select!` branch (the channel carries no more
    // messages after this, and a `Receiver` that has seen its one message
    // then closes resolves instantly on every subsequent poll).
    tokio::select! {
        _ = halt.cancelled() => {
            debug!("collector stopped before seeding");
            return;
        }
        seed_result = seed => {
            if let Ok(base) = seed_result {
                if let Err(e) = expander.expand(&base).await {
                    let _ = err_tx.send(WorkerError { who: "collector", error: e.into() }).await;
                    return;
                }
            }
        }
    }

    // No halt arm here: the completion channel closes on its own once
    // every prober has stopped, which is exactly when the Collector is
    // meant to stop (see module docs above).
    while let Some(response) = completions.recv().await {
        if let Err(e) = handle_response(&store, &expander, recurse, response).await {
            let _ = err_tx.send(WorkerError { who: "collector", error: e.into() }).await;
            break;
        }
    }

    debug!("collector stopped");
}

async fn handle_response(
    store: &Store,
    expander: &Expander,
    recurse: bool,
    response: Response,
) -> Result<(), ExpanderError> {
    if !response.success {
        store.set_failed(&response.uri).await.map_err(ExpanderError::from)?;
        return Ok(());
    }

    let http_status = response
        .http_status
        .expect("success responses always carry a status code");
    store
        .set_completed(&response.uri, http_status)
        .await
        .map_err(ExpanderError::from)?;

    if recurse && http_status == 200 {
        info!(uri = %response.uri, "200 response, recursing");
        expander.expand(&response.uri).await?;
    }

    Ok(())
}
