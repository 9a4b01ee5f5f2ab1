//! src/prober.rs
//!
//! A fixed-size pool of HTTP GET workers draining the bounded work queue
//! and emitting completion events, generalizing `HttpWorker`/`work`/
//! `processRequest` in `original_source/libgetgood/http-worker.go` from a
//! single worker to an `N`-sized pool sharing one `reqwest::Client`.
//!
//! Unlike the teacher's `scanner::http::probe` (HEAD-first, GET fallback on
//! 405), spec.md §4.4 mandates GET only; the teacher's method-fallback
//! logic is not carried over (see DESIGN.md).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use reqwest::Client;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// A single candidate URL waiting to be probed.
#[derive(Debug, Clone)]
pub struct Request {
    pub uri: String,
}

/// The outcome of probing one URL.
#[derive(Debug, Clone)]
pub struct Response {
    pub uri: String,
    pub success: bool,
    pub http_status: Option<u16>,
}

/// Process-wide counter of completed probes (success or failure), read by
/// the Monitor to compute throughput. Shared via `Arc` rather than a true
/// global, since a global singleton would make multiple `Supervisor`
/// instances in the same process (as in tests) interfere with each other.
#[derive(Debug, Default)]
pub struct ProbeCounter(AtomicU64);

impl ProbeCounter {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    fn increment(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn load(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Spawns `workers` tasks sharing `client`, each draining `requests` and
/// posting to `responses` until `halt` is cancelled or the request channel
/// closes. Returns the tasks' `JoinHandle`s so the Supervisor can await
/// them during shutdown (spec.md §4.7: "wait for all probers to exit").
pub fn spawn_pool(
    workers: usize,
    client: Client,
    requests: mpsc::Receiver<Request>,
    responses: mpsc::Sender<Response>,
    counter: Arc<ProbeCounter>,
    halt: CancellationToken,
) -> Vec<tokio::task::JoinHandle<()>> {
    let requests = Arc::new(Mutex::new(requests));

    (0..workers)
        .map(|id| {
            let client = client.clone();
            let requests = requests.clone();
            let responses = responses.clone();
            let counter = counter.clone();
            let halt = halt.clone();
            tokio::spawn(async move { worker_loop(id, client, requests, responses, counter, halt).await })
        })
        .collect()
}

async fn worker_loop(
    id: usize,
    client: Client,
    requests: Arc<Mutex<mpsc::Receiver<Request>>>,
    responses: mpsc::Sender<Response>,
    counter: Arc<ProbeCounter>,
    halt: CancellationToken,
) {
    debug!(worker = id, "prober starting");
    loop {
        let request = {
            let mut guard = requests.lock().await;
            tokio::select! {
                _ = halt.cancelled() => None,
                maybe_req = guard.recv() => maybe_req,
            }
        };

        let Some(request) = request else {
            break;
        };

        let response = probe(&client, &request.uri).await;
        counter.increment();

        if responses.send(response).await.is_err() {
            // Collector has shut down; nothing left to do.
            break;
        }
    }
    debug!(worker = id, "prober stopped");
}

/// Issues one HTTP GET and summarizes the outcome. Transport errors
/// (DNS/TCP/TLS/timeout) are isolated here per spec.md §7: they become
/// `success: false` and are never propagated as a component error.
async fn probe(client: &Client, uri: &str) -> Response {
    match client.get(uri).send().await {
        Ok(resp) => {
            let http_status = resp.status().as_u16();
            // Drain and discard the body to free the connection for reuse;
            // we never retain it (spec.md §3: "the body is read and
            // discarded; it is not retained").
            if let Err(e) = resp.bytes().await {
                warn!(%uri, error = %e, "error draining response body");
            }
            Response {
                uri: uri.to_string(),
                success: true,
                http_status: Some(http_status),
            }
        }
        Err(e) => {
            warn!(%uri, error = %e, "transport error probing url");
            Response {
                uri: uri.to_string(),
                success: false,
                http_status: None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_counter_starts_at_zero_and_increments() {
        let counter = ProbeCounter::new();
        assert_eq!(counter.load(), 0);
        counter.increment();
        counter.increment();
        assert_eq!(counter.load(), 2);
    }
}
