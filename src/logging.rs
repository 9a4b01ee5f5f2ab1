//! src/logging.rs
//!
//! Structured logging setup, generalizing the dual-sink design of
//! `original_source/logger/logger.go` (`ConfigureLogger`, a stdout sink
//! plus a file hook) into a layered `tracing-subscriber` registry: one
//! layer writes to stdout, one writes to the configured `--log-file` via
//! `tracing-appender`, both filtered at `--log-level`.
//!
//! When a dashboard is attached, a third layer forwards every formatted log
//! line to it, generalizing `logger.TerminalHook.Fire` in `original_source/
//! logger/terminal-hook.go` (a logrus hook that pushed every entry into the
//! termui logs pane) onto `tracing-subscriber`'s `MakeWriter` mechanism.

use std::sync::Arc;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use crate::config::LogLevel;
use crate::monitor::DashboardSink;

/// Initializes the global `tracing` subscriber. The returned `WorkerGuard`
/// must be kept alive for the duration of the process — dropping it flushes
/// and closes the non-blocking file writer, matching the lifetime of the
/// Go implementation's open `*os.File` passed to `ConfigureLogger`.
pub fn init(
    log_file: &str,
    level: LogLevel,
    dashboard: Option<Arc<dyn DashboardSink>>,
) -> std::io::Result<WorkerGuard> {
    let filter = LevelFilter::from_level(level.as_tracing_level());
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    // When a dashboard owns the terminal (alternate screen, raw mode),
    // writing plain log lines to stdout would corrupt its display; route
    // those lines to the dashboard layer instead.
    let stdout_layer = if dashboard.is_none() {
        Some(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_filter(filter),
        )
    } else {
        None
    };

    let file_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_target(false)
        .with_writer(non_blocking)
        .with_filter(filter);

    let dashboard_layer = dashboard.map(|sink| {
        tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_target(false)
            .without_time()
            .with_writer(DashboardWriter(sink))
            .with_filter(filter)
    });

    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(file_layer)
        .with(dashboard_layer)
        .init();

    Ok(guard)
}

/// Adapts a `DashboardSink` to `std::io::Write`/`MakeWriter` so the fmt
/// layer can treat it like any other sink. Each `write` call receives one
/// already-formatted log line (fmt layers write a full line per event).
#[derive(Clone)]
struct DashboardWriter(Arc<dyn DashboardSink>);

impl std::io::Write for DashboardWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let line = String::from_utf8_lossy(buf);
        let line = line.trim_end_matches('\n');
        if !line.is_empty() {
            self.0.add_log(line);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for DashboardWriter {
    type Writer = DashboardWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
