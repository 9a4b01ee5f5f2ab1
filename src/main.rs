//! src/main.rs
//!
//! Entry point for the bustrs binary.
//!
//! Responsibilities:
//!   1) Parse command-line flags into `Config` (via `clap`).
//!   2) Initialize structured logging.
//!   3) Validate and normalize the config (base URL, db path).
//!   4) Read the wordlist and parse extensions.
//!   5) Build and run the `Supervisor`, translating its outcome into an
//!      exit code.
//!
//! Mirrors the role of `original_source/main.go`'s flag parsing and the
//! teacher's `main.rs` client-construction + orchestration hand-off, but
//! delegates lifecycle to `Supervisor` instead of a single `scan()` call.

use clap::Parser;

use bustrs::config::Config;
use bustrs::supervisor::Supervisor;
use bustrs::wordlist;

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    let config = Config::parse();

    let config = match config.normalize_and_validate() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    #[cfg(feature = "dashboard")]
    let dashboard_tui = if config.dashboard {
        match bustrs::tui::Tui::start() {
            Ok(tui) => Some(std::sync::Arc::new(tui)),
            Err(e) => {
                eprintln!("failed to start dashboard: {e}");
                std::process::exit(1);
            }
        }
    } else {
        None
    };

    #[cfg(feature = "dashboard")]
    let dashboard_sink = dashboard_tui
        .clone()
        .map(|tui| tui as std::sync::Arc<dyn bustrs::monitor::DashboardSink>);
    #[cfg(not(feature = "dashboard"))]
    let dashboard_sink: Option<std::sync::Arc<dyn bustrs::monitor::DashboardSink>> = None;

    let _log_guard = match bustrs::logging::init(&config.log_file, config.log_level, dashboard_sink.clone()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("failed to open log file {}: {e}", config.log_file);
            std::process::exit(1);
        }
    };

    let words = match wordlist::read_wordlist(&config.wordlist) {
        Ok(words) => words,
        Err(e) => {
            tracing::error!(error = %e, wordlist = %config.wordlist, "failed to read wordlist");
            std::process::exit(1);
        }
    };
    let extensions = config.parse_extensions();

    let supervisor = match Supervisor::new(config).await {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "failed to start supervisor");
            std::process::exit(1);
        }
    };

    let supervisor = match dashboard_sink {
        Some(sink) => supervisor.with_dashboard(sink),
        None => supervisor,
    };

    #[cfg(feature = "dashboard")]
    let input_loop_handle = dashboard_tui.map(|tui| {
        let halt = supervisor.halt_handle();
        tokio::spawn(async move { tui.run_input_loop(halt).await })
    });

    let result = supervisor.run(words, extensions).await;

    #[cfg(feature = "dashboard")]
    if let Some(handle) = input_loop_handle {
        handle.abort();
    }

    match result {
        Ok(outcome) => {
            if let Some(err) = outcome.fatal_error {
                tracing::error!(error = %err, "bust terminated with a fatal error");
                std::process::exit(1);
            }
            tracing::info!(drained = outcome.drained, "bust finished");
            std::process::exit(0);
        }
        Err(e) => {
            tracing::error!(error = %e, "bust failed to run");
            std::process::exit(1);
        }
    }
}
