//! src/config.rs
//!
//! Command-line interface for bustrs, defined with `clap`'s derive API —
//! generalized from the teacher's `args.rs` (which covered a handful of
//! scanner flags) to the full flag set in spec.md §6.
//!
//! Also owns base-URL normalization/validation, which the teacher kept in a
//! separate `url.rs`; it is folded in here since `Config` is the only
//! consumer and the two were always validated together.

use std::time::Duration;

use clap::Parser;

use crate::error::ConfigError;

/// Default extensions used when `--extensions` is not provided.
const DEFAULT_EXTENSIONS: &str = "html,php";

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Resumable, concurrent web directory brute-forcer")]
pub struct Config {
    /// Base URL to bust (must start with http:// or https://). A missing
    /// trailing slash is added automatically.
    #[arg(long)]
    pub url: String,

    /// Path to a newline-delimited wordlist file.
    #[arg(short, long)]
    pub wordlist: String,

    /// Number of HTTP prober workers.
    #[arg(long, default_value_t = 5)]
    pub workers: usize,

    /// Truncate the store before starting.
    #[arg(long, default_value_t = false)]
    pub clear_db: bool,

    /// Store file path. A `.db` suffix is appended if missing.
    #[arg(long, default_value = "bust.db")]
    pub db: String,

    /// Log file path.
    #[arg(long, default_value = "bust.log")]
    pub log_file: String,

    /// Minimum log level written to the log file and stdout.
    #[arg(long, default_value = "info")]
    pub log_level: LogLevel,

    /// Comma-separated extra extensions to try for each word. The empty
    /// extension (bare word) is always tried first regardless of this list.
    #[arg(long, default_value = DEFAULT_EXTENSIONS)]
    pub extensions: String,

    /// Work queue capacity (also used for the completion channel).
    #[arg(long, default_value_t = 5000)]
    pub queue_size: usize,

    /// Poller claim batch size.
    #[arg(long, default_value_t = 5000)]
    pub poller_batch_size: u32,

    /// Per-request HTTP timeout in seconds. 0 disables the timeout.
    #[arg(long, default_value_t = 10)]
    pub timeout: u64,

    /// Recursively expand any URL that returns HTTP 200.
    #[arg(long, default_value_t = false)]
    pub recurse: bool,

    /// Show a terminal dashboard instead of logging status to stdout.
    /// Only available when built with the `dashboard` feature.
    #[cfg(feature = "dashboard")]
    #[arg(long, default_value_t = false)]
    pub dashboard: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
    Panic,
}

impl LogLevel {
    /// `tracing` has no dedicated fatal/panic level; both map onto `ERROR`,
    /// its most severe native level (see SPEC_FULL.md §6).
    pub fn as_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error | LogLevel::Fatal | LogLevel::Panic => tracing::Level::ERROR,
        }
    }
}

impl Config {
    /// Validate flags and normalize the base URL / db path. Must be called
    /// before any component is started; failures here are `ConfigError`,
    /// printed to stderr with exit code 1 (spec.md §7).
    pub fn normalize_and_validate(mut self) -> Result<Self, ConfigError> {
        if self.workers < 1 {
            return Err(ConfigError::InvalidWorkers);
        }
        if self.queue_size < 1 {
            return Err(ConfigError::InvalidQueueSize);
        }
        if self.poller_batch_size < 1 {
            return Err(ConfigError::InvalidBatchSize);
        }

        self.url = normalize_base_url(&self.url)?;

        if !self.db.ends_with(".db") {
            self.db.push_str(".db");
        }

        Ok(self)
    }

    /// Parses `--timeout` into a `Duration`; `0` means unbounded, encoded
    /// as `None` so the HTTP client builder can skip setting a timeout at
    /// all (spec.md §6: "0 disables").
    pub fn request_timeout(&self) -> Option<Duration> {
        if self.timeout == 0 {
            None
        } else {
            Some(Duration::from_secs(self.timeout))
        }
    }

    /// Parses the comma-separated `--extensions` string into the ordered
    /// extension list used by the Expander, with the empty extension always
    /// first (spec.md §4.2 / §6).
    pub fn parse_extensions(&self) -> Vec<String> {
        let mut out = vec![String::new()];
        for raw in self.extensions.split(',') {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                continue;
            }
            let no_dot = trimmed.trim_start_matches('.');
            out.push(format!(".{no_dot}"));
        }
        out
    }
}

/// Ensure the base URL starts with http/https and ends with a trailing
/// slash, generalized from the teacher's `url::normalize_base`.
fn normalize_base_url(base: &str) -> Result<String, ConfigError> {
    let mut b = base.trim().to_string();

    let starts_http = b.starts_with("http://");
    let starts_https = b.starts_with("https://");
    if !starts_http && !starts_https {
        return Err(ConfigError::InvalidBaseUrl);
    }

    if !b.ends_with('/') {
        b.push('/');
    }

    Ok(b)
}
