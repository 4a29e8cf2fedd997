//! Logging setup shared by the My Day crates.
//!
//! Library crates only emit `tracing` events. The application calls
//! [`init_with_config`] once; after that events go to:
//!
//! - stderr, compact human-readable lines, when no file sink is configured
//!   or [`LogConfig::also_stderr`] is set;
//! - a JSONL file (see [`JsonLayer`]) when [`LogConfig::log_path`] is set.
//!   Builds with the `dev` feature fall back to `~/.my-day/logs/dev.jsonl`.
//!
//! `RUST_LOG` overrides the configured level for every sink.

mod file;
mod json_layer;

use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

pub use file::{default_log_path, JsonlFile, LineWriter};
pub use json_layer::{JsonLayer, LogRecord};

/// What to install as the global subscriber.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Written as `service` on every JSONL line.
    pub service_name: String,
    /// Filter directive used when `RUST_LOG` is unset, e.g. `"debug"` or
    /// `"info,blog_auth=trace"`.
    pub default_level: String,
    pub log_path: Option<PathBuf>,
    /// Keep stderr output while the file sink is active.
    pub also_stderr: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "my-day".into(),
            default_level: "info".into(),
            log_path: None,
            also_stderr: false,
        }
    }
}

impl LogConfig {
    /// File sink after applying the `dev` fallback.
    pub fn effective_log_path(&self) -> Option<PathBuf> {
        match &self.log_path {
            Some(path) => Some(path.clone()),
            None if cfg!(feature = "dev") => default_log_path(),
            None => None,
        }
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.default_level))
    }
}

/// Stderr-only logging for `service_name`.
pub fn init(service_name: &str) {
    init_with_config(LogConfig {
        service_name: service_name.into(),
        ..Default::default()
    });
}

/// Install the global subscriber. Returns false if one was already set;
/// the existing subscriber stays in place.
pub fn init_with_config(config: LogConfig) -> bool {
    let file = config
        .effective_log_path()
        .and_then(|path| match JsonlFile::open(&path) {
            Ok(file) => Some((path, file)),
            Err(e) => {
                // No subscriber yet, so stderr is the only place to say so
                eprintln!("log file {} unavailable: {}", path.display(), e);
                None
            }
        });

    let stderr_layer = (file.is_none() || config.also_stderr).then(|| {
        tracing_subscriber::fmt::layer()
            .compact()
            .with_target(true)
            .with_writer(std::io::stderr)
            .with_filter(config.filter())
    });

    let (log_path, json_layer) = match file {
        Some((path, file)) => (
            Some(path),
            Some(JsonLayer::new(config.service_name.as_str(), file).with_filter(config.filter())),
        ),
        None => (None, None),
    };

    let installed = tracing_subscriber::registry()
        .with(json_layer)
        .with(stderr_layer)
        .try_init()
        .is_ok();

    if let (true, Some(path)) = (installed, log_path) {
        tracing::info!(log_path = %path.display(), "File logging enabled");
    }
    installed
}
