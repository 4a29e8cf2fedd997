//! Logging setup for the blog client.

use crate::{Config, Paths};
use observability::{init_with_config, LogConfig};
use std::path::PathBuf;

/// File the client appends structured logs to, under the logs directory.
pub const LOG_FILE_NAME: &str = "my-day.jsonl";

/// Build the observability config for the client.
///
/// `config.log_level` is an `EnvFilter` directive such as `debug` or
/// `info,blog_auth=trace`; `RUST_LOG` still wins over it at init time. The
/// JSONL file sink is on unless `MY_DAY_LOG_FILE` is `0`/`false`; stderr
/// output is on unless `MY_DAY_LOG_STDERR` is.
pub fn log_config<F>(config: &Config, paths: &Paths, lookup: F) -> LogConfig
where
    F: Fn(&str) -> Option<String>,
{
    let enabled = |name: &str| {
        lookup(name)
            .map(|value| !matches!(value.trim(), "0" | "false"))
            .unwrap_or(true)
    };

    LogConfig {
        service_name: "my-day".into(),
        default_level: filter_directive(&config.log_level),
        log_path: enabled("MY_DAY_LOG_FILE").then(|| log_file(paths)),
        also_stderr: enabled("MY_DAY_LOG_STDERR"),
    }
}

/// Install the global subscriber. Only the first call has an effect.
///
/// ```ignore
/// let paths = Paths::new()?;
/// let config = Config::load(&paths)?;
/// init_logging(&config, &paths);
/// tracing::info!("blog client started");
/// ```
pub fn init_logging(config: &Config, paths: &Paths) {
    init_with_config(log_config(config, paths, |name| std::env::var(name).ok()));
}

pub fn log_file(paths: &Paths) -> PathBuf {
    paths.logs_dir().join(LOG_FILE_NAME)
}

/// The configured directive, trimmed; blank means `info`.
pub fn filter_directive(level: &str) -> String {
    match level.trim() {
        "" => "info".to_string(),
        directive => directive.to_string(),
    }
}
