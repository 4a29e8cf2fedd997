//! Configuration, paths, logging setup and the core error type shared by the
//! My Day blog crates.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{
    Config, DEFAULT_ADMIN_EMAILS, DEFAULT_KAKAO_SCOPE, DEFAULT_LOG_LEVEL, DEFAULT_PAGE_SIZE,
    DEFAULT_SDK_LOAD_TIMEOUT_MS,
};
pub use error::{CoreError, CoreResult};
pub use logging::{filter_directive, init_logging, log_config, log_file, LOG_FILE_NAME};
pub use paths::Paths;
