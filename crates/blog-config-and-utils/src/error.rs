use thiserror::Error;

/// Failure while locating, reading or validating client configuration.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A setting has a value the client cannot run with.
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Filesystem error: {0}")]
    Io(#[from] std::io::Error),

    /// `config.json` is not valid JSON for [`Config`](crate::Config).
    #[error("Malformed config file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Cannot resolve path: {0}")]
    Path(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
