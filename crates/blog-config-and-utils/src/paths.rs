//! On-disk locations of the blog client.
//!
//! ```text
//! ~/.my-day/
//!   config.json          Config
//!   local_storage.json   session marker and cached identities
//!   logs/my-day.jsonl    structured log
//! ```

use crate::{CoreError, CoreResult};
use std::path::{Path, PathBuf};

const APP_DIR: &str = ".my-day";
const CONFIG_FILE: &str = "config.json";
const LOCAL_STORAGE_FILE: &str = "local_storage.json";
const LOGS_DIR: &str = "logs";

/// Resolves every file the client reads or writes from one root directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    root: PathBuf,
}

impl Paths {
    /// Paths under `~/.my-day`.
    pub fn new() -> CoreResult<Self> {
        dirs::home_dir()
            .map(|home| Self::with_base_dir(home.join(APP_DIR)))
            .ok_or_else(|| CoreError::Path("no home directory for ~/.my-day".to_string()))
    }

    /// Paths under an arbitrary root, for tests and portable installs.
    pub fn with_base_dir(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn base_dir(&self) -> &Path {
        &self.root
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    /// Backing file of the local persistence shim.
    pub fn local_storage_file(&self) -> PathBuf {
        self.root.join(LOCAL_STORAGE_FILE)
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join(LOGS_DIR)
    }

    /// Create the root and logs directories if missing.
    pub fn ensure_dirs(&self) -> CoreResult<()> {
        std::fs::create_dir_all(self.logs_dir())?;
        Ok(())
    }
}
