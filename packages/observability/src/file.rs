//! Append-only JSONL file sink.

use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::fmt::MakeWriter;

/// Development log location: `~/.my-day/logs/dev.jsonl`.
pub fn default_log_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".my-day").join("logs").join("dev.jsonl"))
}

/// Shared handle to the log file.
///
/// Every event gets its own [`LineWriter`]; the line reaches the file in one
/// write when that writer is dropped, so concurrent events never interleave.
#[derive(Clone)]
pub struct JsonlFile {
    file: Arc<Mutex<File>>,
}

impl JsonlFile {
    /// Open `path` for appending, creating it and its directory as needed.
    pub fn open(path: &Path) -> io::Result<Self> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Arc::new(Mutex::new(file)),
        })
    }

    fn append(&self, bytes: &[u8]) -> io::Result<()> {
        self.file.lock().write_all(bytes)
    }
}

/// Buffers one event and appends it on drop.
pub struct LineWriter {
    sink: JsonlFile,
    buf: Vec<u8>,
}

impl Write for LineWriter {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let result = self.sink.append(&self.buf);
        self.buf.clear();
        result
    }
}

impl Drop for LineWriter {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            eprintln!("failed to append log line: {}", e);
        }
    }
}

impl<'a> MakeWriter<'a> for JsonlFile {
    type Writer = LineWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LineWriter {
            sink: self.clone(),
            buf: Vec::with_capacity(256),
        }
    }
}
