//! Timestamped, serialized log file writer
//!
//! Every [`LogSink::append`] call becomes one record: a local-time prefix
//! with millisecond resolution followed by the raw bytes of the call. The
//! prefix marks a delivered fragment, not a logical line, so a producer that
//! flushes mid-line gets that line split across two records.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Local;
use log::warn;

use crate::errors::{Result, RunError};

/// `strftime` pattern of the record prefix, e.g. `2024-10-16 09:15:02.041`
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Byte length of `[<timestamp>] `
pub const PREFIX_LEN: usize = 26;

/// Append-only log file shared by every producer of diagnostic output.
///
/// Writers are serialized by an internal lock, so concurrent `append` calls
/// never interleave. Failed writes are counted and reported through `log`
/// rather than returned: losing a log record never fails a run.
#[derive(Debug)]
pub struct LogSink {
    path: PathBuf,
    file: Mutex<File>,
    dropped: AtomicU64,
}

impl LogSink {
    /// Create (or truncate) the log file at `path`
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| RunError::LogUnavailable {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
            dropped: AtomicU64::new(0),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write one timestamped record.
    ///
    /// The timestamp is taken when the call is made, before waiting on the lock.
    pub fn append(&self, message: &[u8]) {
        let mut record = format_prefix(Local::now()).into_bytes();
        record.extend_from_slice(message);

        let mut file = self
            .file
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());

        if let Err(e) = file.write_all(&record) {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            warn!(
                "Dropped {} byte log record for {}: {}",
                message.len(),
                self.path.display(),
                e
            );
        }
    }

    pub fn append_str(&self, message: &str) {
        self.append(message.as_bytes());
    }

    /// Number of records lost to write failures
    pub fn dropped_records(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

fn format_prefix(now: chrono::DateTime<Local>) -> String {
    format!("[{}] ", now.format(TIMESTAMP_FORMAT))
}
