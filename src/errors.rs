//! Error types for supervised runs

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::execution::StreamKind;

/// Result type for supervised runs
pub type Result<T> = std::result::Result<T, RunError>;

/// Errors that can occur while supervising a child process.
///
/// None of these are retried: each is either a static misconfiguration
/// (missing file, bad path) or a condition that needs operator attention.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("Invalid execution spec: {0}")]
    InvalidSpec(String),

    #[error("Cannot open log file {}: {source}", path.display())]
    LogUnavailable { path: PathBuf, source: io::Error },

    #[error("Cannot open output file {}: {source}", path.display())]
    OutputUnavailable { path: PathBuf, source: io::Error },

    #[error("Cannot read input file {}: {source}", path.display())]
    InputUnavailable { path: PathBuf, source: io::Error },

    #[error("Channel creation failed: {source}")]
    ChannelCreationFailed { source: io::Error },

    #[error("Failed to spawn {program}: {source}")]
    SpawnFailed { program: String, source: io::Error },

    #[error("Failed to deliver input to child: {source}")]
    InputDeliveryFailed { source: io::Error },

    #[error("Failed to read child {stream}: {source}")]
    StreamReadFailed { stream: StreamKind, source: io::Error },

    #[error("Failed to write output file: {source}")]
    OutputWriteFailed { source: io::Error },

    #[error("Failed to start timeout watchdog: {source}")]
    WatchdogFailed { source: io::Error },

    #[error("Failed to wait for child {pid}: {source}")]
    WaitFailed { pid: i32, source: io::Error },
}

impl RunError {
    /// Whether the error was raised before any child process existed.
    pub fn is_pre_spawn(&self) -> bool {
        matches!(
            self,
            RunError::InvalidSpec(_)
                | RunError::LogUnavailable { .. }
                | RunError::OutputUnavailable { .. }
                | RunError::InputUnavailable { .. }
                | RunError::ChannelCreationFailed { .. }
                | RunError::SpawnFailed { .. }
        )
    }
}
