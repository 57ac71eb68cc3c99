//! Post-mortem resource report

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use super::wait::{Termination, timeval_secs};

/// CPU and memory accounting for one finished child.
///
/// `max_rss` is passed through as the platform reports it (kilobytes on
/// Linux), without normalization.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResourceReport {
    /// User CPU time in seconds
    pub user_time: f64,
    /// System CPU time in seconds
    pub system_time: f64,
    /// Peak resident set size
    pub max_rss: i64,
    /// Exit code when the child exited normally
    pub exit_code: Option<i32>,
    /// Signal that killed the child (if any)
    pub signal: Option<i32>,
    /// Whether the child was killed for exceeding its timeout
    pub timed_out: bool,
    /// Wall clock time from spawn to reap, in milliseconds
    pub wall_time_ms: u64,
}

impl ResourceReport {
    pub(crate) fn from_termination(
        termination: &Termination,
        wall_time: Duration,
        timed_out: bool,
    ) -> Self {
        Self {
            user_time: timeval_secs(&termination.usage.ru_utime),
            system_time: timeval_secs(&termination.usage.ru_stime),
            max_rss: i64::from(termination.usage.ru_maxrss),
            exit_code: termination.exit_code(),
            signal: termination.signal(),
            timed_out,
            wall_time_ms: wall_time.as_millis() as u64,
        }
    }

    /// Whether the child exited on its own with status 0
    pub fn success(&self) -> bool {
        self.exit_code == Some(0) && !self.timed_out
    }

    /// Render the three report lines
    pub fn format(&self) -> String {
        self.to_string()
    }

    /// Print the three report lines to stdout
    pub fn print(&self) {
        println!("{self}");
    }
}

impl fmt::Display for ResourceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "User CPU Time: {:.6} sec", self.user_time)?;
        writeln!(f, "System CPU Time: {:.6} sec", self.system_time)?;
        write!(f, "Maximum Resident Set Size: {} KB", self.max_rss)
    }
}
