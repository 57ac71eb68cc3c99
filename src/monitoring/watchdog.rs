//! Wall-clock limit for a supervised process group

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use log::{debug, warn};
use nix::unistd::Pid;

use super::wait::kill_group;
use crate::errors::{Result, RunError};

/// Kills a process group that is still being supervised when its time is up.
///
/// The timer runs on its own thread from [`Watchdog::arm`] until
/// [`Watchdog::disarm`], independent of whether the child still has its
/// output pipes open. Disarm only while the group leader is unreaped, so the
/// group id cannot have been recycled when the kill goes out.
pub struct Watchdog {
    stop: Sender<()>,
    handle: thread::JoinHandle<bool>,
}

impl Watchdog {
    pub fn arm(pgid: Pid, timeout: Duration) -> Result<Self> {
        let (stop, stopped) = mpsc::channel::<()>();

        let handle = thread::Builder::new()
            .name("watchdog".to_string())
            .spawn(move || match stopped.recv_timeout(timeout) {
                Err(RecvTimeoutError::Timeout) => {
                    warn!(
                        "Timeout of {:?} exceeded, killing process group {}",
                        timeout, pgid
                    );
                    if let Err(e) = kill_group(pgid) {
                        warn!("Failed to kill process group {}: {}", pgid, e);
                    }
                    true
                }
                Ok(()) | Err(RecvTimeoutError::Disconnected) => false,
            })
            .map_err(|source| RunError::WatchdogFailed { source })?;

        debug!("Watchdog armed for process group {} ({:?})", pgid, timeout);
        Ok(Self { stop, handle })
    }

    /// Stop the timer. Returns whether it had already fired.
    pub fn disarm(self) -> bool {
        let _ = self.stop.send(());
        self.handle.join().unwrap_or(false)
    }
}
