//! Child termination with resource accounting via wait4(2)

use std::io;
use std::mem;

use nix::errno::Errno;
use nix::sys::signal::{Signal, killpg};
use nix::sys::wait::WaitStatus;
use nix::unistd::Pid;

use crate::errors::{Result, RunError};

/// How a child ended and what it consumed
#[derive(Debug, Clone, Copy)]
pub struct Termination {
    pub status: WaitStatus,
    pub usage: libc::rusage,
}

impl Termination {
    /// Exit code if the child exited normally
    pub fn exit_code(&self) -> Option<i32> {
        match self.status {
            WaitStatus::Exited(_, code) => Some(code),
            _ => None,
        }
    }

    /// Signal number if the child was killed by a signal
    pub fn signal(&self) -> Option<i32> {
        match self.status {
            WaitStatus::Signaled(_, signal, _) => Some(signal as i32),
            _ => None,
        }
    }
}

/// Block until `pid` terminates, collecting its status and rusage in the
/// same call so the accounting always belongs to the reaped child.
pub fn wait_with_usage(pid: Pid) -> Result<Termination> {
    loop {
        let mut raw_status: libc::c_int = 0;
        // SAFETY: rusage is plain old data; all-zero is a valid value.
        let mut usage: libc::rusage = unsafe { mem::zeroed() };

        // SAFETY: both out-pointers are valid for the duration of the call.
        let ret = unsafe { libc::wait4(pid.as_raw(), &mut raw_status, 0, &mut usage) };
        if ret == -1 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                continue;
            }
            return Err(RunError::WaitFailed {
                pid: pid.as_raw(),
                source: err,
            });
        }

        let status = WaitStatus::from_raw(pid, raw_status).map_err(|e| RunError::WaitFailed {
            pid: pid.as_raw(),
            source: io::Error::from(e),
        })?;

        match status {
            WaitStatus::Exited(..) | WaitStatus::Signaled(..) => {
                return Ok(Termination { status, usage });
            }
            _ => continue,
        }
    }
}

/// Block until `pid` has terminated without reaping it.
///
/// The zombie keeps the pid (and so the process group id) reserved until
/// [`wait_with_usage`] collects it.
pub fn wait_for_exit(pid: Pid) -> Result<()> {
    loop {
        // SAFETY: siginfo_t is plain old data; all-zero is a valid value.
        let mut info: libc::siginfo_t = unsafe { mem::zeroed() };

        // SAFETY: `info` is valid for the duration of the call.
        let ret = unsafe {
            libc::waitid(
                libc::P_PID,
                pid.as_raw() as libc::id_t,
                &mut info,
                libc::WEXITED | libc::WNOWAIT,
            )
        };
        if ret == 0 {
            return Ok(());
        }

        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::Interrupted {
            return Err(RunError::WaitFailed {
                pid: pid.as_raw(),
                source: err,
            });
        }
    }
}

/// Send SIGKILL to every process in the group led by `pgid`.
/// A group that is already gone is fine.
pub fn kill_group(pgid: Pid) -> io::Result<()> {
    match killpg(pgid, Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => Ok(()),
        Err(e) => Err(io::Error::from(e)),
    }
}

/// Convert a `timeval` to fractional seconds
pub fn timeval_secs(tv: &libc::timeval) -> f64 {
    tv.tv_sec as f64 + tv.tv_usec as f64 / 1e6
}
