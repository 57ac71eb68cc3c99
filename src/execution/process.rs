//! Process supervision: spawn, feed, drain, reap
//!
//! Order of operations:
//! 1. Open the log sink (unless one was handed in)
//! 2. Open (truncate) the output file
//! 3. Read the whole input file into memory
//! 4. Create close-on-exec pipes for stdin, stdout and stderr
//! 5. Spawn the child with its standard streams bound to the pipes
//! 6. Arm the timeout watchdog, if any, and feed stdin from its own thread
//! 7. Drain stdout and stderr until both hit end-of-stream
//! 8. Wait for the child to exit, disarm the watchdog, then reap with wait4
//!
//! The child leads its own process group, so a timeout or a failed drain
//! takes down anything it started along with it.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::os::fd::OwnedFd;
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use log::{debug, info, warn};
use nix::fcntl::OFlag;
use nix::unistd::{Pid, pipe2};

use crate::errors::{Result, RunError};
use crate::execution::spec::ExecutionSpec;
use crate::execution::stream::StreamMultiplexer;
use crate::log_sink::LogSink;
use crate::monitoring::{ResourceReport, Watchdog, kill_group, wait_for_exit, wait_with_usage};

/// A unidirectional channel between parent and child
struct Pipe {
    read: OwnedFd,
    write: OwnedFd,
}

impl Pipe {
    /// Both ends are close-on-exec; the end handed to the child is
    /// duplicated onto its standard stream, which clears the flag there.
    fn open() -> Result<Self> {
        let (read, write) =
            pipe2(OFlag::O_CLOEXEC).map_err(|e| RunError::ChannelCreationFailed {
                source: io::Error::from(e),
            })?;
        Ok(Self { read, write })
    }
}

/// The three channels of one child. Dropping this closes every end still held.
struct Channels {
    stdin: Option<Pipe>,
    stdout: Pipe,
    stderr: Pipe,
}

impl Channels {
    fn open(with_stdin: bool) -> Result<Self> {
        let stdin = if with_stdin { Some(Pipe::open()?) } else { None };
        Ok(Self {
            stdin,
            stdout: Pipe::open()?,
            stderr: Pipe::open()?,
        })
    }
}

/// Parent-side ends left after the child-side ends went to the child
struct ParentEnds {
    stdin: Option<OwnedFd>,
    stdout: OwnedFd,
    stderr: OwnedFd,
}

/// Runs one child described by an [`ExecutionSpec`] to completion.
pub struct Supervisor {
    spec: ExecutionSpec,
    log: Option<Arc<LogSink>>,
}

impl Supervisor {
    /// Supervisor that creates its own log sink at the spec's log path
    pub fn new(spec: ExecutionSpec) -> Self {
        Self { spec, log: None }
    }

    /// Supervisor writing the child's stderr into an existing sink
    pub fn with_log_sink(spec: ExecutionSpec, log: Arc<LogSink>) -> Self {
        Self {
            spec,
            log: Some(log),
        }
    }

    /// Run the child and return its resource report.
    ///
    /// A non-zero exit status is not an error; it is recorded in the report.
    pub fn run(self) -> Result<ResourceReport> {
        let Supervisor { spec, log } = self;
        spec.validate()?;

        let log = match log {
            Some(log) => log,
            None => Arc::new(LogSink::create(spec.log_path())?),
        };

        let output = open_output(spec.output_path())?;
        let input = spec.input_path().map(read_input).transpose()?;

        let channels = Channels::open(input.is_some())?;
        let start = Instant::now();
        let (child, ends) = spawn_child(&spec, channels)?;
        let pid = Pid::from_raw(child.id() as i32);

        info!("Spawned '{}' as pid {}", spec.command_line(), pid);

        let watchdog = or_abandon(
            pid,
            spec.timeout()
                .map(|timeout| Watchdog::arm(pid, timeout))
                .transpose(),
        )?;

        let feeder = match (ends.stdin, input) {
            (Some(stdin), Some(input)) => {
                Some(or_abandon(pid, spawn_input_feeder(stdin, input, pid))?)
            }
            _ => None,
        };

        let multiplexer = StreamMultiplexer::new(BufWriter::new(output), &log);
        if let Err(e) = multiplexer.run(File::from(ends.stdout), File::from(ends.stderr)) {
            if let Some(watchdog) = watchdog {
                watchdog.disarm();
            }
            abandon_child(pid);
            return Err(e);
        }

        wait_for_exit(pid)?;
        let timed_out = watchdog.is_some_and(Watchdog::disarm);
        let termination = wait_with_usage(pid)?;
        let wall_time = start.elapsed();
        drop(child);

        if let Some(feeder) = feeder {
            finish_input(feeder)?;
        }

        let report = ResourceReport::from_termination(&termination, wall_time, timed_out);
        match (report.exit_code, report.signal) {
            (Some(code), _) => info!("pid {} exited with status {}", pid, code),
            (_, Some(signal)) => info!("pid {} killed by signal {}", pid, signal),
            _ => {}
        }
        if log.dropped_records() > 0 {
            warn!(
                "{} stderr records could not be written to {}",
                log.dropped_records(),
                log.path().display()
            );
        }

        Ok(report)
    }
}

fn open_output(path: &Path) -> Result<File> {
    File::create(path).map_err(|source| RunError::OutputUnavailable {
        path: path.to_path_buf(),
        source,
    })
}

/// Input is read eagerly; nothing is streamed from disk once the child runs.
fn read_input(path: &Path) -> Result<Vec<u8>> {
    let data = fs::read(path).map_err(|source| RunError::InputUnavailable {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Read {} input bytes from {}", data.len(), path.display());
    Ok(data)
}

/// Spawn the child with its standard streams bound to the channels.
///
/// The `Command` owns the child-side ends and is dropped before returning,
/// so the parent keeps nothing but its own ends.
fn spawn_child(spec: &ExecutionSpec, channels: Channels) -> Result<(Child, ParentEnds)> {
    let Channels {
        stdin,
        stdout,
        stderr,
    } = channels;

    let (child_stdin, parent_stdin) = match stdin {
        Some(pipe) => (Stdio::from(pipe.read), Some(pipe.write)),
        None => (Stdio::null(), None),
    };

    let mut command = Command::new(spec.program());
    command
        .args(spec.args())
        .process_group(0)
        .stdin(child_stdin)
        .stdout(Stdio::from(stdout.write))
        .stderr(Stdio::from(stderr.write));

    let child = command.spawn().map_err(|source| RunError::SpawnFailed {
        program: spec.program().to_string(),
        source,
    })?;
    drop(command);

    Ok((
        child,
        ParentEnds {
            stdin: parent_stdin,
            stdout: stdout.read,
            stderr: stderr.read,
        },
    ))
}

/// Write all of `input` to the child's stdin on its own thread, then close it.
///
/// Running alongside the drain keeps a child that writes while it reads from
/// stalling on a full stdout pipe.
fn spawn_input_feeder(
    stdin: OwnedFd,
    input: Vec<u8>,
    pid: Pid,
) -> Result<thread::JoinHandle<io::Result<usize>>> {
    thread::Builder::new()
        .name("feed-stdin".to_string())
        .spawn(move || {
            let mut stdin = File::from(stdin);
            stdin.write_all(&input)?;
            debug!("Delivered {} input bytes to pid {}", input.len(), pid);
            Ok(input.len())
        })
        .map_err(|source| RunError::InputDeliveryFailed { source })
}

/// Collect the feeder's outcome. A child that exits without reading all of
/// its input closes the pipe early; that is the child's choice, not a failure.
fn finish_input(feeder: thread::JoinHandle<io::Result<usize>>) -> Result<()> {
    match feeder.join() {
        Ok(Ok(_)) => Ok(()),
        Ok(Err(e)) if e.kind() == io::ErrorKind::BrokenPipe => {
            info!("Child closed stdin before consuming all input");
            Ok(())
        }
        Ok(Err(source)) => Err(RunError::InputDeliveryFailed { source }),
        Err(_) => Err(RunError::InputDeliveryFailed {
            source: io::Error::other("input feeder panicked"),
        }),
    }
}

/// Kill and reap a child whose output can no longer be captured.
fn abandon_child(pid: Pid) {
    if let Err(e) = kill_group(pid) {
        warn!("Failed to kill process group {}: {}", pid, e);
    }
    if let Err(e) = wait_with_usage(pid) {
        warn!("Failed to reap pid {}: {}", pid, e);
    }
}

/// Pass `result` through, abandoning the child first if it is an error.
fn or_abandon<T>(pid: Pid, result: Result<T>) -> Result<T> {
    if result.is_err() {
        abandon_child(pid);
    }
    result
}
