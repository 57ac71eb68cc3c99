//! Stream handling for process output
//!
//! Each output pipe gets its own reader thread that forwards chunks over a
//! shared channel; a single consumer owns the output file and the log sink.
//! Blocking on that channel is the readiness wait: whichever pipe has data
//! is serviced next, and the loop ends once both readers hit end-of-stream
//! and hang up.

use std::fmt;
use std::io::{self, Read, Write};
use std::sync::mpsc::{self, Sender};
use std::thread;

use log::debug;

use crate::errors::{Result, RunError};
use crate::log_sink::LogSink;

/// Upper bound on a single read from a pipe
pub const CHUNK_SIZE: usize = 4096;

/// Which of the child's output pipes a chunk came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamKind::Stdout => f.write_str("stdout"),
            StreamKind::Stderr => f.write_str("stderr"),
        }
    }
}

/// A chunk of process output
#[derive(Debug)]
pub enum StreamChunk {
    /// Data from stdout
    Stdout(Vec<u8>),
    /// Data from stderr
    Stderr(Vec<u8>),
    /// A read failed; the reader has stopped
    Failed { stream: StreamKind, error: io::Error },
}

impl StreamChunk {
    fn data(stream: StreamKind, bytes: &[u8]) -> Self {
        match stream {
            StreamKind::Stdout => StreamChunk::Stdout(bytes.to_vec()),
            StreamKind::Stderr => StreamChunk::Stderr(bytes.to_vec()),
        }
    }
}

/// Rewrite a stdout chunk in place: every comma becomes a tab.
pub fn transform_chunk(chunk: &mut [u8]) {
    for byte in chunk.iter_mut() {
        if *byte == b',' {
            *byte = b'\t';
        }
    }
}

/// Spawn a reader thread that drains `reader` into `tx` until end-of-stream.
pub fn spawn_fd_reader<R>(
    mut reader: R,
    stream: StreamKind,
    tx: Sender<StreamChunk>,
) -> io::Result<thread::JoinHandle<()>>
where
    R: Read + Send + 'static,
{
    thread::Builder::new()
        .name(format!("drain-{stream}"))
        .spawn(move || {
            let mut buf = [0u8; CHUNK_SIZE];
            loop {
                match reader.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => {
                        if tx.send(StreamChunk::data(stream, &buf[..n])).is_err() {
                            break;
                        }
                    }
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(error) => {
                        let _ = tx.send(StreamChunk::Failed { stream, error });
                        break;
                    }
                }
            }
        })
}

/// Byte counts observed while draining
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainStats {
    pub stdout_bytes: u64,
    pub stderr_bytes: u64,
    pub stdout_chunks: u64,
    pub stderr_chunks: u64,
}

/// Drains stdout into `out_dest` (comma→tab) and stderr into the log sink.
pub struct StreamMultiplexer<'a, W: Write> {
    out_dest: W,
    log: &'a LogSink,
}

impl<'a, W: Write> StreamMultiplexer<'a, W> {
    pub fn new(out_dest: W, log: &'a LogSink) -> Self {
        Self { out_dest, log }
    }

    /// Drain `out` and `err` until both report end-of-stream.
    ///
    /// Order is preserved within each stream; there is no ordering between
    /// the two. The first failed read or output write aborts the drain.
    pub fn run<O, E>(mut self, out: O, err: E) -> Result<DrainStats>
    where
        O: Read + Send + 'static,
        E: Read + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();

        let stdout_reader = spawn_fd_reader(out, StreamKind::Stdout, tx.clone())
            .map_err(|source| RunError::ChannelCreationFailed { source })?;
        let stderr_reader = spawn_fd_reader(err, StreamKind::Stderr, tx)
            .map_err(|source| RunError::ChannelCreationFailed { source })?;

        let mut stats = DrainStats::default();

        while let Ok(chunk) = rx.recv() {
            match chunk {
                StreamChunk::Stdout(mut data) => {
                    transform_chunk(&mut data);
                    self.out_dest
                        .write_all(&data)
                        .map_err(|source| RunError::OutputWriteFailed { source })?;
                    stats.stdout_bytes += data.len() as u64;
                    stats.stdout_chunks += 1;
                }
                StreamChunk::Stderr(data) => {
                    self.log.append(&data);
                    stats.stderr_bytes += data.len() as u64;
                    stats.stderr_chunks += 1;
                }
                StreamChunk::Failed { stream, error } => {
                    return Err(RunError::StreamReadFailed {
                        stream,
                        source: error,
                    });
                }
            }
        }

        self.out_dest
            .flush()
            .map_err(|source| RunError::OutputWriteFailed { source })?;

        // Both senders are gone, so both threads are past their last send.
        let _ = stdout_reader.join();
        let _ = stderr_reader.join();

        debug!(
            "Drained {} stdout bytes in {} chunks, {} stderr bytes in {} chunks",
            stats.stdout_bytes, stats.stdout_chunks, stats.stderr_bytes, stats.stderr_chunks
        );

        Ok(stats)
    }
}
