//! sandbox-runner: run a child process and fully capture its effects
//!
//! The supervisor launches one executable, feeds it an optional input file,
//! drains its stdout and stderr concurrently, rewrites stdout (every `,`
//! becomes a tab) into an output file, appends stderr to a timestamped log,
//! and reports the child's CPU and memory usage once it has exited.
//!
//! "Sandbox" here means capture, not containment: no namespaces, cgroups or
//! privilege changes are applied to the child.
//!
//! # Modules
//!
//! - **execution**: Execution spec, supervisor and stream multiplexer
//! - **monitoring**: Termination accounting and the resource report
//! - **log_sink**: Timestamp-prefixing, thread-safe log file writer
//!
//! # Example
//!
//! ```ignore
//! use sandbox_runner::{ExecutionSpec, Supervisor};
//!
//! let spec = ExecutionSpec::builder("/bin/echo")
//!     .arg("a,b,c")
//!     .output("out.tsv")
//!     .log("run.log")
//!     .build()?;
//!
//! let report = Supervisor::new(spec).run()?;
//! report.print();
//! ```

pub mod errors;
pub mod execution;
pub mod log_sink;
pub mod monitoring;

pub use errors::{Result, RunError};
pub use execution::{
    DrainStats, ExecutionSpec, ExecutionSpecBuilder, StreamKind, StreamMultiplexer, Supervisor,
};
pub use log_sink::LogSink;
pub use monitoring::ResourceReport;
