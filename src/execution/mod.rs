//! Execution layer: what to run, how to run it, and how its output is drained
//!
//! # Features
//!
//! - **Execution spec**: validated program, arguments and file bindings
//! - **Supervisor**: pipe setup, spawn, stdin delivery, reaping
//! - **Stream multiplexer**: concurrent stdout/stderr draining
//!
//! # Examples
//!
//! ```ignore
//! use sandbox_runner::execution::{ExecutionSpec, Supervisor};
//!
//! let spec = ExecutionSpec::builder("/usr/bin/python3")
//!     .args(["export.py", "--csv"])
//!     .input("rows.csv")
//!     .output("rows.tsv")
//!     .log("export.log")
//!     .build()?;
//! let report = Supervisor::new(spec).run()?;
//! ```

pub mod process;
pub mod spec;
pub mod stream;

pub use process::Supervisor;
pub use spec::{ExecutionSpec, ExecutionSpecBuilder};
pub use stream::{DrainStats, StreamChunk, StreamKind, StreamMultiplexer, transform_chunk};
