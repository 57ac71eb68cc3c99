//! Monitoring layer: termination accounting for the supervised child
//!
//! The child is reaped with `wait4(2)`, which hands back its exit status
//! and its `rusage` in one call. Nothing is sampled while it runs; the only
//! live supervision is the optional [`Watchdog`] that enforces a timeout.

pub mod report;
pub mod wait;
pub mod watchdog;

pub use report::ResourceReport;
pub use wait::{Termination, kill_group, wait_for_exit, wait_with_usage};
pub use watchdog::Watchdog;
