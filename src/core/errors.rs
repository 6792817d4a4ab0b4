//! Errors raised by workload construction and restart-time mutations.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum WorkloadError {
    /// Aggregate statistics of a trace are undefined without fragments. An empty trace is not the
    /// same thing as a trace with zero demand, so it is never defaulted.
    #[error("trace workload must contain at least one fragment")]
    EmptyTrace,
    /// Attempt to drop more fragments than the trace currently holds.
    #[error("cannot remove {requested} fragments from a trace of {available} fragments")]
    FragmentRange { requested: usize, available: usize },
}
