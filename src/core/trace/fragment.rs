//! Type definition for a single constant-demand interval of a trace.

use serde::Serialize;

/// Demand of a workload over one interval of its trace.
///
/// Only the end of the interval is stored. The interval starts where the previous fragment of the
/// trace ends, the first fragment starts at the simulation epoch.
#[derive(Debug, Serialize, Clone, Copy, PartialEq)]
pub struct TraceFragment {
    /// Timestamp at which the fragment ends, in milliseconds since the simulation epoch.
    pub duration: u64,
    /// Cpu demand during the fragment.
    pub cpu_usage: f64,
    /// Number of cores the demand is spread over.
    pub core_count: u32,
}

impl TraceFragment {
    pub fn new(duration: u64, cpu_usage: f64, core_count: u32) -> Self {
        Self {
            duration,
            cpu_usage,
            core_count,
        }
    }
}
