//! Events which are emitted by the simulation client and by host components to themselves.

use serde::Serialize;

use crate::core::common::WorkloadId;

/// Event from host to itself to start a submitted workload on its machine.
#[derive(Serialize, Clone)]
pub struct StartWorkload {
    pub workload_id: WorkloadId,
}

/// Event from host to itself at the time of the next state change of a running workload, which
/// is either the end of a trace fragment or a checkpoint.
#[derive(Serialize, Clone)]
pub struct UpdateWorkload {
    pub workload_id: WorkloadId,
}

/// Event from client to host telling that the machine fails for `downtime` milliseconds. All
/// workloads running on the host are interrupted and lose the progress made after their last
/// checkpoint.
#[derive(Serialize, Clone)]
pub struct HostFailed {
    pub downtime: f64,
}

/// Event from host to itself when the failed machine is back. Interrupted workloads are restored
/// from their snapshots.
#[derive(Serialize, Clone)]
pub struct HostRecovered {}
