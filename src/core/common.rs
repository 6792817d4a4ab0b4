pub type SimComponentId = dslab_core::Id;

/// Identifier of a submitted workload, unique within one simulation.
pub type WorkloadId = u64;
