//! Trace workload: a piecewise-constant demand trace plus its checkpoint configuration.

use std::collections::VecDeque;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::core::errors::WorkloadError;
use crate::core::flow::FlowSupplierRef;
use crate::core::machine::SimMachine;
use crate::core::trace::fragment::TraceFragment;
use crate::core::trace::scaling::helpers::{default_scaling_policy, scaling_policy_from_config};
use crate::core::trace::scaling::interface::{ScalingPolicy, ScalingPolicyConfig};
use crate::core::trace::sim_trace_workload::SimTraceWorkload;
use crate::core::workload::{CompletionCallback, SimWorkload, Workload};

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct CheckpointConfig {
    #[serde(default)]
    pub interval: u64, // in milliseconds
    #[serde(default)]
    pub duration: u64, // in milliseconds
    #[serde(default = "interval_scaling_default")]
    pub interval_scaling: f64,
}

fn interval_scaling_default() -> f64 {
    1.0
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            interval: 0,
            duration: 0,
            interval_scaling: interval_scaling_default(),
        }
    }
}

/// Ordered sequence of trace fragments owned by the workload.
///
/// `max_cpu_demand` and `max_core_count` are computed once at construction and describe the
/// trace as it was built. They are not updated by `remove_fragments` or `add_first`.
#[derive(Clone)]
pub struct TraceWorkload {
    fragments: VecDeque<TraceFragment>,
    checkpoint_interval: u64,
    checkpoint_duration: u64,
    checkpoint_interval_scaling: f64,
    max_cpu_demand: f64,
    max_core_count: u32,
    scaling_policy: Rc<dyn ScalingPolicy>,
}

impl TraceWorkload {
    pub fn new(
        fragments: Vec<TraceFragment>,
        checkpoint_interval: u64,
        checkpoint_duration: u64,
        checkpoint_interval_scaling: f64,
        scaling_policy: Rc<dyn ScalingPolicy>,
    ) -> Result<Self, WorkloadError> {
        let max_core_count = fragments
            .iter()
            .map(|fragment| fragment.core_count)
            .max()
            .ok_or(WorkloadError::EmptyTrace)?;
        let max_cpu_demand = fragments
            .iter()
            .map(|fragment| fragment.cpu_usage)
            .fold(f64::NEG_INFINITY, f64::max);

        Ok(Self {
            fragments: fragments.into(),
            checkpoint_interval,
            checkpoint_duration,
            checkpoint_interval_scaling,
            max_cpu_demand,
            max_core_count,
            scaling_policy,
        })
    }

    /// Workload without checkpoints and with no delay scaling.
    pub fn from_fragments(fragments: Vec<TraceFragment>) -> Result<Self, WorkloadError> {
        Self::new(fragments, 0, 0, 1.0, default_scaling_policy())
    }

    /// Live view of the remaining fragments.
    pub fn fragments(&self) -> &VecDeque<TraceFragment> {
        &self.fragments
    }

    /// Live mutable view of the remaining fragments. Changes are seen by the workload itself, no
    /// copy is made.
    pub fn fragments_mut(&mut self) -> &mut VecDeque<TraceFragment> {
        &mut self.fragments
    }

    pub fn max_core_count(&self) -> u32 {
        self.max_core_count
    }

    pub fn max_cpu_demand(&self) -> f64 {
        self.max_cpu_demand
    }

    pub fn scaling_policy(&self) -> &Rc<dyn ScalingPolicy> {
        &self.scaling_policy
    }

    /// Drops the first `count` fragments, e.g. the progress made before a checkpoint.
    /// Fails without touching the trace if it holds less than `count` fragments.
    pub fn remove_fragments(&mut self, count: usize) -> Result<(), WorkloadError> {
        if count == 0 {
            return Ok(());
        }
        if count > self.fragments.len() {
            return Err(WorkloadError::FragmentRange {
                requested: count,
                available: self.fragments.len(),
            });
        }
        self.fragments.drain(..count);
        Ok(())
    }

    /// Puts `fragment` in front of the trace. Ordering of fragment ends is not checked.
    pub fn add_first(&mut self, fragment: TraceFragment) {
        self.fragments.push_front(fragment);
    }

    pub fn builder() -> TraceWorkloadBuilder {
        Self::builder_with(0, 0, 0.0, default_scaling_policy())
    }

    pub fn builder_with(
        checkpoint_interval: u64,
        checkpoint_duration: u64,
        checkpoint_interval_scaling: f64,
        scaling_policy: Rc<dyn ScalingPolicy>,
    ) -> TraceWorkloadBuilder {
        TraceWorkloadBuilder::new(
            checkpoint_interval,
            checkpoint_duration,
            checkpoint_interval_scaling,
            scaling_policy,
        )
    }

    pub fn builder_from_config(
        checkpoint: &CheckpointConfig,
        scaling_policy: &ScalingPolicyConfig,
    ) -> TraceWorkloadBuilder {
        Self::builder_with(
            checkpoint.interval,
            checkpoint.duration,
            checkpoint.interval_scaling,
            scaling_policy_from_config(scaling_policy),
        )
    }

    /// Constructs a workload from already built fragments. Fragments go through a fresh builder
    /// with default checkpoint configuration, the same way as incrementally added ones.
    pub fn of_fragments(fragments: &[TraceFragment]) -> Result<Self, WorkloadError> {
        Self::of_fragments_iter(fragments.iter().copied())
    }

    pub fn of_fragments_iter<I>(fragments: I) -> Result<Self, WorkloadError>
    where
        I: IntoIterator<Item = TraceFragment>,
    {
        let mut builder = Self::builder_with(0, 0, 1.0, default_scaling_policy());
        for fragment in fragments {
            builder.add(fragment.duration, fragment.cpu_usage, fragment.core_count);
        }
        builder.build()
    }
}

impl Workload for TraceWorkload {
    fn checkpoint_interval(&self) -> u64 {
        self.checkpoint_interval
    }

    fn checkpoint_duration(&self) -> u64 {
        self.checkpoint_duration
    }

    fn checkpoint_interval_scaling(&self) -> f64 {
        self.checkpoint_interval_scaling
    }

    fn start_workload(self: Box<Self>, supplier: FlowSupplierRef) -> Box<dyn SimWorkload> {
        Box::new(SimTraceWorkload::new(supplier, *self))
    }

    /// Trace workloads signal completion by running out of fragments, so the machine and the
    /// completion callback are not used.
    fn start_workload_on_machine(
        self: Box<Self>,
        supplier: FlowSupplierRef,
        _machine: &SimMachine,
        _completion: CompletionCallback,
    ) -> Box<dyn SimWorkload> {
        self.start_workload(supplier)
    }
}

/// Accumulates fragments for a `TraceWorkload`. Checkpoint configuration is fixed when the
/// builder is created.
///
/// `build` does not reset the builder: every call constructs a workload from all fragments added
/// so far, so a builder may be reused for several workloads with the same configuration.
pub struct TraceWorkloadBuilder {
    fragments: Vec<TraceFragment>,
    checkpoint_interval: u64,
    checkpoint_duration: u64,
    checkpoint_interval_scaling: f64,
    scaling_policy: Rc<dyn ScalingPolicy>,
}

impl TraceWorkloadBuilder {
    fn new(
        checkpoint_interval: u64,
        checkpoint_duration: u64,
        checkpoint_interval_scaling: f64,
        scaling_policy: Rc<dyn ScalingPolicy>,
    ) -> Self {
        Self {
            fragments: Vec::new(),
            checkpoint_interval,
            checkpoint_duration,
            checkpoint_interval_scaling,
            scaling_policy,
        }
    }

    /// Appends a fragment which ends at `duration` (epoch millis) and demands `usage` on `cores`.
    pub fn add(&mut self, duration: u64, usage: f64, cores: u32) {
        self.fragments.push(TraceFragment::new(duration, usage, cores));
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn build(&self) -> Result<TraceWorkload, WorkloadError> {
        TraceWorkload::new(
            self.fragments.clone(),
            self.checkpoint_interval,
            self.checkpoint_duration,
            self.checkpoint_interval_scaling,
            self.scaling_policy.clone(),
        )
    }
}
