//! Interfaces between workloads and the simulation engine.

use downcast_rs::{impl_downcast, Downcast};

use crate::core::errors::WorkloadError;
use crate::core::flow::FlowSupplierRef;
use crate::core::machine::SimMachine;

/// Invoked by workload kinds that report completion themselves.
pub type CompletionCallback = Box<dyn FnOnce(Result<(), WorkloadError>)>;

/// Workload is a description of work which is turned into a running `SimWorkload` once it is
/// placed on a machine. Starting a workload moves it into the execution adapter, so at any moment
/// exactly one adapter owns and mutates it.
pub trait Workload: Downcast {
    /// Period between automatic checkpoints in milliseconds, 0 disables checkpointing.
    fn checkpoint_interval(&self) -> u64;

    /// Time in milliseconds a single checkpoint takes.
    fn checkpoint_duration(&self) -> u64;

    /// Factor applied to the checkpoint interval after every checkpoint.
    fn checkpoint_interval_scaling(&self) -> f64;

    fn start_workload(self: Box<Self>, supplier: FlowSupplierRef) -> Box<dyn SimWorkload>;

    fn start_workload_on_machine(
        self: Box<Self>,
        supplier: FlowSupplierRef,
        machine: &SimMachine,
        completion: CompletionCallback,
    ) -> Box<dyn SimWorkload>;
}

impl_downcast!(Workload);

/// Execution adapter which steps a started workload against its flow supplier.
pub trait SimWorkload: Downcast {
    /// Brings the workload to simulation time `now` (in milliseconds) and returns the time of its
    /// next state change. `None` means the workload has finished.
    /// Time must be monotonically increasing for subsequent calls of this method.
    fn on_update(&mut self, now: f64) -> Option<f64>;

    fn is_finished(&self) -> bool;

    /// Interrupts the workload, e.g. because its machine failed. Releases supplier resources.
    fn stop(&mut self);

    /// Creates a fresh adapter which continues from the last checkpoint of this one, or from the
    /// very beginning if no checkpoint was taken.
    fn restore_snapshot(&self, supplier: FlowSupplierRef) -> Box<dyn SimWorkload>;

    fn checkpoint_count(&self) -> u64;

    /// Demand currently pushed to the supplier.
    fn current_demand(&self) -> f64;
}

impl_downcast!(SimWorkload);
