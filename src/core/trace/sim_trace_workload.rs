//! Execution adapter stepping a trace workload against a flow supplier.

use log::debug;

use crate::core::flow::{ConsumerId, FlowSupplierRef};
use crate::core::trace::workload::TraceWorkload;
use crate::core::workload::{SimWorkload, Workload};

/// Trace time differences below this are treated as zero, so float rounding of event times can
/// not produce updates which make no progress.
const TIME_EPSILON: f64 = 1e-6;

/// Tracks when the next checkpoint of a running workload is due. All times are trace times in
/// milliseconds.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckpointSchedule {
    interval: f64,
    duration: f64,
    interval_scaling: f64,
    next_checkpoint: Option<f64>,
}

impl CheckpointSchedule {
    pub fn new(interval: u64, duration: u64, interval_scaling: f64, origin: f64) -> Self {
        let interval = interval as f64;
        Self {
            interval,
            duration: duration as f64,
            interval_scaling,
            next_checkpoint: (interval > 0.0).then(|| origin + interval),
        }
    }

    pub fn for_workload(workload: &TraceWorkload, origin: f64) -> Self {
        Self::new(
            workload.checkpoint_interval(),
            workload.checkpoint_duration(),
            workload.checkpoint_interval_scaling(),
            origin,
        )
    }

    pub fn next_checkpoint(&self) -> Option<f64> {
        self.next_checkpoint
    }

    pub fn interval(&self) -> f64 {
        self.interval
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn is_due(&self, progress: f64) -> bool {
        matches!(self.next_checkpoint, Some(at) if progress + TIME_EPSILON >= at)
    }

    /// Registers a checkpoint taken at `progress` and schedules the next one with the scaled
    /// interval. Once the interval is no longer positive checkpointing stops.
    pub fn on_checkpoint(&mut self, progress: f64) {
        self.interval *= self.interval_scaling;
        self.next_checkpoint = (self.interval > 0.0).then(|| progress + self.interval);
    }
}

/// State to restart a workload from after its machine failed.
#[derive(Clone)]
struct TraceSnapshot {
    workload: TraceWorkload,
    progress: f64,
    checkpoint: CheckpointSchedule,
}

/// Runs a `TraceWorkload`.
///
/// Trace time (`progress`) advances together with simulation time except while a checkpoint is
/// being written. On every update the fragments which ended before current trace time are skipped
/// and the demand of the current fragment, mapped by the workload scaling policy, is pushed to the
/// supplier. A checkpoint drops the consumed fragments from the owned workload, so the workload
/// always starts with the fragment which is in progress at the last checkpoint. The checkpoint
/// becomes the restore point only after its write pause is over.
pub struct SimTraceWorkload {
    workload: TraceWorkload,
    supplier: FlowSupplierRef,
    consumer: ConsumerId,
    /// Index of the current fragment in the owned workload.
    fragment_index: usize,
    progress: f64,
    last_update: Option<f64>,
    paused_until: Option<f64>,
    checkpoint: CheckpointSchedule,
    snapshot: TraceSnapshot,
    /// Snapshot of the checkpoint being written, committed once its pause is over.
    pending_snapshot: Option<TraceSnapshot>,
    checkpoint_count: u64,
    current_demand: f64,
    finished: bool,
}

impl SimTraceWorkload {
    pub fn new(supplier: FlowSupplierRef, workload: TraceWorkload) -> Self {
        Self::resume(supplier, workload, 0.0)
    }

    /// Starts `workload` as if the first `progress` milliseconds of its trace were already
    /// executed.
    pub fn resume(supplier: FlowSupplierRef, workload: TraceWorkload, progress: f64) -> Self {
        let checkpoint = CheckpointSchedule::for_workload(&workload, progress);
        Self::with_schedule(supplier, workload, progress, checkpoint)
    }

    fn with_schedule(
        supplier: FlowSupplierRef,
        workload: TraceWorkload,
        progress: f64,
        checkpoint: CheckpointSchedule,
    ) -> Self {
        let consumer = supplier.borrow_mut().add_consumer();
        let snapshot = TraceSnapshot {
            workload: workload.clone(),
            progress,
            checkpoint: checkpoint.clone(),
        };

        Self {
            workload,
            supplier,
            consumer,
            fragment_index: 0,
            progress,
            last_update: None,
            paused_until: None,
            checkpoint,
            snapshot,
            pending_snapshot: None,
            checkpoint_count: 0,
            current_demand: 0.0,
            finished: false,
        }
    }

    pub fn workload(&self) -> &TraceWorkload {
        &self.workload
    }

    /// Trace time reached so far in milliseconds.
    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// Progress of the snapshot this workload would be restored from.
    pub fn snapshot_progress(&self) -> f64 {
        self.snapshot.progress
    }

    /// Number of fragments finished since the last checkpoint.
    pub fn consumed_fragments(&self) -> usize {
        self.fragment_index
    }

    pub fn is_paused(&self) -> bool {
        self.paused_until.is_some()
    }

    fn set_demand(&mut self, demand: f64) {
        self.current_demand = demand;
        self.supplier.borrow_mut().push_demand(self.consumer, demand);
    }

    fn skip_finished_fragments(&mut self) {
        let fragments = self.workload.fragments();
        while self.fragment_index < fragments.len()
            && fragments[self.fragment_index].duration as f64 <= self.progress + TIME_EPSILON
        {
            self.fragment_index += 1;
        }
    }

    fn make_checkpoint(&mut self, now: f64) {
        let consumed = self.fragment_index;
        if let Err(err) = self.workload.remove_fragments(consumed) {
            panic!("Inconsistent fragment index of trace workload: {}", err);
        }
        self.fragment_index = 0;

        self.checkpoint.on_checkpoint(self.progress);
        self.pending_snapshot = Some(TraceSnapshot {
            workload: self.workload.clone(),
            progress: self.progress,
            checkpoint: self.checkpoint.clone(),
        });

        debug!(
            "Checkpoint started at trace time {} dropped {} fragments, {} fragments left",
            self.progress,
            consumed,
            self.workload.fragments().len()
        );

        self.paused_until = Some(now + self.checkpoint.duration());
        self.set_demand(0.0);
    }

    fn commit_checkpoint(&mut self) {
        if let Some(snapshot) = self.pending_snapshot.take() {
            debug!("Checkpoint at trace time {} written", snapshot.progress);
            self.snapshot = snapshot;
            self.checkpoint_count += 1;
        }
    }

    fn finish(&mut self) {
        self.set_demand(0.0);
        self.supplier.borrow_mut().remove_consumer(self.consumer);
        self.finished = true;
    }
}

impl SimWorkload for SimTraceWorkload {
    fn on_update(&mut self, now: f64) -> Option<f64> {
        if self.finished {
            return None;
        }

        let last_update = self.last_update.replace(now).unwrap_or(now);
        let mut elapsed = now - last_update;
        if let Some(paused_until) = self.paused_until {
            if now < paused_until {
                return Some(paused_until);
            }
            self.paused_until = None;
            self.commit_checkpoint();
            elapsed = now - paused_until;
        }
        self.progress += elapsed;

        self.skip_finished_fragments();
        if self.fragment_index == self.workload.fragments().len() {
            self.finish();
            return None;
        }

        if self.checkpoint.is_due(self.progress) {
            self.make_checkpoint(now);
            return self.paused_until;
        }

        let fragment = self.workload.fragments()[self.fragment_index];
        let demand = self
            .workload
            .scaling_policy()
            .effective_demand(fragment.cpu_usage);
        self.set_demand(demand);

        let mut next_change = fragment.duration as f64;
        if let Some(next_checkpoint) = self.checkpoint.next_checkpoint() {
            next_change = f64::min(next_change, next_checkpoint);
        }
        Some(now + f64::max(next_change - self.progress, 0.0))
    }

    fn is_finished(&self) -> bool {
        self.finished
    }

    /// Stops the workload. A checkpoint which is still being written is lost.
    fn stop(&mut self) {
        self.pending_snapshot = None;
        if !self.finished {
            self.finish();
        }
    }

    fn restore_snapshot(&self, supplier: FlowSupplierRef) -> Box<dyn SimWorkload> {
        Box::new(SimTraceWorkload::with_schedule(
            supplier,
            self.snapshot.workload.clone(),
            self.snapshot.progress,
            self.snapshot.checkpoint.clone(),
        ))
    }

    fn checkpoint_count(&self) -> u64 {
        self.checkpoint_count
    }

    fn current_demand(&self) -> f64 {
        self.current_demand
    }
}
