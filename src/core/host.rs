//! Host component simulates a machine running workloads and going through failures.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::mem::take;
use std::rc::Rc;

use dslab_core::event::EventId;
use dslab_core::{cast, log_debug, log_info, Event, EventHandler, SimulationContext};

use crate::config::SimulationConfig;
use crate::core::common::{SimComponentId, WorkloadId};
use crate::core::events::{HostFailed, HostRecovered, StartWorkload, UpdateWorkload};
use crate::core::flow::{FairShareFlowSupplier, FlowSupplier};
use crate::core::machine::SimMachine;
use crate::core::workload::{SimWorkload, Workload};
use crate::metrics::collector::MetricsCollector;

struct RunningWorkload {
    sim_workload: Box<dyn SimWorkload>,
    submit_time: f64,
    next_update: Option<EventId>,
    // Checkpoints of `sim_workload` already accounted in metrics.
    reported_checkpoints: u64,
}

pub struct HostComponent {
    ctx: SimulationContext,
    machine: SimMachine,
    supplier: Rc<RefCell<FairShareFlowSupplier>>,
    config: Rc<SimulationConfig>,

    /// Submitted workloads waiting for their start time.
    pending: BTreeMap<WorkloadId, (Box<dyn Workload>, f64)>,
    running: BTreeMap<WorkloadId, RunningWorkload>,
    /// Workloads stopped by a failure of the machine, restored on recovery.
    interrupted: BTreeMap<WorkloadId, RunningWorkload>,
    /// Workloads which were due to start while the machine was down.
    deferred: Vec<WorkloadId>,
    failed: bool,
    /// Pending recovery event and its time while the machine is down.
    recovery: Option<(EventId, f64)>,

    metrics_collector: Rc<RefCell<MetricsCollector>>,
}

impl HostComponent {
    pub fn new(
        ctx: SimulationContext,
        machine: SimMachine,
        config: Rc<SimulationConfig>,
        metrics_collector: Rc<RefCell<MetricsCollector>>,
    ) -> Self {
        let supplier = Rc::new(RefCell::new(FairShareFlowSupplier::for_machine(&machine)));
        Self {
            ctx,
            machine,
            supplier,
            config,
            pending: Default::default(),
            running: Default::default(),
            interrupted: Default::default(),
            deferred: Default::default(),
            failed: false,
            recovery: None,
            metrics_collector,
        }
    }

    pub fn id(&self) -> SimComponentId {
        self.ctx.id()
    }

    pub fn machine(&self) -> &SimMachine {
        &self.machine
    }

    pub fn is_failed(&self) -> bool {
        self.failed
    }

    pub fn running_workload_count(&self) -> usize {
        self.running.len()
    }

    pub fn total_demand(&self) -> f64 {
        self.supplier.borrow().total_demand()
    }

    pub fn get_running_workload(&self, workload_id: WorkloadId) -> Option<&dyn SimWorkload> {
        self.running
            .get(&workload_id)
            .map(|running| running.sim_workload.as_ref())
    }

    /// Schedules `workload` to start on this host after `delay`.
    pub fn submit_workload(
        &mut self,
        workload_id: WorkloadId,
        workload: Box<dyn Workload>,
        delay: f64,
    ) {
        let submit_time = self.ctx.time() + delay;
        self.pending.insert(workload_id, (workload, submit_time));
        self.ctx.emit_self(StartWorkload { workload_id }, delay);
    }

    fn start_workload(&mut self, workload_id: WorkloadId) {
        if self.failed {
            log_debug!(
                self.ctx,
                "Workload {} deferred until host recovery",
                workload_id
            );
            self.deferred.push(workload_id);
            return;
        }

        let (workload, submit_time) = match self.pending.remove(&workload_id) {
            Some(pending) => pending,
            None => panic!("Start of unknown workload {} requested", workload_id),
        };

        let completion_ctx_name = self.ctx.name().to_string();
        let sim_workload = workload.start_workload_on_machine(
            self.supplier.clone(),
            &self.machine,
            Box::new(move |result| {
                log::debug!(
                    "[{}] workload {} completed with {:?}",
                    completion_ctx_name,
                    workload_id,
                    result
                );
            }),
        );
        log_debug!(self.ctx, "Workload {} started", workload_id);

        self.running.insert(
            workload_id,
            RunningWorkload {
                sim_workload,
                submit_time,
                next_update: None,
                reported_checkpoints: 0,
            },
        );
        self.update_workload(workload_id);
    }

    fn update_workload(&mut self, workload_id: WorkloadId) {
        let now = self.ctx.time();
        let running = match self.running.get_mut(&workload_id) {
            Some(running) => running,
            // update which was emitted before a failure
            None => return,
        };
        running.next_update = None;

        let next_change = running.sim_workload.on_update(now);

        let checkpoints = running.sim_workload.checkpoint_count();
        if checkpoints > running.reported_checkpoints {
            self.metrics_collector.borrow_mut().checkpoints +=
                checkpoints - running.reported_checkpoints;
            running.reported_checkpoints = checkpoints;
        }

        match next_change {
            Some(at) => {
                running.next_update =
                    Some(self.ctx.emit_self(UpdateWorkload { workload_id }, at - now));
            }
            None => {
                let makespan = now - running.submit_time;
                self.running.remove(&workload_id);

                let mut metrics = self.metrics_collector.borrow_mut();
                metrics.workloads_finished += 1;
                metrics.increment_workload_makespan(makespan);
                log_debug!(
                    self.ctx,
                    "Workload {} finished, makespan {}",
                    workload_id,
                    makespan
                );
            }
        }

        let supplier = self.supplier.borrow();
        let mut metrics = self.metrics_collector.borrow_mut();
        metrics.increment_host_demand(supplier.total_demand());
        metrics.increment_overcommitted_demand(supplier.overcommitted_demand());
    }

    /// Takes the machine down for `downtime`. A failure of a machine which is already down extends
    /// its downtime if it ends later than the current one.
    fn fail(&mut self, downtime: f64) {
        let recovers_at = self.ctx.time() + downtime;
        self.metrics_collector.borrow_mut().host_failures += 1;

        if let Some((event_id, current_recovery)) = self.recovery {
            if recovers_at > current_recovery {
                self.ctx.cancel_event(event_id);
                self.schedule_recovery(downtime, recovers_at);
            }
            log_info!(
                self.ctx,
                "Host {} failed again, recovery at {}",
                self.machine.name,
                f64::max(recovers_at, current_recovery)
            );
            return;
        }
        self.failed = true;
        log_info!(
            self.ctx,
            "Host {} failed for {}ms, interrupting {} workloads",
            self.machine.name,
            downtime,
            self.running.len()
        );

        for (workload_id, mut running) in take(&mut self.running) {
            if let Some(event_id) = running.next_update.take() {
                self.ctx.cancel_event(event_id);
            }
            running.sim_workload.stop();
            self.interrupted.insert(workload_id, running);
        }

        self.schedule_recovery(downtime, recovers_at);
    }

    fn schedule_recovery(&mut self, downtime: f64, recovers_at: f64) {
        let event_id = self.ctx.emit_self(HostRecovered {}, downtime);
        self.recovery = Some((event_id, recovers_at));
    }

    fn recover(&mut self) {
        self.failed = false;
        self.recovery = None;
        log_info!(
            self.ctx,
            "Host {} recovered, restoring {} workloads",
            self.machine.name,
            self.interrupted.len()
        );

        for (workload_id, interrupted) in take(&mut self.interrupted) {
            let sim_workload = interrupted
                .sim_workload
                .restore_snapshot(self.supplier.clone());
            let next_update = self
                .ctx
                .emit_self(UpdateWorkload { workload_id }, self.config.restart_delay);
            self.running.insert(
                workload_id,
                RunningWorkload {
                    sim_workload,
                    submit_time: interrupted.submit_time,
                    next_update: Some(next_update),
                    reported_checkpoints: 0,
                },
            );
            self.metrics_collector.borrow_mut().workload_restarts += 1;
        }

        for workload_id in take(&mut self.deferred) {
            self.start_workload(workload_id);
        }
    }
}

impl EventHandler for HostComponent {
    fn on(&mut self, event: Event) {
        cast!(match event.data {
            StartWorkload { workload_id } => {
                self.start_workload(workload_id);
            }
            UpdateWorkload { workload_id } => {
                self.update_workload(workload_id);
            }
            HostFailed { downtime } => {
                self.fail(downtime);
            }
            HostRecovered {} => {
                self.recover();
            }
        })
    }
}
