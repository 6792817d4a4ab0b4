//! Simulation callbacks interface and implementations to define how simulator should behave on start,
//! step, finish and when it should stop running.

use log::info;

use crate::{metrics::printer::print_metrics, simulator::TraceSimulation};

pub trait SimulationCallbacks {
    /// Runs before starting a simulation run.
    fn on_simulation_start(&mut self, _sim: &mut TraceSimulation) {}

    /// Runs on each step of a simulation run, returns false if the simulation must be stopped.
    fn on_step(&mut self, _sim: &mut TraceSimulation) -> bool {
        true
    }

    /// Runs upon the completion of a simulation run.
    fn on_simulation_finish(&mut self, _sim: &mut TraceSimulation) {}
}

pub struct RunUntilAllWorkloadsAreFinishedCallbacks {}

impl SimulationCallbacks for RunUntilAllWorkloadsAreFinishedCallbacks {
    fn on_step(&mut self, sim: &mut TraceSimulation) -> bool {
        !sim.metrics_collector.borrow().all_workloads_finished()
    }

    fn on_simulation_finish(&mut self, sim: &mut TraceSimulation) {
        let metrics = sim.metrics_collector.borrow();
        info!(
            "Finished {} out of {} workloads, {} checkpoints, {} restarts",
            metrics.workloads_finished,
            metrics.workloads_submitted,
            metrics.checkpoints,
            metrics.workload_restarts
        );
        if let Some(printer_config) = sim.config.metrics_printer.as_ref() {
            print_metrics(sim.metrics_collector.clone(), printer_config);
        }
    }
}
