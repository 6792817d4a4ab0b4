//! Represents entry point for simulator.

use log::info;
use std::collections::BTreeMap;
use std::time::Instant;
use std::{cell::RefCell, rc::Rc};

use dslab_core::simulation::Simulation;
use dslab_core::SimulationContext;

use crate::config::{machines_from_groups, SimulationConfig};
use crate::core::common::{SimComponentId, WorkloadId};
use crate::core::events::HostFailed;
use crate::core::host::HostComponent;
use crate::core::machine::SimMachine;
use crate::core::workload::Workload;
use crate::metrics::collector::MetricsCollector;
use crate::simulation_callbacks::SimulationCallbacks;

pub struct TraceSimulation {
    pub config: Rc<SimulationConfig>,
    pub sim: Simulation,

    // Context for submitting failures to hosts.
    client: SimulationContext,

    pub hosts: BTreeMap<String, Rc<RefCell<HostComponent>>>,
    pub metrics_collector: Rc<RefCell<MetricsCollector>>,

    next_workload_id: WorkloadId,
}

impl TraceSimulation {
    pub fn new(config: Rc<SimulationConfig>) -> Self {
        info!(
            "Creating trace simulation {:?} with config: {:?}",
            config.sim_name, config
        );

        let mut sim = Simulation::new(config.seed);
        let client = sim.create_context("client");

        let mut trace_simulation = TraceSimulation {
            config: config.clone(),
            sim,
            client,
            hosts: Default::default(),
            metrics_collector: Rc::new(RefCell::new(MetricsCollector::new())),
            next_workload_id: 0,
        };

        for machine in machines_from_groups(&config.machines) {
            trace_simulation.add_host(machine);
        }
        info!("Created {} hosts", trace_simulation.hosts.len());

        trace_simulation
    }

    pub fn add_host(&mut self, machine: SimMachine) -> SimComponentId {
        let host_name = machine.name.clone();
        if self.hosts.contains_key(&host_name) {
            panic!("Host with name {:?} already exists", host_name);
        }

        let host_context = self.sim.create_context(&host_name);
        let host = Rc::new(RefCell::new(HostComponent::new(
            host_context,
            machine,
            self.config.clone(),
            self.metrics_collector.clone(),
        )));
        let host_id = self.sim.add_handler(&host_name, host.clone());
        self.hosts.insert(host_name, host);

        host_id
    }

    pub fn host(&self, host_name: &str) -> Rc<RefCell<HostComponent>> {
        match self.hosts.get(host_name) {
            Some(host) => host.clone(),
            None => panic!("Unknown host {:?}", host_name),
        }
    }

    /// Submits `workload` to start on host `host_name` at simulation time `at`.
    pub fn submit_workload(
        &mut self,
        host_name: &str,
        workload: Box<dyn Workload>,
        at: f64,
    ) -> WorkloadId {
        let delay = at - self.sim.time();
        assert!(
            delay >= 0.0,
            "Workload submitted to the past: {} vs current time {}",
            at,
            self.sim.time()
        );

        let workload_id = self.next_workload_id;
        self.next_workload_id += 1;

        self.host(host_name)
            .borrow_mut()
            .submit_workload(workload_id, workload, delay);
        self.metrics_collector.borrow_mut().workloads_submitted += 1;

        workload_id
    }

    /// Makes host `host_name` fail at simulation time `at` for `downtime` milliseconds.
    /// Failures of a host which is already down extend its downtime.
    pub fn fail_host(&mut self, host_name: &str, at: f64, downtime: f64) {
        let delay = at - self.sim.time();
        assert!(
            delay >= 0.0,
            "Failure of host {:?} scheduled to the past: {} vs current time {}",
            host_name,
            at,
            self.sim.time()
        );

        let host_id = self.host(host_name).borrow().id();
        self.client.emit(HostFailed { downtime }, host_id, delay);
    }

    pub fn run_with_callbacks(&mut self, mut callbacks: Box<dyn SimulationCallbacks>) {
        callbacks.on_simulation_start(self);

        let t = Instant::now();
        while callbacks.on_step(self) {
            if !self.sim.step() {
                break;
            }
        }
        let duration = t.elapsed().as_secs_f64();
        info!(
            "Processed {} events in {:.2?}s ({:.0} events/s)",
            self.sim.event_count(),
            duration,
            self.sim.event_count() as f64 / duration
        );
        info!("Finished at {}", self.sim.time());

        callbacks.on_simulation_finish(self);
    }

    pub fn run_until_no_events(&mut self) {
        let t = Instant::now();
        self.sim.step_until_no_events();
        let duration = t.elapsed().as_secs_f64();
        info!(
            "Processed {} events in {:.2?}s ({:.0} events/s)",
            self.sim.event_count(),
            duration,
            self.sim.event_count() as f64 / duration
        );
    }

    pub fn step(&mut self) -> bool {
        self.sim.step()
    }

    /// Returns `true` if there could be more pending events and `false` otherwise.
    pub fn step_for_duration(&mut self, duration: f64) -> bool {
        self.sim.step_for_duration(duration)
    }
}
