//! Implements centralized storage for metrics. Hosts report progress of workloads, checkpoints and
//! failures here.

use average::{concatenate, Estimate, Max, Mean, Min, Variance};

concatenate!(
    Estimator,
    [Min, min],
    [Max, max],
    [Mean, mean],
    [Variance, population_variance]
);

impl std::fmt::Debug for Estimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Estimator")
            .field("min", &self.min())
            .field("max", &self.max())
            .field("mean", &self.mean())
            .field("population_variance", &self.population_variance())
            .finish()
    }
}

#[derive(Debug)]
pub struct EstimatorWrapper {
    estimator: Estimator,
    count: u64,
}

impl Default for EstimatorWrapper {
    fn default() -> Self {
        Self::new()
    }
}

impl EstimatorWrapper {
    pub fn new() -> Self {
        Self {
            estimator: Estimator::new(),
            count: 0,
        }
    }

    pub fn add(&mut self, value: f64) {
        self.estimator.add(value);
        self.count += 1;
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn min(&self) -> f64 {
        self.estimator.min()
    }

    pub fn max(&self) -> f64 {
        self.estimator.max()
    }

    pub fn mean(&self) -> f64 {
        self.estimator.mean()
    }

    pub fn population_variance(&self) -> f64 {
        self.estimator.population_variance()
    }
}

#[derive(Debug, Default)]
pub struct MetricsCollector {
    /// The number of workloads submitted to hosts before and during the simulation.
    pub workloads_submitted: u64,
    /// The number of workloads which consumed all their fragments.
    pub workloads_finished: u64,
    /// Total number of checkpoints taken by all workloads.
    pub checkpoints: u64,
    /// The number of host failures.
    pub host_failures: u64,
    /// The number of workloads restored from a snapshot after a host failure.
    pub workload_restarts: u64,

    /// Estimations for the time between workload submission and its last fragment end, including
    /// checkpoint pauses and work lost on failures.
    pub workload_makespan_stats: EstimatorWrapper,

    /// Estimations for the total demand of a host sampled on each workload update.
    pub host_demand_stats: EstimatorWrapper,

    /// Estimations for the demand exceeding host capacity, sampled together with host demand.
    pub overcommitted_demand_stats: EstimatorWrapper,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn increment_workload_makespan(&mut self, value: f64) {
        self.workload_makespan_stats.add(value);
    }

    pub fn increment_host_demand(&mut self, value: f64) {
        self.host_demand_stats.add(value);
    }

    pub fn increment_overcommitted_demand(&mut self, value: f64) {
        self.overcommitted_demand_stats.add(value);
    }

    pub fn all_workloads_finished(&self) -> bool {
        self.workloads_finished >= self.workloads_submitted
    }
}
