use prettytable::{row, Table};
use serde::{Deserialize, Serialize};
use std::{cell::RefCell, fs::File, io::Write, rc::Rc};

use crate::metrics::collector::{EstimatorWrapper, MetricsCollector};

#[derive(Debug, Default, Deserialize, PartialEq)]
pub enum OutputFormat {
    #[default]
    JSON,
    PrettyTable,
}

#[derive(Debug, Default, Deserialize, PartialEq)]
pub struct MetricsPrinterConfig {
    #[serde(default)]
    pub format: OutputFormat,
    pub output_file: std::path::PathBuf,
}

pub fn print_metrics(collector: Rc<RefCell<MetricsCollector>>, config: &MetricsPrinterConfig) {
    match config.format {
        OutputFormat::PrettyTable => print_metrics_as_pretty_table(collector, &config.output_file),
        OutputFormat::JSON => print_metrics_as_json(collector, &config.output_file),
    }
}

pub fn print_metrics_as_pretty_table(
    collector: Rc<RefCell<MetricsCollector>>,
    output_file: &std::path::PathBuf,
) {
    let metrics = collector.borrow();
    let mut metrics_file = File::create(output_file).unwrap();

    let mut aggregated_table = Table::new();
    aggregated_table.add_row(row!["Metric", "Count"]);
    aggregated_table.add_row(row!["Workloads submitted", metrics.workloads_submitted]);
    aggregated_table.add_row(row!["Workloads finished", metrics.workloads_finished]);
    aggregated_table.add_row(row!["Checkpoints", metrics.checkpoints]);
    aggregated_table.add_row(row!["Host failures", metrics.host_failures]);
    aggregated_table.add_row(row!["Workload restarts", metrics.workload_restarts]);

    let mut stats_table = Table::new();
    stats_table.add_row(row!["Metric", "Min", "Max", "Mean", "Variance"]);
    for (name, stats) in [
        ("Workload makespan", &metrics.workload_makespan_stats),
        ("Host demand", &metrics.host_demand_stats),
        ("Overcommitted demand", &metrics.overcommitted_demand_stats),
    ] {
        stats_table.add_row(row![
            name,
            stats.min(),
            stats.max(),
            stats.mean(),
            stats.population_variance()
        ]);
    }

    let _ = aggregated_table.print(&mut metrics_file);
    let _ = stats_table.print(&mut metrics_file);
}

#[derive(Serialize)]
struct MetricsJSON {
    counters: Counters,
    timings: Timings,
}

#[derive(Serialize)]
struct Counters {
    workloads_submitted: u64,
    workloads_finished: u64,
    checkpoints: u64,
    host_failures: u64,
    workload_restarts: u64,
}

#[derive(Serialize)]
struct Timings {
    workload_makespan: TimingsStats,
    host_demand: TimingsStats,
    overcommitted_demand: TimingsStats,
}

#[derive(Serialize)]
struct TimingsStats {
    min: f64,
    max: f64,
    mean: f64,
    variance: f64,
}

impl From<&EstimatorWrapper> for TimingsStats {
    fn from(stats: &EstimatorWrapper) -> Self {
        Self {
            min: stats.min(),
            max: stats.max(),
            mean: stats.mean(),
            variance: stats.population_variance(),
        }
    }
}

pub fn print_metrics_as_json(
    collector: Rc<RefCell<MetricsCollector>>,
    output_file: &std::path::PathBuf,
) {
    let metrics = collector.borrow();
    let mut metrics_file = File::create(output_file).unwrap();

    let metrics = MetricsJSON {
        counters: Counters {
            workloads_submitted: metrics.workloads_submitted,
            workloads_finished: metrics.workloads_finished,
            checkpoints: metrics.checkpoints,
            host_failures: metrics.host_failures,
            workload_restarts: metrics.workload_restarts,
        },
        timings: Timings {
            workload_makespan: (&metrics.workload_makespan_stats).into(),
            host_demand: (&metrics.host_demand_stats).into(),
            overcommitted_demand: (&metrics.overcommitted_demand_stats).into(),
        },
    };

    let serialized_json = serde_json::to_string_pretty(&metrics).unwrap();
    metrics_file.write_all(serialized_json.as_bytes()).unwrap();
}
