//! Config fields definitions for trace workload simulation

use serde::Deserialize;

use crate::core::machine::SimMachine;
use crate::metrics::printer::MetricsPrinterConfig;

/// All simulation times are in milliseconds, the same unit as trace fragment timestamps.
#[derive(Debug, Deserialize, PartialEq)]
pub struct SimulationConfig {
    pub sim_name: String,
    pub seed: u64,
    #[serde(default)]
    pub machines: Vec<MachineGroup>,
    /// Delay between recovery of a failed host and the restart of its interrupted workloads.
    #[serde(default)]
    pub restart_delay: f64,
    pub metrics_printer: Option<MetricsPrinterConfig>,
}

#[derive(Clone, Default, Debug, Deserialize, PartialEq)]
pub struct MachineGroup {
    // If machine count is not none and template has name, then it's taken as a prefix of all
    // machines in a group.
    // If machine count is none or 1 and template has name, then it's a single machine and its name
    // is set to template name.
    // If template has got no name, then prefix default_machine(_<idx>)? is used.
    pub machine_count: Option<u64>,
    pub machine_template: SimMachine,
}

/// Expands machine groups into machines with unique names.
pub fn machines_from_groups(groups: &[MachineGroup]) -> Vec<SimMachine> {
    let mut machines = vec![];
    let mut total_machines = 0;

    for group in groups {
        let count_in_group = group.machine_count.unwrap_or(1);
        let template_name = &group.machine_template.name;

        if count_in_group == 1 && !template_name.is_empty() {
            machines.push(group.machine_template.clone());
            continue;
        }
        let name_prefix = if template_name.is_empty() {
            "default_machine"
        } else {
            template_name.as_str()
        };

        for _ in 0..count_in_group {
            let mut machine = group.machine_template.clone();
            machine.name = format!("{}_{}", name_prefix, total_machines);
            machines.push(machine);
            total_machines += 1;
        }
    }

    machines
}
