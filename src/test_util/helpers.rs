use std::env;

use crate::config::SimulationConfig;
use crate::core::trace::fragment::TraceFragment;

/// Three fragment trace ending at 5 seconds with peak demand 4.0 on 2 cores.
pub fn example_fragments() -> Vec<TraceFragment> {
    vec![
        TraceFragment::new(1000, 2.0, 1),
        TraceFragment::new(3000, 4.0, 2),
        TraceFragment::new(5000, 1.0, 1),
    ]
}

/// Log level INFO by default, overridden with `RUST_LOG`.
pub fn init_logger() {
    let mut env_logger_builder = env_logger::builder();
    if env::var("RUST_LOG").is_err() {
        env_logger_builder.filter_level(log::LevelFilter::Info);
    }
    // several tests in one binary may try to initialize it
    let _ = env_logger_builder.is_test(true).try_init();
}

pub fn default_test_simulation_config(with_suffix: Option<&str>) -> SimulationConfig {
    let mut default = r#"
    sim_name: "test_tracesim"
    seed: 123
    restart_delay: 100.0
    machines:
    - machine_template:
        name: host_0
        core_count: 8
        cpu_capacity: 8.0
    "#
    .to_string();

    if let Some(suffix) = with_suffix {
        default.push_str(suffix);
    }

    serde_yaml::from_str::<SimulationConfig>(&default).unwrap()
}
