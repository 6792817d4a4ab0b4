pub mod fragment;
pub mod scaling;
pub mod sim_trace_workload;
pub mod workload;
