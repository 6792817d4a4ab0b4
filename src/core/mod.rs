pub mod common;
pub mod errors;
pub mod events;
pub mod flow;
pub mod host;
pub mod machine;
pub mod trace;
pub mod workload;
