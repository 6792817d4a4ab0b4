//! Type definition for simulated machine used in config and by hosts

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SimMachine {
    #[serde(default)]
    pub name: String,
    pub core_count: u32,
    /// Total cpu capacity of a machine in the same units as fragment cpu usage.
    pub cpu_capacity: f64,
}

impl SimMachine {
    pub fn new(name: String, core_count: u32, cpu_capacity: f64) -> Self {
        Self {
            name,
            core_count,
            cpu_capacity,
        }
    }
}

impl Default for SimMachine {
    fn default() -> Self {
        Self::new(String::new(), 1, 1.0)
    }
}
