//! Scaling policy which passes fragment demand through unchanged.

use crate::core::trace::scaling::interface::ScalingPolicy;

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct NoDelayScaling;

impl NoDelayScaling {
    pub fn new() -> Self {
        Self
    }
}

impl ScalingPolicy for NoDelayScaling {
    fn effective_demand(&self, nominal_demand: f64) -> f64 {
        nominal_demand
    }
}
