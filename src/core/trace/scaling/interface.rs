//! Interface for scaling policies of trace workloads

use downcast_rs::{impl_downcast, Downcast};
use serde::{Deserialize, Serialize};

/// Scaling policy maps the nominal demand of a trace fragment to the demand which the execution
/// adapter actually pushes to the flow supplier, e.g. to model stragglers slowing down under load.
///
/// One policy may be shared by many workloads, so implementations must be stateless or keep their
/// state behind interior mutability.
pub trait ScalingPolicy: Downcast {
    fn effective_demand(&self, nominal_demand: f64) -> f64;
}

impl_downcast!(ScalingPolicy);

/// Config describes policy name and configuration in arbitrary format which certain implementation
/// of `ScalingPolicy` trait must be able to parse in form of yaml string.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct ScalingPolicyConfig {
    pub policy_name: String,
    #[serde(default)]
    pub config: String,
}
