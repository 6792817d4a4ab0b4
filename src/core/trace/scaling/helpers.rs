//! Helpers for default policy and builder from configuration

use std::rc::Rc;

use crate::core::trace::scaling::interface::{ScalingPolicy, ScalingPolicyConfig};
use crate::core::trace::scaling::no_delay::NoDelayScaling;

/// Default policy is no delay
pub fn default_scaling_policy_config() -> ScalingPolicyConfig {
    ScalingPolicyConfig {
        policy_name: "no_delay".to_string(),
        config: String::new(),
    }
}

pub fn default_scaling_policy() -> Rc<dyn ScalingPolicy> {
    Rc::new(NoDelayScaling::new())
}

pub fn scaling_policy_from_config(config: &ScalingPolicyConfig) -> Rc<dyn ScalingPolicy> {
    match &config.policy_name as &str {
        "no_delay" => Rc::new(NoDelayScaling::new()),
        _ => panic!("Unsupported scaling policy: {:?}", config.policy_name),
    }
}
