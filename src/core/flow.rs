//! Boundary to the flow engine which resolves demand of running workloads against supply of a
//! machine.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::core::machine::SimMachine;

pub type ConsumerId = u64;

pub type FlowSupplierRef = Rc<RefCell<dyn FlowSupplier>>;

/// Flow supplier hands out capacity to the consumers registered at it. Every execution adapter
/// holds one consumer slot for the time it runs.
pub trait FlowSupplier {
    fn add_consumer(&mut self) -> ConsumerId;

    fn remove_consumer(&mut self, consumer: ConsumerId);

    /// Replaces the demand currently requested by `consumer`.
    fn push_demand(&mut self, consumer: ConsumerId, demand: f64);

    /// Supply granted to `consumer` for its current demand.
    fn supply(&self, consumer: ConsumerId) -> f64;

    fn capacity(&self) -> f64;

    fn total_demand(&self) -> f64;
}

/// Shares machine capacity between consumers proportionally to their demand. While the total
/// demand fits into the capacity every consumer gets exactly what it requested.
pub struct FairShareFlowSupplier {
    capacity: f64,
    demands: BTreeMap<ConsumerId, f64>,
    next_consumer: ConsumerId,
}

impl FairShareFlowSupplier {
    pub fn new(capacity: f64) -> Self {
        Self {
            capacity,
            demands: Default::default(),
            next_consumer: 0,
        }
    }

    pub fn for_machine(machine: &SimMachine) -> Self {
        Self::new(machine.cpu_capacity)
    }

    pub fn consumer_count(&self) -> usize {
        self.demands.len()
    }

    /// Demand that can not be served with current capacity.
    pub fn overcommitted_demand(&self) -> f64 {
        f64::max(0.0, self.total_demand() - self.capacity)
    }

    fn share(&self) -> f64 {
        let total_demand = self.total_demand();
        if total_demand <= self.capacity {
            1.0
        } else {
            self.capacity / total_demand
        }
    }
}

impl FlowSupplier for FairShareFlowSupplier {
    fn add_consumer(&mut self) -> ConsumerId {
        let consumer = self.next_consumer;
        self.next_consumer += 1;
        self.demands.insert(consumer, 0.0);
        consumer
    }

    fn remove_consumer(&mut self, consumer: ConsumerId) {
        self.demands.remove(&consumer);
    }

    fn push_demand(&mut self, consumer: ConsumerId, demand: f64) {
        match self.demands.get_mut(&consumer) {
            Some(current) => *current = demand,
            None => panic!("Demand pushed by unknown consumer {}", consumer),
        }
    }

    fn supply(&self, consumer: ConsumerId) -> f64 {
        match self.demands.get(&consumer) {
            Some(demand) => demand * self.share(),
            None => 0.0,
        }
    }

    fn capacity(&self) -> f64 {
        self.capacity
    }

    fn total_demand(&self) -> f64 {
        self.demands.values().sum()
    }
}
