//! Offline decision services
//!
//! Stand-ins for the external model when no service URL is configured.

use std::sync::{Mutex, PoisonError};

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::bridge::{DecisionFuture, DecisionService, StateSnapshot};
use crate::sim::Action;

/// Picks a uniformly random action for every request, reproducibly from a seed
#[derive(Debug)]
pub struct RandomPolicy {
    rng: Mutex<Pcg32>,
}

impl RandomPolicy {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(Pcg32::seed_from_u64(seed)),
        }
    }

    pub fn next_action(&self) -> Action {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        Action::ALL[rng.random_range(0..Action::ALL.len())]
    }
}

impl DecisionService for RandomPolicy {
    fn decide(&self, _snapshot: StateSnapshot) -> DecisionFuture {
        let action = self.next_action();
        Box::pin(async move { Ok(action.as_str().to_string()) })
    }
}
