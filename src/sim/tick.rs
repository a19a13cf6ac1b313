//! Per-frame simulation step
//!
//! One call resolves one frame: either the finished agent is replaced, or
//! hazards advance and the live agent is updated.

use super::agent::AgentStatus;
use super::state::{SimEvent, SimulationWorld};

/// Advance the world by one frame
pub fn tick(world: &mut SimulationWorld) -> Option<SimEvent> {
    world.frame += 1;

    if world.agent.is_finished() {
        let after_win = world.agent.reached_goal();
        world.respawn();
        return Some(SimEvent::Respawned { after_win });
    }

    world.advance_hazards();
    let rules = world.rules;
    let (agent, surroundings) = world.split_agent();
    let changed = agent.update(&surroundings, rules.fade, rules.hazard_collision);
    let steps = agent.move_count();

    match changed {
        Some(AgentStatus::GoalReached) => {
            log::info!("Goal reached after {steps} steps");
            Some(SimEvent::GoalReached { steps })
        }
        Some(AgentStatus::Dead) => {
            world.stats.deaths += 1;
            log::info!("Agent died after {steps} steps");
            Some(SimEvent::Died { steps })
        }
        Some(AgentStatus::Alive) | None => None,
    }
}
