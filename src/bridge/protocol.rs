//! Wire format of the state/action round trip
//!
//! Outbound: a [`StateSnapshot`] serialized as JSON. Inbound: a single action
//! label, accepted as `{"move": "<label>"}`, a bare JSON string, or a line of
//! delimited text (`move=<label>`, `move:<label>` or just `<label>`).

use glam::Vec2;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::BridgeError;
use crate::manhattan_distance;
use crate::sim::{Action, SimulationWorld};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub position: [f32; 2],
    pub velocity: [f32; 2],
    pub is_dead: bool,
    pub reached_goal: bool,
    pub steps_taken: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObstacleState {
    pub position: [f32; 2],
    pub size: [f32; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovingObstacleState {
    pub position: [f32; 2],
    pub velocity: [f32; 2],
    /// Diameter
    pub size: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentState {
    pub obstacles: Vec<ObstacleState>,
    pub moving_obstacles: Vec<MovingObstacleState>,
    pub goal_area: ObstacleState,
}

/// Manhattan distances from the agent's top-left corner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Distances {
    pub to_goal: f32,
    /// Nearest hazard centre; absent when the level has no hazards
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_nearest_obstacle: Option<f32>,
}

/// Everything the decision service sees for one tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub player: PlayerState,
    pub environment: EnvironmentState,
    pub distances: Distances,
}

impl StateSnapshot {
    pub fn capture(world: &SimulationWorld) -> Self {
        let agent = &world.agent;
        let goal = world.goal().bounds;

        let player = PlayerState {
            position: agent.position.to_array(),
            velocity: agent.velocity.to_array(),
            is_dead: agent.is_dead(),
            reached_goal: agent.reached_goal(),
            steps_taken: agent.move_count(),
        };

        let environment = EnvironmentState {
            obstacles: world
                .obstacles()
                .iter()
                .map(|o| ObstacleState {
                    position: o.bounds.origin.to_array(),
                    size: o.bounds.size_array(),
                })
                .collect(),
            moving_obstacles: world
                .hazards
                .iter()
                .map(|h| MovingObstacleState {
                    position: h.position.to_array(),
                    velocity: h.velocity.to_array(),
                    size: h.diameter,
                })
                .collect(),
            goal_area: ObstacleState {
                position: goal.origin.to_array(),
                size: goal.size_array(),
            },
        };

        let distances = Distances {
            to_goal: manhattan_distance(agent.position, goal.origin),
            to_nearest_obstacle: nearest(agent.position, world.hazards.iter().map(|h| h.position)),
        };

        Self {
            player,
            environment,
            distances,
        }
    }

    pub fn to_json(&self) -> Result<String, BridgeError> {
        Ok(serde_json::to_string(self)?)
    }
}

fn nearest(from: Vec2, points: impl Iterator<Item = Vec2>) -> Option<f32> {
    points.map(|p| manhattan_distance(from, p)).reduce(f32::min)
}

/// Extract the action label from a reply body
pub fn extract_label(body: &str) -> Result<String, BridgeError> {
    let trimmed = body.trim();
    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(map)) => map
            .get("move")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| BridgeError::MalformedAction(trimmed.to_string())),
        Ok(Value::String(label)) => Ok(label),
        Ok(_) => Err(BridgeError::MalformedAction(trimmed.to_string())),
        Err(_) => {
            let line = trimmed.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or("");
            let value = match line.rfind(['=', ':']) {
                Some(idx) => &line[idx + 1..],
                None => line,
            };
            Ok(value.trim().trim_matches(|c| c == '"' || c == '\'').to_string())
        }
    }
}

/// Parse a reply body into an action
pub fn parse_move_payload(body: &str) -> Result<Action, BridgeError> {
    extract_label(body)?.parse()
}
