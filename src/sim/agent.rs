//! The controllable agent and its lifecycle
//!
//! ```text
//! Alive ──goal overlap──▶ GoalReached ─┐
//!   │                                  ├──▶ respawn (new Agent)
//!   └──hazard contact──▶ Dead ──fade──▶┘
//! ```
//!
//! Status is monotone within one life. Leaving a terminal status is refused
//! and the agent stays where it was; the only way back to `Alive` is a
//! brand-new agent.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{GoalArea, Obstacle, resolve_displacement};
use super::geometry::{Rect, direction_to_displacement};
use super::hazard::{Hazard, HazardCollisionPolicy};
use crate::consts::{AGENT_SIZE, AGENT_SPEED, FADE_FULL, FADE_STEP};
use crate::error::LifecycleError;
use crate::tile_origin;

/// Lifecycle status of one life
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentStatus {
    Alive,
    Dead,
    GoalReached,
}

impl AgentStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, AgentStatus::Alive)
    }
}

/// How a dead agent's opacity drains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum FadeMode {
    /// Remove `step` opacity per tick (interactive and replay play)
    Animated { step: u8 },
    /// Drop straight to zero (headless policy play)
    Instant,
}

impl Default for FadeMode {
    fn default() -> Self {
        FadeMode::Animated { step: FADE_STEP }
    }
}

/// A checkpoint tile carried for training harnesses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub tile: (usize, usize),
    /// Path length from this waypoint through the remaining ones
    pub distance_to_finish: f32,
}

/// Bookkeeping for an external training harness. Gameplay never reads it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetadata {
    pub generation: u32,
    pub fitness: f32,
    pub waypoints: Vec<Waypoint>,
}

impl TrainingMetadata {
    /// Waypoints in visiting order; the last one is the finish
    pub fn new(generation: u32, tiles: &[(usize, usize)]) -> Self {
        let mut waypoints: Vec<Waypoint> = tiles
            .iter()
            .map(|&tile| Waypoint {
                tile,
                distance_to_finish: 0.0,
            })
            .collect();
        for i in (0..waypoints.len().saturating_sub(1)).rev() {
            let (a, b) = (waypoints[i].tile, waypoints[i + 1].tile);
            let leg = tile_origin(a.0, a.1).distance(tile_origin(b.0, b.1));
            waypoints[i].distance_to_finish = leg + waypoints[i + 1].distance_to_finish;
        }
        Self {
            generation,
            fitness: 0.0,
            waypoints,
        }
    }
}

/// Static surroundings the agent resolves against each tick
#[derive(Debug, Clone, Copy)]
pub struct Surroundings<'a> {
    pub obstacles: &'a [Obstacle],
    pub goal: &'a GoalArea,
    pub hazards: &'a [Hazard],
}

/// The player-controlled square
#[derive(Debug, Clone)]
pub struct Agent {
    /// Top-left corner of the hitbox
    pub position: Vec2,
    /// Raw direction from the control flags, components in `{-1, 0, 1}`
    pub velocity: Vec2,
    /// Hitbox side length
    pub size: f32,
    /// Displacement length per tick
    pub speed: f32,
    pub controlled_by_human: bool,
    /// Optional training bookkeeping
    pub training: Option<TrainingMetadata>,
    status: AgentStatus,
    fade_level: u8,
    is_fading: bool,
    move_count: u32,
    death_at_step: Option<u32>,
}

impl Agent {
    /// A fresh life at `spawn`
    pub fn spawn(spawn: Vec2) -> Self {
        Self {
            position: spawn,
            velocity: Vec2::ZERO,
            size: AGENT_SIZE,
            speed: AGENT_SPEED,
            controlled_by_human: false,
            training: None,
            status: AgentStatus::Alive,
            fade_level: FADE_FULL,
            is_fading: false,
            move_count: 0,
            death_at_step: None,
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::square(self.position, self.size)
    }

    pub fn status(&self) -> AgentStatus {
        self.status
    }

    pub fn is_alive(&self) -> bool {
        self.status == AgentStatus::Alive
    }

    pub fn is_dead(&self) -> bool {
        self.status == AgentStatus::Dead
    }

    pub fn reached_goal(&self) -> bool {
        self.status == AgentStatus::GoalReached
    }

    pub fn fade_level(&self) -> u8 {
        self.fade_level
    }

    pub fn is_fading(&self) -> bool {
        self.is_fading
    }

    /// Ticks survived while alive
    pub fn move_count(&self) -> u32 {
        self.move_count
    }

    pub fn death_at_step(&self) -> Option<u32> {
        self.death_at_step
    }

    /// Ready to be replaced: reached the goal, or died and finished fading
    pub fn is_finished(&self) -> bool {
        self.reached_goal() || (self.is_dead() && self.fade_level == 0)
    }

    /// Move to `to` if the lifecycle allows it.
    ///
    /// Terminal statuses are sticky: any attempt to leave one is refused,
    /// logged, and the current status is kept.
    pub fn transition(&mut self, to: AgentStatus) -> Result<(), LifecycleError> {
        if self.status == to {
            return Ok(());
        }
        if self.status.is_terminal() {
            log::warn!("Refusing agent transition {:?} -> {:?}", self.status, to);
            return Err(LifecycleError::InvariantViolation {
                from: self.status,
                to,
            });
        }
        self.status = to;
        match to {
            AgentStatus::Dead => {
                self.is_fading = true;
                self.death_at_step = Some(self.move_count);
            }
            AgentStatus::GoalReached | AgentStatus::Alive => {}
        }
        Ok(())
    }

    /// Kill the agent and start the fade
    pub fn kill(&mut self) -> Result<(), LifecycleError> {
        self.transition(AgentStatus::Dead)
    }

    /// Clip this tick's step against every obstacle and apply it
    pub fn resolve_movement(&mut self, obstacles: &[Obstacle]) -> Vec2 {
        let step = direction_to_displacement(self.velocity, self.speed);
        let mut step = resolve_displacement(obstacles, &self.bounds(), step);
        if !step.is_finite() {
            log::warn!("Discarding non-finite displacement {step:?}");
            step = Vec2::ZERO;
        }
        self.position += step;
        step
    }

    /// Goal and hazard checks for the current position
    pub fn detect(&mut self, surroundings: &Surroundings<'_>, policy: HazardCollisionPolicy) {
        if !self.is_alive() {
            return;
        }
        let top_left = self.position;
        let bottom_right = self.bounds().bottom_right();

        match policy {
            HazardCollisionPolicy::Disabled => {}
            HazardCollisionPolicy::KillOnContact => {
                if surroundings
                    .hazards
                    .iter()
                    .any(|h| h.collides(top_left, bottom_right))
                {
                    let _ = self.kill();
                    return;
                }
            }
        }

        if surroundings.goal.collision(top_left, bottom_right) {
            let _ = self.transition(AgentStatus::GoalReached);
        }
    }

    /// Advance one tick. Returns the new status if it changed.
    pub fn update(
        &mut self,
        surroundings: &Surroundings<'_>,
        fade: FadeMode,
        policy: HazardCollisionPolicy,
    ) -> Option<AgentStatus> {
        let before = self.status;
        if self.is_alive() {
            self.resolve_movement(surroundings.obstacles);
            self.detect(surroundings, policy);
            self.move_count += 1;
        } else if self.is_fading && self.fade_level > 0 {
            self.fade_level = match fade {
                FadeMode::Animated { step } => self.fade_level.saturating_sub(step),
                FadeMode::Instant => 0,
            };
        }
        (self.status != before).then_some(self.status)
    }
}
