//! Moving hazards ("dots")
//!
//! Hazards patrol the level and bounce off solids. Contact with the agent
//! is governed by [`HazardCollisionPolicy`]; the shipped default leaves them
//! inert, but they are always moved and always exported.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{Obstacle, resolve_displacement};
use super::geometry::Rect;

/// What touching a hazard does to the agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HazardCollisionPolicy {
    /// Hazards move but never end the episode
    #[default]
    Disabled,
    /// Overlap with any hazard kills the agent and starts the fade
    KillOnContact,
}

/// Position and velocity captured for resets
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct HazardBaseline {
    position: Vec2,
    velocity: Vec2,
}

/// A moving circular hazard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hazard {
    /// Centre of the circle
    pub position: Vec2,
    /// Displacement per tick
    pub velocity: Vec2,
    pub diameter: f32,
    baseline: HazardBaseline,
}

impl Hazard {
    pub fn new(position: Vec2, velocity: Vec2, diameter: f32) -> Self {
        Self {
            position,
            velocity,
            diameter,
            baseline: HazardBaseline { position, velocity },
        }
    }

    /// Axis-aligned box around the circle, used for overlap tests
    pub fn bounds(&self) -> Rect {
        Rect::centered_square(self.position, self.diameter)
    }

    /// Same box-overlap test the goal area uses
    pub fn collides(&self, top_left: Vec2, bottom_right: Vec2) -> bool {
        self.bounds().overlaps_corners(top_left, bottom_right)
    }

    /// Advance one tick, reversing any velocity component a solid blocks
    pub fn advance(&mut self, obstacles: &[Obstacle]) {
        let step = resolve_displacement(obstacles, &self.bounds(), self.velocity);
        if step.x != self.velocity.x {
            self.velocity.x = -self.velocity.x;
        }
        if step.y != self.velocity.y {
            self.velocity.y = -self.velocity.y;
        }
        self.position += step;
    }

    /// Restore the saved baseline in place
    pub fn reset(&mut self) {
        self.position = self.baseline.position;
        self.velocity = self.baseline.velocity;
    }
}
