//! Collision clipping against static axis-aligned solids
//!
//! Movement is resolved by folding a proposed displacement through every
//! obstacle in level order. Each obstacle may zero the horizontal component,
//! the vertical component, or both. This is an approximation, not a
//! simultaneous-constraint solve, and the sequential order decides how the
//! agent slides along corners.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geometry::Rect;

/// A static solid that blocks movement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub bounds: Rect,
}

impl Obstacle {
    pub fn new(bounds: Rect) -> Self {
        Self { bounds }
    }

    /// Clip `movement` so the box `[top_left, bottom_right]` cannot enter this solid.
    ///
    /// Each axis is tested alone against the original box; a blocked axis is
    /// zeroed. If both axes pass alone but the diagonal move would still
    /// clip the corner, the vertical component is dropped and the box slides
    /// horizontally.
    pub fn restrict_movement(&self, top_left: Vec2, bottom_right: Vec2, movement: Vec2) -> Vec2 {
        let mut x = movement.x;
        let mut y = movement.y;

        let step_x = Vec2::new(movement.x, 0.0);
        if self.bounds.overlaps_corners(top_left + step_x, bottom_right + step_x) {
            x = 0.0;
        }

        let step_y = Vec2::new(0.0, movement.y);
        if self.bounds.overlaps_corners(top_left + step_y, bottom_right + step_y) {
            y = 0.0;
        }

        if x != 0.0 && y != 0.0 {
            let step = Vec2::new(x, y);
            if self.bounds.overlaps_corners(top_left + step, bottom_right + step) {
                y = 0.0;
            }
        }

        Vec2::new(x, y)
    }
}

/// The win zone: detects overlap but never blocks
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GoalArea {
    pub bounds: Rect,
}

impl GoalArea {
    pub fn new(bounds: Rect) -> Self {
        Self { bounds }
    }

    pub fn collision(&self, top_left: Vec2, bottom_right: Vec2) -> bool {
        self.bounds.overlaps_corners(top_left, bottom_right)
    }
}

/// Fold `displacement` through every obstacle in order.
pub fn resolve_displacement(obstacles: &[Obstacle], bounds: &Rect, displacement: Vec2) -> Vec2 {
    let top_left = bounds.top_left();
    let bottom_right = bounds.bottom_right();
    obstacles.iter().fold(displacement, |step, obstacle| {
        obstacle.restrict_movement(top_left, bottom_right, step)
    })
}
