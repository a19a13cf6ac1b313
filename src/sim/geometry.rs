//! Axis-aligned geometry over `glam::Vec2`
//!
//! Screen coordinates: x grows right, y grows down. A box is described either
//! as origin + extent or by its top-left / bottom-right corners.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle `[origin.x, origin.x + extent.x] x [origin.y, origin.y + extent.y]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub origin: Vec2,
    pub extent: Vec2,
}

impl Rect {
    pub fn new(origin: Vec2, extent: Vec2) -> Self {
        Self { origin, extent }
    }

    /// Build from top-left and bottom-right corners
    pub fn from_corners(top_left: Vec2, bottom_right: Vec2) -> Self {
        Self {
            origin: top_left,
            extent: bottom_right - top_left,
        }
    }

    /// Square of side `size` anchored at its top-left corner
    pub fn square(top_left: Vec2, size: f32) -> Self {
        Self::new(top_left, Vec2::splat(size))
    }

    /// Square of side `size` centred on `center`
    pub fn centered_square(center: Vec2, size: f32) -> Self {
        Self::new(center - Vec2::splat(size / 2.0), Vec2::splat(size))
    }

    #[inline]
    pub fn top_left(&self) -> Vec2 {
        self.origin
    }

    #[inline]
    pub fn bottom_right(&self) -> Vec2 {
        self.origin + self.extent
    }

    /// Strict interior overlap with the box spanned by two corners.
    ///
    /// Boxes that only share an edge do not overlap, so an agent can slide
    /// flush along a wall.
    #[inline]
    pub fn overlaps_corners(&self, top_left: Vec2, bottom_right: Vec2) -> bool {
        let br = self.bottom_right();
        top_left.x < br.x
            && bottom_right.x > self.origin.x
            && top_left.y < br.y
            && bottom_right.y > self.origin.y
    }

    #[inline]
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.overlaps_corners(other.top_left(), other.bottom_right())
    }

    /// Translate by `delta`
    #[inline]
    pub fn translated(&self, delta: Vec2) -> Rect {
        Rect::new(self.origin + delta, self.extent)
    }

    /// Width and height as an array (export format)
    pub fn size_array(&self) -> [f32; 2] {
        self.extent.to_array()
    }
}

/// Scale a raw direction to a step of length `speed`.
///
/// A zero (or non-finite) direction yields a zero step.
#[inline]
pub fn direction_to_displacement(direction: Vec2, speed: f32) -> Vec2 {
    direction.normalize_or_zero() * speed
}
