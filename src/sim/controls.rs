//! Control flags and the action vocabulary
//!
//! Both a keyboard handler and the decision bridge drive the agent through
//! the same four flags. The flags only become movement once they are turned
//! into a velocity; normalization happens later, in movement resolution.

use std::fmt;
use std::str::FromStr;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::BridgeError;

/// One of the four control flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// The four directional control flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ControlFlags {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl ControlFlags {
    pub fn set(&mut self, direction: Direction, pressed: bool) {
        match direction {
            Direction::Up => self.up = pressed,
            Direction::Down => self.down = pressed,
            Direction::Left => self.left = pressed,
            Direction::Right => self.right = pressed,
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Replace every flag with the set implied by `action`
    pub fn apply(&mut self, action: Action) {
        *self = action.flags();
    }

    /// Per-axis direction, each component in `{-1, 0, 1}`.
    ///
    /// Opposite flags cancel out.
    pub fn velocity(&self) -> Vec2 {
        let mut vel = Vec2::ZERO;
        if self.up {
            vel.y -= 1.0;
        }
        if self.down {
            vel.y += 1.0;
        }
        if self.left {
            vel.x -= 1.0;
        }
        if self.right {
            vel.x += 1.0;
        }
        vel
    }

    pub fn is_idle(&self) -> bool {
        *self == Self::default()
    }
}

/// A discrete command returned by the decision service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
    UpLeft,
    UpRight,
    DownLeft,
    DownRight,
    Stay,
}

impl Action {
    /// Every action, in a stable order
    pub const ALL: [Action; 9] = [
        Action::Up,
        Action::Down,
        Action::Left,
        Action::Right,
        Action::UpLeft,
        Action::UpRight,
        Action::DownLeft,
        Action::DownRight,
        Action::Stay,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Up => "up",
            Action::Down => "down",
            Action::Left => "left",
            Action::Right => "right",
            Action::UpLeft => "up-left",
            Action::UpRight => "up-right",
            Action::DownLeft => "down-left",
            Action::DownRight => "down-right",
            Action::Stay => "stay",
        }
    }

    /// Control flags this action sets; everything else is cleared
    pub fn flags(&self) -> ControlFlags {
        let (up, down, left, right) = match self {
            Action::Up => (true, false, false, false),
            Action::Down => (false, true, false, false),
            Action::Left => (false, false, true, false),
            Action::Right => (false, false, false, true),
            Action::UpLeft => (true, false, true, false),
            Action::UpRight => (true, false, false, true),
            Action::DownLeft => (false, true, true, false),
            Action::DownRight => (false, true, false, true),
            Action::Stay => (false, false, false, false),
        };
        ControlFlags {
            up,
            down,
            left,
            right,
        }
    }
}

impl FromStr for Action {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .iter()
            .copied()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| BridgeError::MalformedAction(s.to_string()))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
