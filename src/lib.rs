//! Maze Runner - a tile-based maze simulation driven by an external policy
//!
//! Core modules:
//! - `sim`: Simulation (collision clipping, agent lifecycle, world state, tick)
//! - `bridge`: Rate-limited state export / action import against a decision service
//! - `policy`: Offline decision services (seeded random walker)
//! - `settings`: Data-driven configuration
//! - `error`: Error taxonomy shared by the modules above

pub mod bridge;
pub mod error;
pub mod policy;
pub mod settings;
pub mod sim;

pub use bridge::{Bridge, ReplyOutcome};
pub use error::{BridgeError, LevelError, LifecycleError, SettingsError};
pub use settings::{BridgeSettings, PlayMode, Settings};
pub use sim::{FadeMode, SimulationWorld, tick};

use glam::Vec2;

/// Level and entity constants
pub mod consts {
    /// Side length of one tile in pixels
    pub const TILE_SIZE: f32 = 50.0;
    /// Horizontal offset of tile (0, 0) from the canvas origin
    pub const X_OFFSET: f32 = 80.0;
    /// Vertical offset of tile (0, 0) from the canvas origin
    pub const Y_OFFSET: f32 = 100.0;

    /// Grid dimensions in tiles
    pub const GRID_COLUMNS: usize = 22;
    pub const GRID_ROWS: usize = 10;

    /// Agent hitbox side (half a tile)
    pub const AGENT_SIZE: f32 = TILE_SIZE / 2.0;
    /// Agent displacement per tick
    pub const AGENT_SPEED: f32 = TILE_SIZE / 15.0;

    /// Hazard diameter (half a tile)
    pub const HAZARD_DIAMETER: f32 = TILE_SIZE / 2.0;
    /// Hazard displacement per tick
    pub const HAZARD_SPEED: f32 = TILE_SIZE / 8.0;

    /// Opacity of a fresh agent; fading drains it toward zero
    pub const FADE_FULL: u8 = 255;
    /// Opacity removed per tick while the death fade is animated
    pub const FADE_STEP: u8 = 10;

    /// Minimum spacing between two state exports (milliseconds)
    pub const DEFAULT_REQUEST_INTERVAL_MS: u64 = 100;
    /// Per-request deadline for the decision service (milliseconds)
    pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 2_000;
}

/// Pixel position of the top-left corner of tile `(col, row)`
#[inline]
pub fn tile_origin(col: usize, row: usize) -> Vec2 {
    Vec2::new(
        col as f32 * consts::TILE_SIZE + consts::X_OFFSET,
        row as f32 * consts::TILE_SIZE + consts::Y_OFFSET,
    )
}

/// Manhattan distance `|dx| + |dy|`
#[inline]
pub fn manhattan_distance(a: Vec2, b: Vec2) -> f32 {
    (a.x - b.x).abs() + (a.y - b.y).abs()
}
