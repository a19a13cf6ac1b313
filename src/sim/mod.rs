//! Simulation module
//!
//! All gameplay logic lives here. It is single-threaded and free of I/O:
//! - One `tick` per frame
//! - Obstacles clipped in level order
//! - No rendering, input or network dependencies

pub mod agent;
pub mod collision;
pub mod controls;
pub mod geometry;
pub mod hazard;
pub mod level;
pub mod state;
pub mod tick;

pub use agent::{Agent, AgentStatus, FadeMode, Surroundings, TrainingMetadata, Waypoint};
pub use collision::{GoalArea, Obstacle, resolve_displacement};
pub use controls::{Action, ControlFlags, Direction};
pub use geometry::{Rect, direction_to_displacement};
pub use hazard::{Hazard, HazardCollisionPolicy};
pub use level::{LEVEL_ONE, Level, TileKind};
pub use state::{Rules, SessionStats, SimEvent, SimulationWorld};
pub use tick::tick;
