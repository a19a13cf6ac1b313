//! Simulation world state
//!
//! One aggregate owns everything a tick touches: the static level data, the
//! hazards, the control flags and exactly one live agent.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::agent::{Agent, FadeMode, Surroundings};
use super::collision::{GoalArea, Obstacle};
use super::controls::{Action, ControlFlags, Direction};
use super::hazard::{Hazard, HazardCollisionPolicy};
use super::level::Level;
use crate::settings::Settings;

/// Rules the world applies each tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rules {
    pub fade: FadeMode,
    pub hazard_collision: HazardCollisionPolicy,
    /// Mark freshly spawned agents as human-controlled
    pub human_control: bool,
}

impl Rules {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            fade: settings.fade_mode(),
            hazard_collision: settings.hazard_collision,
            human_control: settings.human_control(),
        }
    }
}

/// Something notable that happened during a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimEvent {
    GoalReached { steps: u32 },
    Died { steps: u32 },
    Respawned { after_win: bool },
}

/// Counters that survive respawns
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    pub wins: u32,
    pub deaths: u32,
    pub respawns: u32,
}

/// The whole simulation
#[derive(Debug, Clone)]
pub struct SimulationWorld {
    obstacles: Vec<Obstacle>,
    goal: GoalArea,
    spawn: Vec2,
    pub hazards: Vec<Hazard>,
    pub agent: Agent,
    pub controls: ControlFlags,
    pub rules: Rules,
    pub stats: SessionStats,
    /// Frames stepped so far
    pub frame: u64,
}

impl SimulationWorld {
    /// Build from explicit level data
    pub fn new(
        obstacles: Vec<Obstacle>,
        goal: GoalArea,
        hazards: Vec<Hazard>,
        spawn: Vec2,
        rules: Rules,
    ) -> Self {
        let mut world = Self {
            obstacles,
            goal,
            spawn,
            hazards,
            agent: Agent::spawn(spawn),
            controls: ControlFlags::default(),
            rules,
            stats: SessionStats::default(),
            frame: 0,
        };
        world.agent.controlled_by_human = rules.human_control;
        world
    }

    pub fn from_level(level: &Level, rules: Rules) -> Self {
        Self::new(
            level.obstacles(),
            level.goal_area(),
            level.hazards().to_vec(),
            level.spawn_point(),
            rules,
        )
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn goal(&self) -> &GoalArea {
        &self.goal
    }

    pub fn spawn_point(&self) -> Vec2 {
        self.spawn
    }

    /// Borrow the static data and hazards alongside the agent
    pub fn split_agent(&mut self) -> (&mut Agent, Surroundings<'_>) {
        (
            &mut self.agent,
            Surroundings {
                obstacles: &self.obstacles,
                goal: &self.goal,
                hazards: &self.hazards,
            },
        )
    }

    pub fn advance_hazards(&mut self) {
        for hazard in &mut self.hazards {
            hazard.advance(&self.obstacles);
        }
    }

    /// Replace the agent with a fresh one and put hazards back on their baselines
    pub fn respawn(&mut self) {
        let after_win = self.agent.reached_goal();
        if after_win {
            self.stats.wins += 1;
        }
        self.stats.respawns += 1;
        self.agent = Agent::spawn(self.spawn);
        self.agent.controlled_by_human = self.rules.human_control;
        for hazard in &mut self.hazards {
            hazard.reset();
        }
        log::info!(
            "Respawned agent (win: {after_win}, wins so far: {})",
            self.stats.wins
        );
    }

    /// Set or release one control flag (keyboard path)
    pub fn set_control(&mut self, direction: Direction, pressed: bool) {
        self.controls.set(direction, pressed);
        self.sync_velocity();
    }

    /// Apply a decision to whichever agent is current
    pub fn apply_action(&mut self, action: Action) {
        self.controls.apply(action);
        self.sync_velocity();
    }

    /// Drop all flags (unrecognized or missing decision)
    pub fn clear_controls(&mut self) {
        self.controls.clear();
        self.sync_velocity();
    }

    fn sync_velocity(&mut self) {
        self.agent.velocity = self.controls.velocity();
    }
}
