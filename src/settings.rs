//! Simulation settings
//!
//! Loaded from an optional JSON file; missing fields take their defaults.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::bridge::ResponseOrdering;
use crate::consts::{DEFAULT_REQUEST_INTERVAL_MS, DEFAULT_REQUEST_TIMEOUT_MS, FADE_STEP};
use crate::error::SettingsError;
use crate::sim::{FadeMode, HazardCollisionPolicy};

/// Who is driving the agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlayMode {
    /// Keyboard play; deaths fade visibly
    Human,
    /// Watching a recorded or scripted run; deaths fade visibly
    Replay,
    /// Headless policy play; deaths are skipped straight to respawn
    #[default]
    Policy,
}

impl PlayMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayMode::Human => "human",
            PlayMode::Replay => "replay",
            PlayMode::Policy => "policy",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "human" => Some(PlayMode::Human),
            "replay" => Some(PlayMode::Replay),
            "policy" | "ai" => Some(PlayMode::Policy),
            _ => None,
        }
    }

    /// Whether death fades are animated in this mode
    pub fn animated_fade(&self) -> bool {
        match self {
            PlayMode::Human => true,
            PlayMode::Replay => true,
            PlayMode::Policy => false,
        }
    }
}

/// Decision service connection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeSettings {
    /// Export state at all
    pub enabled: bool,
    /// Service root; `/game_state` is appended. `None` uses the offline random policy.
    pub base_url: Option<String>,
    /// Minimum spacing between exports
    pub request_interval_ms: u64,
    /// Per-request deadline
    pub timeout_ms: u64,
    /// What to do with replies that arrive out of order
    pub ordering: ResponseOrdering,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: None,
            request_interval_ms: DEFAULT_REQUEST_INTERVAL_MS,
            timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            ordering: ResponseOrdering::default(),
        }
    }
}

impl BridgeSettings {
    pub fn request_interval(&self) -> Duration {
        Duration::from_millis(self.request_interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Top-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub mode: PlayMode,

    // === Lifecycle ===
    /// Force animated (`true`) or instant (`false`) death fades; `None` follows the mode
    pub fade_animation: Option<bool>,
    /// Opacity removed per animated fade tick
    pub fade_step: u8,
    /// Whether hazards kill on contact
    pub hazard_collision: HazardCollisionPolicy,

    // === Loop ===
    /// Target frames per second for the driver loop
    pub frame_rate: u32,
    /// Seed for the offline random policy
    pub seed: u64,

    // === Bridge ===
    pub bridge: BridgeSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mode: PlayMode::default(),
            fade_animation: None,
            fade_step: FADE_STEP,
            hazard_collision: HazardCollisionPolicy::Disabled,
            frame_rate: 60,
            seed: 0x5EED_0001,
            bridge: BridgeSettings::default(),
        }
    }
}

impl Settings {
    /// Settings for a play mode, everything else default
    pub fn for_mode(mode: PlayMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Effective fade behaviour (explicit override wins over the mode)
    pub fn fade_mode(&self) -> FadeMode {
        if self.fade_animation.unwrap_or(self.mode.animated_fade()) {
            FadeMode::Animated {
                step: self.fade_step,
            }
        } else {
            FadeMode::Instant
        }
    }

    pub fn human_control(&self) -> bool {
        self.mode == PlayMode::Human
    }

    /// Duration of one frame at the target rate
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.frame_rate.max(1)))
    }

    /// Reject values the loop cannot run with
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.fade_step == 0 && self.fade_mode() != FadeMode::Instant {
            return Err(SettingsError::Invalid(
                "fade_step must be non-zero when fades are animated".into(),
            ));
        }
        if self.frame_rate == 0 {
            return Err(SettingsError::Invalid("frame_rate must be non-zero".into()));
        }
        if self.bridge.request_interval_ms == 0 {
            return Err(SettingsError::Invalid(
                "bridge.request_interval_ms must be non-zero".into(),
            ));
        }
        if self.bridge.timeout_ms == 0 {
            return Err(SettingsError::Invalid("bridge.timeout_ms must be non-zero".into()));
        }
        if let Some(url) = &self.bridge.base_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(SettingsError::Invalid(format!(
                    "bridge.base_url must be an http(s) URL, got {url:?}"
                )));
            }
        }
        Ok(())
    }

    /// Load and validate settings from a JSON file
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let json = fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&json)?;
        settings.validate()?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Write settings as pretty JSON
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }
}
