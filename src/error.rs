//! Error taxonomy
//!
//! Nothing here is fatal to the frame loop: bridge errors become "no action
//! this cycle", lifecycle errors are clamped, level and settings errors only
//! surface at startup.

use std::time::Duration;

use thiserror::Error;

use crate::sim::agent::AgentStatus;

/// Failures on the state/action round trip
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Label outside the nine-action vocabulary
    #[error("unrecognized action label {0:?}")]
    MalformedAction(String),
    /// Transport failure, non-success status or unreadable body
    #[error("decision service unavailable: {0}")]
    Unavailable(String),
    /// The service did not answer within the request deadline
    #[error("decision service did not answer within {0:?}")]
    Timeout(Duration),
    #[error("failed to encode state snapshot: {0}")]
    Encode(#[from] serde_json::Error),
}

impl From<reqwest::Error> for BridgeError {
    fn from(err: reqwest::Error) -> Self {
        BridgeError::Unavailable(err.to_string())
    }
}

/// Agent status transitions that break the monotone lifecycle
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("agent status {from:?} is terminal; refused transition to {to:?}")]
    InvariantViolation { from: AgentStatus, to: AgentStatus },
}

/// Malformed level layouts
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LevelError {
    #[error("level layout has no rows")]
    Empty,
    #[error("row {row} is {actual} tiles wide, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[error("unknown tile glyph {glyph:?} at column {col}, row {row}")]
    UnknownGlyph { glyph: char, col: usize, row: usize },
    #[error("level has no spawn tile")]
    MissingSpawn,
    #[error("level has more than one spawn tile")]
    DuplicateSpawn,
    #[error("level has no goal tiles")]
    MissingGoal,
}

/// Problems loading or validating settings
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid settings: {0}")]
    Invalid(String),
}
