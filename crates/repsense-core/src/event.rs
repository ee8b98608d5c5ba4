//! Stage classification and repetition events
//!
//! A [`RepEvent`] is a momentary signal: it is produced by one state machine
//! step and consumed synchronously by the session orchestrator.

use serde::{Deserialize, Serialize};

use crate::{ExerciseId, Timestamp};

/// Classified position of the tracked joint
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Joint opened past the upper threshold
    Extended,
    /// Joint closed past the lower threshold
    Flexed,
    /// No classification yet
    #[default]
    Unknown,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Extended => "extended",
            Stage::Flexed => "flexed",
            Stage::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One completed repetition
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RepEvent {
    pub exercise: ExerciseId,
    /// When the completing frame was processed
    pub at: Timestamp,
    /// Angle of the completing frame
    pub angle: f64,
}
