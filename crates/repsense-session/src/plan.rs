//! Session plan

use serde::{Deserialize, Serialize};

use repsense_core::{ExerciseId, TrackerError, TrackerResult};

/// Who the session is for; copied verbatim into the report
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientInfo {
    pub id: String,
    pub name: String,
}

impl Default for PatientInfo {
    fn default() -> Self {
        PatientInfo {
            id: "N/A".to_string(),
            name: "Unknown".to_string(),
        }
    }
}

fn default_reps_target() -> u32 {
    10
}

fn default_total_sets() -> u32 {
    1
}

/// What the user was asked to do
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionPlan {
    pub exercise: ExerciseId,
    /// Reps that complete one set
    #[serde(default = "default_reps_target")]
    pub reps_target: u32,
    #[serde(default = "default_total_sets")]
    pub total_sets: u32,
    #[serde(default)]
    pub patient: PatientInfo,
}

impl SessionPlan {
    pub fn new(exercise: ExerciseId, reps_target: u32, total_sets: u32) -> Self {
        SessionPlan {
            exercise,
            reps_target,
            total_sets,
            patient: PatientInfo::default(),
        }
    }

    pub fn with_patient(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.patient = PatientInfo {
            id: id.into(),
            name: name.into(),
        };
        self
    }

    /// Reject plans that could never complete
    pub fn validate(&self) -> TrackerResult<()> {
        if self.reps_target == 0 {
            return Err(TrackerError::InvalidPlan("reps_target must be at least 1".into()));
        }
        if self.total_sets == 0 {
            return Err(TrackerError::InvalidPlan("total_sets must be at least 1".into()));
        }
        Ok(())
    }

    /// Reps across the whole workout
    pub fn assigned_reps(&self) -> u32 {
        self.reps_target.saturating_mul(self.total_sets)
    }
}
