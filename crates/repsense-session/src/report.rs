//! End-of-session report contract
//!
//! The report service is a black box; this module only defines what is sent
//! to it and what comes back.

use serde::{Deserialize, Serialize};

use repsense_core::{ExerciseId, TrackerError, TrackerResult};

use crate::{SessionOrchestrator, SessionPhase};

/// Payload of the report-generation request
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReportRequest {
    pub patient_id: String,
    pub patient_name: String,
    pub exercise: ExerciseId,
    pub exercise_name: String,
    pub total_reps: u32,
    pub assigned_reps: u32,
    pub total_sets: u32,
    pub duration_secs: u64,
    pub avg_secs_per_rep: f64,
    /// Mean form score in [0, 1]
    pub form_score: f64,
}

impl ReportRequest {
    /// Build from a finished session; fails unless the workout is complete
    pub fn from_session(session: &SessionOrchestrator, form_score: f64) -> TrackerResult<Self> {
        if session.phase() != SessionPhase::WorkoutComplete {
            return Err(TrackerError::ReportUnavailable);
        }

        let plan = session.plan();
        let state = session.state();
        Ok(ReportRequest {
            patient_id: plan.patient.id.clone(),
            patient_name: plan.patient.name.clone(),
            exercise: plan.exercise,
            exercise_name: plan.exercise.display_name().to_string(),
            total_reps: state.total_reps,
            assigned_reps: plan.assigned_reps(),
            total_sets: plan.total_sets,
            duration_secs: state.elapsed_seconds,
            avg_secs_per_rep: session.avg_secs_per_rep(),
            form_score: form_score.clamp(0.0, 1.0),
        })
    }
}

/// Opaque pointer to the generated artifact (usually a URL)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportLocator(pub String);

impl ReportLocator {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ReportLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SessionPlan;
    use repsense_core::{RepEvent, Timestamp};

    fn finished_session() -> SessionOrchestrator {
        let plan = SessionPlan::new(ExerciseId::Squat, 2, 2).with_patient("P-7", "Jordan Lee");
        let mut session = SessionOrchestrator::new(plan).unwrap();
        let rep = RepEvent {
            exercise: ExerciseId::Squat,
            at: Timestamp::ZERO,
            angle: 90.0,
        };
        for _ in 0..12 {
            session.tick_second();
        }
        session.on_rep(&rep);
        session.on_rep(&rep);
        session.end_workout();
        session
    }

    #[test]
    fn test_report_from_finished_session() {
        let report = ReportRequest::from_session(&finished_session(), 0.82).unwrap();

        assert_eq!(report.patient_id, "P-7");
        assert_eq!(report.exercise_name, "Squat");
        assert_eq!(report.total_reps, 2);
        assert_eq!(report.assigned_reps, 4);
        assert_eq!(report.total_sets, 2);
        assert_eq!(report.duration_secs, 12);
        assert!((report.avg_secs_per_rep - 6.0).abs() < 1e-9);
        assert!((report.form_score - 0.82).abs() < 1e-9);
    }

    #[test]
    fn test_report_requires_workout_complete() {
        let session = SessionOrchestrator::new(SessionPlan::new(ExerciseId::Squat, 2, 1)).unwrap();
        assert_eq!(
            ReportRequest::from_session(&session, 0.5).unwrap_err(),
            TrackerError::ReportUnavailable
        );
    }

    #[test]
    fn test_report_json_shape() {
        let report = ReportRequest::from_session(&finished_session(), 0.5).unwrap();
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["exercise"], "squat");
        assert_eq!(json["assigned_reps"], 4);
        assert_eq!(json["duration_secs"], 12);

        let locator: ReportLocator = serde_json::from_str(r#""/reports/r1.pdf""#).unwrap();
        assert_eq!(locator.as_str(), "/reports/r1.pdf");
    }
}
