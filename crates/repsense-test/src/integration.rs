//! End-to-end live session suite
//!
//! Drives real `LiveSession`s from scripted sources on Tokio's paused clock:
//! - Set and workout completion through the capture loop
//! - Debounce, hysteresis and arrival-order processing
//! - Acquisition failures and report retries
//! - Repeat workout and teardown

use std::time::Duration;

use repsense_runtime::{LiveSession, ReportGenerator, SessionSnapshot};
use repsense_session::SessionPhase;

use crate::{rep_extremes, PoseSynthesizer, ScriptedStep};

/// One rep per four captures: stand, stand, bend, bend
///
/// At the default 300 ms cadence reps land 1.2 s apart, clear of debounce.
pub fn rep_cycle(synth: &mut PoseSynthesizer) -> Vec<ScriptedStep> {
    let (high, low) = rep_extremes(synth.profile());
    [high, high, low, low]
        .into_iter()
        .map(|angle| ScriptedStep::scored(synth.frame(angle), 0.8))
        .collect()
}

/// Scripted frames for an explicit angle trace
pub fn angle_trace(synth: &mut PoseSynthesizer, angles: &[f64]) -> Vec<ScriptedStep> {
    angles
        .iter()
        .map(|&angle| ScriptedStep::pose(synth.frame(angle)))
        .collect()
}

/// Wait until the session reaches `phase`; `None` on timeout or closure
pub async fn wait_for_phase<R: ReportGenerator>(
    session: &LiveSession<R>,
    phase: SessionPhase,
    limit: Duration,
) -> Option<SessionSnapshot> {
    let mut updates = session.subscribe();
    let wait = async {
        loop {
            let snapshot = updates.borrow_and_update().clone();
            if snapshot.phase() == phase {
                return Some(snapshot);
            }
            if updates.changed().await.is_err() {
                return None;
            }
        }
    };
    tokio::time::timeout(limit, wait).await.ok().flatten()
}

/// Let the session run for `window` of Tokio time, then snapshot it
pub async fn run_for<R: ReportGenerator>(session: &LiveSession<R>, window: Duration) -> SessionSnapshot {
    tokio::time::sleep(window).await;
    session.snapshot()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChaosConfig, ChaosFrameSource, RecordingReportGenerator, ScriptedFrameSource};
    use repsense_core::{ExerciseId, ProfileTable, Stage, TrackerError};
    use repsense_runtime::{PoseResponse, RuntimeConfig};
    use repsense_session::{SessionPlan, SessionState};

    fn synth(id: ExerciseId) -> PoseSynthesizer {
        PoseSynthesizer::new(ProfileTable::standard().resolve(id).unwrap(), 11)
    }

    fn start<S: repsense_runtime::FrameSource>(
        plan: SessionPlan,
        source: S,
        reporter: RecordingReportGenerator,
    ) -> LiveSession<RecordingReportGenerator> {
        LiveSession::start(plan, RuntimeConfig::default(), &ProfileTable::standard(), source, reporter)
            .unwrap()
    }

    const LIMIT: Duration = Duration::from_secs(60);

    #[tokio::test(start_paused = true)]
    async fn test_two_sets_of_ten() {
        let source = ScriptedFrameSource::looping(rep_cycle(&mut synth(ExerciseId::Squat)));
        let reporter = RecordingReportGenerator::new();
        let plan = SessionPlan::new(ExerciseId::Squat, 10, 2).with_patient("P-1", "Ana Silva");
        let session = start(plan, source, reporter.clone());

        let snap = wait_for_phase(&session, SessionPhase::SetComplete, LIMIT).await.unwrap();
        assert_eq!(snap.state.current_set, 1);
        assert_eq!(snap.state.reps_in_set, 10);
        assert!(!snap.capturing);

        assert_eq!(session.start_next_set().await.unwrap(), SessionPhase::Running);
        let snap = session.snapshot();
        assert_eq!(snap.state.current_set, 2);
        assert_eq!(snap.state.reps_in_set, 0);
        assert!(snap.capturing);

        let snap = wait_for_phase(&session, SessionPhase::WorkoutComplete, LIMIT).await.unwrap();
        assert_eq!(snap.state.total_reps, 20);
        assert_eq!(snap.state.current_set, 2);
        assert!((snap.form_score - 0.8).abs() < 1e-9);

        let locator = session.generate_report().await.unwrap();
        assert_eq!(locator.as_str(), "/reports/P-1-1.pdf");

        let requests = reporter.requests();
        let request = &requests[0];
        assert_eq!(request.patient_name, "Ana Silva");
        assert_eq!(request.total_reps, 20);
        assert_eq!(request.assigned_reps, 20);
        assert_eq!(request.total_sets, 2);
        assert_eq!(request.duration_secs, snap.state.elapsed_seconds);
        assert!((request.avg_secs_per_rep - snap.state.elapsed_seconds as f64 / 20.0).abs() < 1e-9);
    }

    #[tokio::test(start_paused = true)]
    async fn test_squat_trace_counts_one_rep() {
        let source = ScriptedFrameSource::new(angle_trace(&mut synth(ExerciseId::Squat), &[170.0, 90.0, 170.0]));
        let session = start(SessionPlan::new(ExerciseId::Squat, 5, 1), source, RecordingReportGenerator::new());

        let snap = run_for(&session, Duration::from_secs(2)).await;
        assert_eq!(snap.state.total_reps, 1);
        assert_eq!(snap.stage, Stage::Extended);
        assert_eq!(snap.phase(), SessionPhase::Running);
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_exercise_completes() {
        for &id in ExerciseId::all() {
            let mut poses = synth(id);
            let completion = poses.profile().family.completion_stage();
            let source = ScriptedFrameSource::looping(rep_cycle(&mut poses));
            let session = start(SessionPlan::new(id, 3, 1), source, RecordingReportGenerator::new());

            let snap = wait_for_phase(&session, SessionPhase::WorkoutComplete, LIMIT).await.unwrap();
            assert_eq!(snap.state.total_reps, 3, "{id}");
            assert_eq!(snap.stage, completion, "{id}");
            session.dismiss().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_acquisitions_are_dropped() {
        let mut poses = synth(ExerciseId::Squat);
        let source = ScriptedFrameSource::new([
            ScriptedStep::pose(poses.frame(170.0)),
            ScriptedStep::fail("timeout"),
            ScriptedStep::pose(poses.frame(90.0)),
            ScriptedStep::fail("503"),
            ScriptedStep::fail("503"),
            ScriptedStep::pose(poses.frame(170.0)),
        ]);
        let session = start(SessionPlan::new(ExerciseId::Squat, 5, 1), source, RecordingReportGenerator::new());

        let snap = run_for(&session, Duration::from_secs(3)).await;
        assert_eq!(snap.state.total_reps, 1);
        assert_eq!(snap.frames_dropped, 3);
        assert_eq!(snap.phase(), SessionPhase::Running);
        assert!(snap.capturing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_completions_processed_in_arrival_order() {
        let mut poses = synth(ExerciseId::Squat);
        // Launched at 300 ms, lands at 700 ms, after the frame launched at 600 ms
        let source = ScriptedFrameSource::new([
            ScriptedStep::Delayed(Duration::from_millis(400), PoseResponse::new(poses.frame(90.0))),
            ScriptedStep::pose(poses.frame(170.0)),
        ]);
        let session = start(SessionPlan::new(ExerciseId::Squat, 5, 1), source, RecordingReportGenerator::new());

        let snap = run_for(&session, Duration::from_millis(1000)).await;
        assert_eq!(snap.state.total_reps, 1);
        assert_eq!(snap.stage, Stage::Flexed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_report_failure_is_retryable() {
        let source = ScriptedFrameSource::new(angle_trace(&mut synth(ExerciseId::Squat), &[170.0, 90.0]));
        let reporter = RecordingReportGenerator::failing(1);
        let session = start(SessionPlan::new(ExerciseId::Squat, 1, 1), source, reporter.clone());

        wait_for_phase(&session, SessionPhase::WorkoutComplete, LIMIT).await.unwrap();

        let err = session.generate_report().await.unwrap_err();
        assert!(matches!(err, TrackerError::Report(_)));
        let snap = session.snapshot();
        assert_eq!(snap.phase(), SessionPhase::WorkoutComplete);
        assert_eq!(snap.report, None);

        let locator = session.generate_report().await.unwrap();
        assert_eq!(session.snapshot().report, Some(locator));
        assert_eq!(reporter.requests().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeat_workout_resumes_capture() {
        let source = ScriptedFrameSource::new(angle_trace(&mut synth(ExerciseId::Squat), &[170.0, 90.0]));
        let session = start(SessionPlan::new(ExerciseId::Squat, 1, 1), source.clone(), RecordingReportGenerator::new());

        wait_for_phase(&session, SessionPhase::WorkoutComplete, LIMIT).await.unwrap();
        session.generate_report().await.unwrap();
        let calls = source.calls();

        run_for(&session, Duration::from_secs(2)).await;
        assert_eq!(source.calls(), calls);

        assert_eq!(session.repeat_workout().await.unwrap(), SessionPhase::Running);
        let snap = session.snapshot();
        assert_eq!(snap.state, SessionState::initial());
        assert_eq!(snap.report, None);
        assert!(snap.capturing);

        let snap = run_for(&session, Duration::from_millis(1100)).await;
        assert_eq!(source.calls(), calls + 3);
        assert_eq!(snap.state.elapsed_seconds, 1);
        assert_eq!(snap.state.total_reps, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_liveness_goes_idle_after_gap() {
        let source = ScriptedFrameSource::new(angle_trace(&mut synth(ExerciseId::Squat), &[170.0]));
        let session = start(SessionPlan::new(ExerciseId::Squat, 5, 1), source, RecordingReportGenerator::new());

        // Pose at 300 ms, empty frames from 600 ms on
        let snap = run_for(&session, Duration::from_millis(1000)).await;
        assert!(snap.is_active);

        let snap = run_for(&session, Duration::from_millis(300)).await;
        assert!(!snap.is_active);
        assert_eq!(snap.angle_degrees, 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_survives_chaos() {
        let source = ChaosFrameSource::new(
            ScriptedFrameSource::looping(rep_cycle(&mut synth(ExerciseId::Squat))),
            ChaosConfig::hostile(),
        );
        let session = start(SessionPlan::new(ExerciseId::Squat, 5, 2), source, RecordingReportGenerator::new());

        for _ in 0..6 {
            let snap = run_for(&session, Duration::from_secs(5)).await;
            assert!(snap.state.reps_in_set <= 5);
            assert!(snap.state.current_set <= 2);
            assert!(snap.state.total_reps <= 10);
            if snap.phase() == SessionPhase::SetComplete {
                session.start_next_set().await.unwrap();
            }
        }

        let snap = session.snapshot();
        assert!(snap.frames_processed > 0);
        assert!(snap.frames_dropped > 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismiss_closes_updates() {
        let session = start(
            SessionPlan::new(ExerciseId::Squat, 5, 1),
            ScriptedFrameSource::default(),
            RecordingReportGenerator::new(),
        );
        let updates = session.subscribe();
        session.dismiss().await;

        assert!(updates.has_changed().is_err());
        assert!(!updates.borrow().capturing);
    }
}
