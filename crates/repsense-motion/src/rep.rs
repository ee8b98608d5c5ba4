//! Repetition state machine
//!
//! `RepState::step` is a pure transition `(state, frame, now) -> (state, event)`.
//! Edges, per motion family:
//! - angle > upper_enter            => stage := baseline
//! - angle < lower_enter && baseline => stage := completion, rep registered
//! - anything in between            => no change (hysteresis band)
//!
//! A registered rep is only emitted if the previous accepted rep is more
//! than the debounce interval in the past. The stage moves either way.

use std::time::Duration;

use repsense_core::{AngleMode, ExerciseProfile, PoseFrame, RepEvent, Stage, Timestamp};

/// Minimum spacing between two accepted reps
pub const REP_DEBOUNCE: Duration = Duration::from_millis(700);

/// Tunables for the rep state machine
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RepSettings {
    pub debounce: Duration,
    pub angle_mode: AngleMode,
}

impl Default for RepSettings {
    fn default() -> Self {
        RepSettings {
            debounce: REP_DEBOUNCE,
            angle_mode: AngleMode::Primary,
        }
    }
}

/// State carried between frames
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct RepState {
    pub stage: Stage,
    /// Time of the last accepted rep
    pub last_rep_at: Option<Timestamp>,
}

/// Result of one transition
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RepStep {
    pub state: RepState,
    /// Evaluated angle; `None` when keypoints were missing
    pub angle: Option<f64>,
    pub event: Option<RepEvent>,
    /// A rep edge was crossed but fell inside the debounce window
    pub suppressed: bool,
}

impl RepStep {
    /// Angle for display; 0 stands in for "undetermined"
    pub fn display_angle(&self) -> f64 {
        self.angle.unwrap_or(0.0)
    }
}

impl RepState {
    pub fn initial() -> Self {
        Self::default()
    }

    /// Evaluate the frame and advance
    pub fn step(
        &self,
        profile: &ExerciseProfile,
        frame: &PoseFrame,
        now: Timestamp,
        settings: &RepSettings,
    ) -> RepStep {
        let angle = profile.evaluate(frame, settings.angle_mode);
        self.step_angle(profile, angle, now, settings.debounce)
    }

    /// Advance from an already evaluated angle
    pub fn step_angle(
        &self,
        profile: &ExerciseProfile,
        angle: Option<f64>,
        now: Timestamp,
        debounce: Duration,
    ) -> RepStep {
        let Some(degrees) = angle else {
            return RepStep {
                state: *self,
                angle: None,
                event: None,
                suppressed: false,
            };
        };

        let baseline = profile.family.baseline_stage();
        let thresholds = &profile.thresholds;
        let mut next = *self;
        let mut event = None;
        let mut suppressed = false;

        if degrees > thresholds.upper_enter() {
            next.stage = baseline;
        }

        if degrees < thresholds.lower_enter() && self.stage == baseline {
            next.stage = profile.family.completion_stage();

            let clear = match self.last_rep_at {
                Some(last) => now.since(last) > debounce,
                None => true,
            };
            if clear {
                next.last_rep_at = Some(now);
                event = Some(RepEvent {
                    exercise: profile.id,
                    at: now,
                    angle: degrees,
                });
            } else {
                suppressed = true;
            }
        }

        RepStep {
            state: next,
            angle: Some(degrees),
            event,
            suppressed,
        }
    }
}

/// Owning wrapper: one profile, one running state
#[derive(Clone, Debug)]
pub struct RepCounter {
    profile: ExerciseProfile,
    settings: RepSettings,
    state: RepState,
    accepted: u64,
    suppressed: u64,
}

impl RepCounter {
    pub fn new(profile: ExerciseProfile) -> Self {
        Self::with_settings(profile, RepSettings::default())
    }

    pub fn with_settings(profile: ExerciseProfile, settings: RepSettings) -> Self {
        RepCounter {
            profile,
            settings,
            state: RepState::initial(),
            accepted: 0,
            suppressed: 0,
        }
    }

    /// Feed one frame
    pub fn observe(&mut self, frame: &PoseFrame, now: Timestamp) -> RepStep {
        let step = self.state.step(&self.profile, frame, now, &self.settings);
        self.commit(step)
    }

    /// Feed an angle directly (recorded angle traces)
    pub fn observe_angle(&mut self, angle: Option<f64>, now: Timestamp) -> RepStep {
        let step = self
            .state
            .step_angle(&self.profile, angle, now, self.settings.debounce);
        self.commit(step)
    }

    fn commit(&mut self, step: RepStep) -> RepStep {
        if step.state.stage != self.state.stage {
            tracing::trace!(
                exercise = %self.profile.id,
                from = %self.state.stage,
                to = %step.state.stage,
                "Stage transition"
            );
        }
        if step.event.is_some() {
            self.accepted += 1;
        }
        if step.suppressed {
            self.suppressed += 1;
            tracing::debug!(exercise = %self.profile.id, "Rep suppressed by debounce");
        }
        self.state = step.state;
        step
    }

    pub fn stage(&self) -> Stage {
        self.state.stage
    }

    pub fn state(&self) -> RepState {
        self.state
    }

    pub fn profile(&self) -> &ExerciseProfile {
        &self.profile
    }

    pub fn accepted(&self) -> u64 {
        self.accepted
    }

    pub fn suppressed(&self) -> u64 {
        self.suppressed
    }

    /// Back to Unknown with no debounce history
    pub fn reset(&mut self) {
        self.state = RepState::initial();
        self.accepted = 0;
        self.suppressed = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use repsense_core::{ExerciseId, ProfileTable};

    fn profile(id: ExerciseId) -> ExerciseProfile {
        ProfileTable::standard().resolve(id).unwrap()
    }

    /// Feed angles 1s apart so debounce never interferes
    fn run(counter: &mut RepCounter, angles: &[f64]) -> Vec<usize> {
        angles
            .iter()
            .enumerate()
            .filter_map(|(i, &a)| {
                let now = Timestamp::from_millis(i as u64 * 1000);
                counter.observe_angle(Some(a), now).event.map(|_| i)
            })
            .collect()
    }

    #[test]
    fn test_squat_single_rep() {
        let mut counter = RepCounter::new(profile(ExerciseId::Squat));
        let reps = run(&mut counter, &[170.0, 90.0, 170.0]);

        assert_eq!(reps, vec![1]);
        assert_eq!(counter.stage(), Stage::Extended);
        assert_eq!(counter.accepted(), 1);
    }

    #[test]
    fn test_no_rep_without_baseline() {
        // Starting from Unknown, a deep angle alone never counts
        let mut counter = RepCounter::new(profile(ExerciseId::Squat));
        let reps = run(&mut counter, &[90.0, 80.0, 120.0, 90.0]);

        assert!(reps.is_empty());
        assert_eq!(counter.stage(), Stage::Unknown);
    }

    #[test]
    fn test_flexion_first_mirrors_stages() {
        let mut counter = RepCounter::new(profile(ExerciseId::BicepCurl));

        let step = counter.observe_angle(Some(165.0), Timestamp::from_millis(0));
        assert_eq!(step.state.stage, Stage::Flexed);
        assert!(step.event.is_none());

        let step = counter.observe_angle(Some(35.0), Timestamp::from_millis(1000));
        assert_eq!(step.state.stage, Stage::Extended);
        assert!(step.event.is_some());
    }

    #[test]
    fn test_lateral_family() {
        let mut counter = RepCounter::new(profile(ExerciseId::SideBend));
        let reps = run(&mut counter, &[45.0, 30.0, 20.0, 45.0, 22.0]);
        assert_eq!(reps, vec![2, 4]);
    }

    #[test]
    fn test_hysteresis_band_never_emits() {
        let p = profile(ExerciseId::Squat);
        let eps = 0.5;
        let low = p.thresholds.lower_enter() + eps;
        let high = p.thresholds.upper_enter() - eps;

        // From Unknown
        let mut counter = RepCounter::new(p.clone());
        let wobble: Vec<f64> = (0..40).map(|i| if i % 2 == 0 { low } else { high }).collect();
        assert!(run(&mut counter, &wobble).is_empty());
        assert_eq!(counter.stage(), Stage::Unknown);

        // From the baseline stage
        let mut counter = RepCounter::new(p);
        counter.observe_angle(Some(175.0), Timestamp::ZERO);
        let mut now = 1000;
        for &a in &wobble {
            let step = counter.observe_angle(Some(a), Timestamp::from_millis(now));
            assert!(step.event.is_none());
            now += 1000;
        }
        assert_eq!(counter.stage(), Stage::Extended);
    }

    #[test]
    fn test_exact_thresholds_do_not_trigger() {
        let p = profile(ExerciseId::Squat);
        let mut counter = RepCounter::new(p.clone());

        let step = counter.observe_angle(Some(p.thresholds.upper_enter()), Timestamp::ZERO);
        assert_eq!(step.state.stage, Stage::Unknown);

        counter.observe_angle(Some(170.0), Timestamp::from_millis(1000));
        let step = counter.observe_angle(Some(p.thresholds.lower_enter()), Timestamp::from_millis(2000));
        assert!(step.event.is_none());
        assert_eq!(step.state.stage, Stage::Extended);
    }

    #[test]
    fn test_debounce_within_window() {
        let mut counter = RepCounter::new(profile(ExerciseId::Squat));

        counter.observe_angle(Some(170.0), Timestamp::from_millis(0));
        let first = counter.observe_angle(Some(90.0), Timestamp::from_millis(100));
        counter.observe_angle(Some(170.0), Timestamp::from_millis(300));
        let second = counter.observe_angle(Some(90.0), Timestamp::from_millis(600));

        assert!(first.event.is_some());
        assert!(second.event.is_none());
        assert!(second.suppressed);
        // Stage still follows the motion
        assert_eq!(second.state.stage, Stage::Flexed);
        assert_eq!(counter.accepted(), 1);
        assert_eq!(counter.suppressed(), 1);
    }

    #[test]
    fn test_debounce_boundary() {
        let p = profile(ExerciseId::Squat);

        for (gap, expected) in [(700u64, 1u64), (701, 2)] {
            let mut counter = RepCounter::new(p.clone());
            counter.observe_angle(Some(170.0), Timestamp::from_millis(0));
            counter.observe_angle(Some(90.0), Timestamp::from_millis(1000));
            counter.observe_angle(Some(170.0), Timestamp::from_millis(1000 + gap / 2));
            counter.observe_angle(Some(90.0), Timestamp::from_millis(1000 + gap));
            assert_eq!(counter.accepted(), expected, "gap {gap}ms");
        }
    }

    #[test]
    fn test_suppressed_rep_does_not_reset_window() {
        let mut counter = RepCounter::new(profile(ExerciseId::Squat));

        counter.observe_angle(Some(170.0), Timestamp::from_millis(0));
        counter.observe_angle(Some(90.0), Timestamp::from_millis(100));
        counter.observe_angle(Some(170.0), Timestamp::from_millis(300));
        counter.observe_angle(Some(90.0), Timestamp::from_millis(500));
        counter.observe_angle(Some(170.0), Timestamp::from_millis(700));
        let third = counter.observe_angle(Some(90.0), Timestamp::from_millis(900));

        // 800ms after the last accepted rep, not after the suppressed one
        assert!(third.event.is_some());
    }

    #[test]
    fn test_missing_keypoints_leave_state() {
        let mut counter = RepCounter::new(profile(ExerciseId::Squat));
        counter.observe_angle(Some(170.0), Timestamp::ZERO);

        let step = counter.observe(&PoseFrame::empty(), Timestamp::from_millis(300));
        assert_eq!(step.angle, None);
        assert_eq!(step.display_angle(), 0.0);
        assert!(step.event.is_none());
        assert_eq!(counter.stage(), Stage::Extended);
    }

    #[test]
    fn test_reset() {
        let mut counter = RepCounter::new(profile(ExerciseId::Squat));
        run(&mut counter, &[170.0, 90.0]);
        counter.reset();

        assert_eq!(counter.stage(), Stage::Unknown);
        assert_eq!(counter.accepted(), 0);
        assert_eq!(counter.state().last_rep_at, None);
    }

    proptest! {
        #[test]
        fn prop_band_is_inert(
            start in prop_oneof![Just(Stage::Unknown), Just(Stage::Extended), Just(Stage::Flexed)],
            angles in proptest::collection::vec(95.01f64..159.99, 1..64),
        ) {
            let p = profile(ExerciseId::Squat);
            let mut state = RepState { stage: start, last_rep_at: None };
            for (i, a) in angles.into_iter().enumerate() {
                let step = state.step_angle(&p, Some(a), Timestamp::from_millis(i as u64 * 1000), REP_DEBOUNCE);
                prop_assert!(step.event.is_none());
                prop_assert_eq!(step.state.stage, start);
                state = step.state;
            }
        }

        #[test]
        fn prop_accepted_reps_are_spaced(
            angles in proptest::collection::vec(0.0f64..180.0, 1..128),
            gaps in proptest::collection::vec(0u64..1000, 128),
        ) {
            let mut counter = RepCounter::new(profile(ExerciseId::Squat));
            let mut now = 0u64;
            let mut last: Option<u64> = None;
            for (a, gap) in angles.into_iter().zip(gaps) {
                now += gap;
                if let Some(event) = counter.observe_angle(Some(a), Timestamp::from_millis(now)).event {
                    if let Some(prev) = last {
                        prop_assert!(event.at.as_millis() - prev > 700);
                    }
                    last = Some(event.at.as_millis());
                }
            }
        }
    }
}
