//! Frame pipeline - one pose response through every per-frame engine

use repsense_core::{ExerciseProfile, RepEvent, Stage, Timestamp};
use repsense_motion::{FormScoreAggregator, LivenessChange, LivenessMonitor, RepCounter};

use crate::{PoseResponse, RuntimeConfig};

/// What one frame did
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameOutcome {
    /// Evaluated angle, `None` when the joint triplet was not visible
    pub angle: Option<f64>,
    pub stage: Stage,
    /// Accepted rep, to be handed to the orchestrator
    pub rep: Option<RepEvent>,
    pub liveness: Option<LivenessChange>,
    pub active: bool,
}

/// Rep counter, liveness monitor and form aggregator for one session
#[derive(Clone, Debug)]
pub struct FramePipeline {
    reps: RepCounter,
    liveness: LivenessMonitor,
    form: FormScoreAggregator,
    last_angle: Option<f64>,
    frames: u64,
}

impl FramePipeline {
    pub fn new(profile: ExerciseProfile, config: &RuntimeConfig) -> Self {
        FramePipeline {
            reps: RepCounter::with_settings(profile, config.rep_settings()),
            liveness: LivenessMonitor::with_timeout(config.liveness_timeout),
            form: FormScoreAggregator::new(),
            last_angle: None,
            frames: 0,
        }
    }

    /// Run one response captured at `now`
    pub fn process(&mut self, response: &PoseResponse, now: Timestamp) -> FrameOutcome {
        self.frames += 1;

        let liveness = self.liveness.observe(&response.pose, now);
        if let Some(change) = liveness {
            tracing::debug!(?change, at = ?now, "Liveness changed");
        }
        self.form.fold(response.form_score);

        let step = self.reps.observe(&response.pose, now);
        if step.angle.is_some() {
            self.last_angle = step.angle;
        }

        FrameOutcome {
            angle: step.angle,
            stage: step.state.stage,
            rep: step.event,
            liveness,
            active: self.liveness.is_active(),
        }
    }

    /// Fresh start for a repeated workout
    pub fn reset(&mut self) {
        self.reps.reset();
        self.liveness.reset();
        self.form.reset();
        self.last_angle = None;
        self.frames = 0;
    }

    pub fn stage(&self) -> Stage {
        self.reps.stage()
    }

    /// Most recent evaluated angle
    pub fn last_angle(&self) -> Option<f64> {
        self.last_angle
    }

    pub fn is_active(&self) -> bool {
        self.liveness.is_active()
    }

    pub fn form_score(&self) -> f64 {
        self.form.average()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn profile(&self) -> &ExerciseProfile {
        self.reps.profile()
    }
}
