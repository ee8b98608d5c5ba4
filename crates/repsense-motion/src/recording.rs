//! Offline analysis of a recorded exercise clip
//!
//! Same state machine as the live path, but angles come from both sides of
//! the body (mean of the visible chains) and the result is a one-shot summary
//! rather than a stream of events.

use std::time::Duration;

use serde::Serialize;

use repsense_core::{AngleMode, ExerciseProfile, PoseFrame, Timestamp};

use crate::{RepCounter, RepSettings, REP_DEBOUNCE};

/// Summary of a recorded clip
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RecordingSummary {
    pub reps: u32,
    pub frames: u64,
    /// Frames where the tracked angle could be evaluated
    pub frames_with_pose: u64,
    /// First to last frame
    pub duration: Duration,
    /// Mean gap between consecutive reps, if at least two were counted
    pub mean_rep_interval: Option<Duration>,
}

/// Folds a clip frame by frame
#[derive(Clone, Debug)]
pub struct RecordingAnalyzer {
    counter: RepCounter,
    frames: u64,
    frames_with_pose: u64,
    first: Option<Timestamp>,
    last: Option<Timestamp>,
    rep_times: Vec<Timestamp>,
}

impl RecordingAnalyzer {
    pub fn new(profile: ExerciseProfile) -> Self {
        Self::with_debounce(profile, REP_DEBOUNCE)
    }

    pub fn with_debounce(profile: ExerciseProfile, debounce: Duration) -> Self {
        let settings = RepSettings {
            debounce,
            angle_mode: AngleMode::Bilateral,
        };
        RecordingAnalyzer {
            counter: RepCounter::with_settings(profile, settings),
            frames: 0,
            frames_with_pose: 0,
            first: None,
            last: None,
            rep_times: Vec::new(),
        }
    }

    pub fn push(&mut self, at: Timestamp, frame: &PoseFrame) {
        self.frames += 1;
        self.first.get_or_insert(at);
        self.last = Some(at);

        let step = self.counter.observe(frame, at);
        if step.angle.is_some() {
            self.frames_with_pose += 1;
        }
        if let Some(event) = step.event {
            self.rep_times.push(event.at);
        }
    }

    pub fn finish(self) -> RecordingSummary {
        let duration = match (self.first, self.last) {
            (Some(first), Some(last)) => last.since(first),
            _ => Duration::ZERO,
        };

        let mean_rep_interval = if self.rep_times.len() >= 2 {
            let gaps: Duration = self
                .rep_times
                .windows(2)
                .map(|w| w[1].since(w[0]))
                .sum();
            Some(gaps / (self.rep_times.len() as u32 - 1))
        } else {
            None
        };

        RecordingSummary {
            reps: self.rep_times.len() as u32,
            frames: self.frames,
            frames_with_pose: self.frames_with_pose,
            duration,
            mean_rep_interval,
        }
    }
}

/// Analyze a whole clip in one call
pub fn analyze_recording<'a, I>(profile: ExerciseProfile, frames: I) -> RecordingSummary
where
    I: IntoIterator<Item = (Timestamp, &'a PoseFrame)>,
{
    let mut analyzer = RecordingAnalyzer::new(profile);
    for (at, frame) in frames {
        analyzer.push(at, frame);
    }
    let summary = analyzer.finish();
    tracing::debug!(reps = summary.reps, frames = summary.frames, "Recording analyzed");
    summary
}
