//! Synthetic subject - a person doing reps in front of a fake camera

use std::f64::consts::TAU;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

use repsense_core::{ExerciseId, ExerciseProfile, TrackerResult};
use repsense_runtime::{FrameSource, PoseResponse};
use repsense_test::{rep_extremes, PoseSynthesizer};

/// Pose service round trip
const SERVICE_LATENCY: Duration = Duration::from_millis(40);

/// Every Nth capture the subject is out of frame
const STEP_OUT_EVERY: u64 = 23;

/// Cosine sweep between the two rep extremes
pub struct SyntheticSubject {
    poses: Mutex<PoseSynthesizer>,
    started: Instant,
    rep_period: Duration,
    high: f64,
    low: f64,
    captures: AtomicU64,
}

impl SyntheticSubject {
    pub fn new(profile: ExerciseProfile, rep_period: Duration) -> Self {
        let (high, low) = rep_extremes(&profile);
        SyntheticSubject {
            poses: Mutex::new(PoseSynthesizer::new(profile, 2024).with_noise(2.0)),
            started: Instant::now(),
            rep_period,
            high,
            low,
            captures: AtomicU64::new(0),
        }
    }

    fn angle_at(&self, elapsed: Duration) -> f64 {
        let phase = elapsed.as_secs_f64() / self.rep_period.as_secs_f64();
        let swing = 0.5 + 0.5 * (TAU * phase).cos();
        self.low + (self.high - self.low) * swing
    }
}

impl FrameSource for SyntheticSubject {
    async fn acquire_for(&self, _exercise: ExerciseId) -> TrackerResult<PoseResponse> {
        tokio::time::sleep(SERVICE_LATENCY).await;

        let n = self.captures.fetch_add(1, Ordering::Relaxed) + 1;
        if n % STEP_OUT_EVERY == 0 {
            return Ok(PoseResponse::default());
        }

        let elapsed = self.started.elapsed();
        let angle = self.angle_at(elapsed);
        let frame = self.poses.lock().frame(angle);
        let form = 0.75 + 0.2 * (elapsed.as_secs_f64() / 7.0).sin();
        Ok(PoseResponse::new(frame).with_form_score(form))
    }
}
