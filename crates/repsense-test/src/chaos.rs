//! Chaos wrapper for frame sources
//!
//! Simulates a hostile capture path:
//! - Acquisition failures (camera or pose service errors)
//! - Occlusion (the subject leaves the frame)
//! - Latency jitter (slow pose service)

use std::time::Duration;

use parking_lot::Mutex;
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use repsense_core::{ExerciseId, PoseFrame, TrackerError, TrackerResult};
use repsense_runtime::{FrameSource, PoseResponse};

/// Chaos knobs
#[derive(Clone, Debug, PartialEq)]
pub struct ChaosConfig {
    /// Probability an acquisition fails outright
    pub failure_rate: f64,
    /// Probability the returned pose is emptied
    pub occlusion_rate: f64,
    /// Added latency range in milliseconds
    pub latency_ms: (u64, u64),
    pub seed: u64,
}

impl ChaosConfig {
    /// Pass-through
    pub fn calm() -> Self {
        ChaosConfig {
            failure_rate: 0.0,
            occlusion_rate: 0.0,
            latency_ms: (0, 0),
            seed: 0,
        }
    }

    /// Occasional hiccups
    pub fn flaky() -> Self {
        ChaosConfig {
            failure_rate: 0.1,
            occlusion_rate: 0.05,
            latency_ms: (20, 120),
            seed: 42,
        }
    }

    /// Service struggling: latency beyond the capture period
    pub fn hostile() -> Self {
        ChaosConfig {
            failure_rate: 0.3,
            occlusion_rate: 0.2,
            latency_ms: (100, 900),
            seed: 1337,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// What chaos did to one acquisition
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Fate {
    Pass,
    Fail,
    Occlude,
}

/// Chaos counters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChaosStats {
    pub passed: u64,
    pub failed: u64,
    pub occluded: u64,
}

/// Frame source wrapped in seeded chaos
pub struct ChaosFrameSource<S> {
    inner: S,
    config: ChaosConfig,
    rng: Mutex<StdRng>,
    stats: Mutex<ChaosStats>,
}

impl<S: FrameSource> ChaosFrameSource<S> {
    pub fn new(inner: S, config: ChaosConfig) -> Self {
        ChaosFrameSource {
            inner,
            rng: Mutex::new(StdRng::seed_from_u64(config.seed)),
            config,
            stats: Mutex::new(ChaosStats::default()),
        }
    }

    pub fn stats(&self) -> ChaosStats {
        *self.stats.lock()
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn roll(&self) -> (Fate, Duration) {
        let mut rng = self.rng.lock();
        let (min, max) = self.config.latency_ms;
        let latency = if max > min {
            Uniform::new_inclusive(min, max).sample(&mut *rng)
        } else {
            min
        };

        let fate = if rng.gen_bool(self.config.failure_rate.clamp(0.0, 1.0)) {
            Fate::Fail
        } else if rng.gen_bool(self.config.occlusion_rate.clamp(0.0, 1.0)) {
            Fate::Occlude
        } else {
            Fate::Pass
        };

        let mut stats = self.stats.lock();
        match fate {
            Fate::Pass => stats.passed += 1,
            Fate::Fail => stats.failed += 1,
            Fate::Occlude => stats.occluded += 1,
        }
        (fate, Duration::from_millis(latency))
    }
}

impl<S: FrameSource> FrameSource for ChaosFrameSource<S> {
    async fn acquire_for(&self, exercise: ExerciseId) -> TrackerResult<PoseResponse> {
        let (fate, latency) = self.roll();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        match fate {
            Fate::Fail => Err(TrackerError::Acquisition("chaos: injected failure".into())),
            Fate::Occlude => {
                let mut response = self.inner.acquire_for(exercise).await?;
                response.pose = PoseFrame::empty();
                Ok(response)
            }
            Fate::Pass => self.inner.acquire_for(exercise).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ScriptedFrameSource, ScriptedStep};
    use repsense_core::Keypoint;

    fn nose() -> ScriptedStep {
        ScriptedStep::pose(PoseFrame::from_keypoints([Keypoint::new("nose", 0.5, 0.1)]))
    }

    #[tokio::test]
    async fn test_calm_passes_through() {
        let source = ChaosFrameSource::new(ScriptedFrameSource::looping(vec![nose()]), ChaosConfig::calm());
        for _ in 0..20 {
            let response = source.acquire_for(ExerciseId::Squat).await.unwrap();
            assert!(!response.pose.is_empty());
        }
        assert_eq!(source.stats().passed, 20);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hostile_injects_faults() {
        let source = ChaosFrameSource::new(ScriptedFrameSource::looping(vec![nose()]), ChaosConfig::hostile());
        let mut errors = 0;
        let mut empty = 0;
        for _ in 0..200 {
            match source.acquire_for(ExerciseId::Squat).await {
                Err(_) => errors += 1,
                Ok(response) if response.pose.is_empty() => empty += 1,
                Ok(_) => {}
            }
        }
        let stats = source.stats();
        assert_eq!(stats.failed, errors);
        assert_eq!(stats.occluded, empty);
        assert!(errors > 20 && errors < 100);
        assert!(empty > 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_seed_same_faults() {
        let run = |seed| async move {
            let source = ChaosFrameSource::new(
                ScriptedFrameSource::looping(vec![nose()]),
                ChaosConfig::flaky().with_seed(seed),
            );
            let mut outcomes = Vec::new();
            for _ in 0..50 {
                outcomes.push(source.acquire_for(ExerciseId::Squat).await.is_ok());
            }
            outcomes
        };
        assert_eq!(run(9).await, run(9).await);
    }
}
