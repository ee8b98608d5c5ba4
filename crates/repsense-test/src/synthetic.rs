//! Synthetic poses
//!
//! Builds keypoint sets whose tracked joint sits at a requested angle, with
//! optional seeded jitter so the hysteresis band gets exercised.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use repsense_core::{ExerciseProfile, JointTriplet, Keypoint, PoseFrame};

/// Segment length in normalized image units
const LIMB: f64 = 0.2;

/// Pose generator for one exercise
pub struct PoseSynthesizer {
    profile: ExerciseProfile,
    rng: StdRng,
    /// Max absolute angle jitter in degrees
    noise_deg: f64,
}

impl PoseSynthesizer {
    pub fn new(profile: ExerciseProfile, seed: u64) -> Self {
        PoseSynthesizer {
            profile,
            rng: StdRng::seed_from_u64(seed),
            noise_deg: 0.0,
        }
    }

    pub fn with_noise(mut self, noise_deg: f64) -> Self {
        self.noise_deg = noise_deg.abs();
        self
    }

    /// Frame with the tracked joint(s) at `angle_deg`, plus jitter
    pub fn frame(&mut self, angle_deg: f64) -> PoseFrame {
        let jitter = if self.noise_deg > 0.0 {
            self.rng.gen_range(-self.noise_deg..=self.noise_deg)
        } else {
            0.0
        };
        let angle = (angle_deg + jitter).clamp(0.0, 180.0);

        let mut keypoints = place_triplet(&self.profile.primary, 0.3, angle).to_vec();
        if let Some(mirror) = self.profile.mirror {
            // Trunk chains share keypoints across sides; skip the mirror then
            let shared = mirror
                .names()
                .iter()
                .any(|name| self.profile.primary.names().contains(name));
            if !shared {
                keypoints.extend(place_triplet(&mirror, 0.7, angle));
            }
        }
        PoseFrame::from_keypoints(keypoints)
    }

    /// Frames for `reps` full repetitions, starting and ending at baseline
    pub fn rep_frames(&mut self, reps: usize) -> Vec<PoseFrame> {
        let (high, low) = rep_extremes(&self.profile);
        let mut frames = Vec::with_capacity(reps * 2 + 1);
        for _ in 0..reps {
            frames.push(self.frame(high));
            frames.push(self.frame(low));
        }
        frames.push(self.frame(high));
        frames
    }

    pub fn profile(&self) -> &ExerciseProfile {
        &self.profile
    }
}

/// Angles clearly outside the hysteresis band on either side
pub fn rep_extremes(profile: &ExerciseProfile) -> (f64, f64) {
    let thresholds = profile.thresholds;
    let margin = (thresholds.band() / 2.0).min(10.0);
    (
        (thresholds.upper_enter() + margin).min(180.0),
        (thresholds.lower_enter() - margin).max(0.0),
    )
}

/// Vertex at (x, 0.5); proximal straight up, distal rotated by the angle
fn place_triplet(triplet: &JointTriplet, x: f64, angle_deg: f64) -> [Keypoint; 3] {
    let rad = angle_deg.to_radians();
    [
        Keypoint::new(triplet.proximal, x, 0.5 - LIMB),
        Keypoint::new(triplet.vertex, x, 0.5),
        Keypoint::new(triplet.distal, x + LIMB * rad.sin(), 0.5 - LIMB * rad.cos()),
    ]
}
