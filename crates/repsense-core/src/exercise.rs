//! Exercise identifiers and the profile table
//!
//! Each exercise maps to one [`ExerciseProfile`]: the joint chain whose angle
//! is tracked, the motion family that decides which stage is the baseline,
//! and the two thresholds bracketing the hysteresis band. The table is
//! resolved once at session start; per-frame code never branches on names.

use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{triplet_angle, AngleMode, PoseFrame, Stage, TrackerError, TrackerResult};

/// Supported exercises
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseId {
    Squat,
    KneeExtension,
    LegRaise,
    BicepCurl,
    ShoulderAbduction,
    SideBend,
}

impl ExerciseId {
    /// All exercises in table order
    pub fn all() -> &'static [ExerciseId] {
        &[
            ExerciseId::Squat,
            ExerciseId::KneeExtension,
            ExerciseId::LegRaise,
            ExerciseId::BicepCurl,
            ExerciseId::ShoulderAbduction,
            ExerciseId::SideBend,
        ]
    }

    /// Wire identifier
    pub fn as_str(self) -> &'static str {
        match self {
            ExerciseId::Squat => "squat",
            ExerciseId::KneeExtension => "knee_extension",
            ExerciseId::LegRaise => "leg_raise",
            ExerciseId::BicepCurl => "bicep_curl",
            ExerciseId::ShoulderAbduction => "shoulder_abduction",
            ExerciseId::SideBend => "side_bend",
        }
    }

    /// Human-readable name for reports
    pub fn display_name(self) -> &'static str {
        match self {
            ExerciseId::Squat => "Squat",
            ExerciseId::KneeExtension => "Knee Extension",
            ExerciseId::LegRaise => "Leg Raise",
            ExerciseId::BicepCurl => "Bicep Curl",
            ExerciseId::ShoulderAbduction => "Shoulder Abduction",
            ExerciseId::SideBend => "Side Bend",
        }
    }
}

impl FromStr for ExerciseId {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExerciseId::all()
            .iter()
            .copied()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| TrackerError::UnknownExercise(s.to_string()))
    }
}

impl std::fmt::Display for ExerciseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which end of the motion a repetition starts from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MotionFamily {
    /// Open joint first, rep completes on closing (squat, knee extension, leg raise)
    ExtensionFirst,
    /// Mirrored labels: the open joint is the flexed baseline (bicep curl, shoulder abduction)
    FlexionFirst,
    /// Trunk side bend over the shoulder-hip-hip chain
    Lateral,
}

impl MotionFamily {
    /// Stage entered when the angle rises above the upper threshold
    pub fn baseline_stage(self) -> Stage {
        match self {
            MotionFamily::ExtensionFirst | MotionFamily::Lateral => Stage::Extended,
            MotionFamily::FlexionFirst => Stage::Flexed,
        }
    }

    /// Stage entered when a repetition completes
    pub fn completion_stage(self) -> Stage {
        match self {
            MotionFamily::ExtensionFirst | MotionFamily::Lateral => Stage::Flexed,
            MotionFamily::FlexionFirst => Stage::Extended,
        }
    }
}

/// Three keypoint names; the angle is measured at `vertex`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct JointTriplet {
    pub proximal: &'static str,
    pub vertex: &'static str,
    pub distal: &'static str,
}

impl JointTriplet {
    pub const fn new(proximal: &'static str, vertex: &'static str, distal: &'static str) -> Self {
        Self {
            proximal,
            vertex,
            distal,
        }
    }

    pub fn names(&self) -> [&'static str; 3] {
        [self.proximal, self.vertex, self.distal]
    }
}

#[derive(Deserialize)]
struct RawThresholds {
    upper_enter: f64,
    lower_enter: f64,
}

impl TryFrom<RawThresholds> for StageThresholds {
    type Error = TrackerError;

    fn try_from(raw: RawThresholds) -> Result<Self, Self::Error> {
        StageThresholds::new(raw.upper_enter, raw.lower_enter)
    }
}

/// Hysteresis band in degrees
/// INVARIANT: 0 <= lower_enter < upper_enter <= 180
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawThresholds")]
pub struct StageThresholds {
    upper_enter: f64,
    lower_enter: f64,
}

impl StageThresholds {
    pub fn new(upper_enter: f64, lower_enter: f64) -> TrackerResult<Self> {
        let in_range = |v: f64| v.is_finite() && (0.0..=180.0).contains(&v);
        if !in_range(upper_enter) || !in_range(lower_enter) || upper_enter <= lower_enter {
            return Err(TrackerError::InvalidThresholds {
                upper: upper_enter,
                lower: lower_enter,
            });
        }
        Ok(Self {
            upper_enter,
            lower_enter,
        })
    }

    // Literal table values, checked by test_standard_table_is_valid
    const fn fixed(upper_enter: f64, lower_enter: f64) -> Self {
        Self {
            upper_enter,
            lower_enter,
        }
    }

    pub fn upper_enter(&self) -> f64 {
        self.upper_enter
    }

    pub fn lower_enter(&self) -> f64 {
        self.lower_enter
    }

    /// Width of the dead band between the thresholds
    pub fn band(&self) -> f64 {
        self.upper_enter - self.lower_enter
    }
}

/// Everything the rep state machine needs to know about one exercise
#[derive(Clone, Debug, PartialEq)]
pub struct ExerciseProfile {
    pub id: ExerciseId,
    pub family: MotionFamily,
    /// Chain tracked in live sessions
    pub primary: JointTriplet,
    /// Opposite-side chain used for bilateral averaging
    pub mirror: Option<JointTriplet>,
    pub thresholds: StageThresholds,
}

impl ExerciseProfile {
    /// Angle for this frame, `None` when the needed keypoints are missing
    pub fn evaluate(&self, frame: &PoseFrame, mode: AngleMode) -> Option<f64> {
        let primary = triplet_angle(frame, &self.primary);
        let mirror = match mode {
            AngleMode::Primary => None,
            AngleMode::Bilateral => self.mirror.as_ref().and_then(|m| triplet_angle(frame, m)),
        };

        match (primary, mirror) {
            (Some(a), Some(b)) => Some((a + b) / 2.0),
            (Some(a), None) | (None, Some(a)) => Some(a),
            (None, None) => None,
        }
    }

    /// Keypoint names the pose service must return for this exercise
    pub fn required_keypoints(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = Vec::with_capacity(6);
        let chains = std::iter::once(&self.primary).chain(self.mirror.as_ref());
        for name in chains.flat_map(|t| t.names()) {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }
}

const LEFT_LEG: JointTriplet = JointTriplet::new("left_hip", "left_knee", "left_ankle");
const RIGHT_LEG: JointTriplet = JointTriplet::new("right_hip", "right_knee", "right_ankle");
const LEFT_ARM: JointTriplet = JointTriplet::new("left_shoulder", "left_elbow", "left_wrist");
const RIGHT_ARM: JointTriplet = JointTriplet::new("right_shoulder", "right_elbow", "right_wrist");
const LEFT_TRUNK: JointTriplet = JointTriplet::new("left_shoulder", "left_hip", "right_hip");
const RIGHT_TRUNK: JointTriplet = JointTriplet::new("right_shoulder", "right_hip", "left_hip");

fn standard_profile(id: ExerciseId) -> ExerciseProfile {
    let (family, primary, mirror, thresholds) = match id {
        ExerciseId::Squat | ExerciseId::KneeExtension | ExerciseId::LegRaise => (
            MotionFamily::ExtensionFirst,
            LEFT_LEG,
            RIGHT_LEG,
            StageThresholds::fixed(160.0, 95.0),
        ),
        ExerciseId::BicepCurl | ExerciseId::ShoulderAbduction => (
            MotionFamily::FlexionFirst,
            LEFT_ARM,
            RIGHT_ARM,
            StageThresholds::fixed(150.0, 50.0),
        ),
        ExerciseId::SideBend => (
            MotionFamily::Lateral,
            LEFT_TRUNK,
            RIGHT_TRUNK,
            StageThresholds::fixed(40.0, 25.0),
        ),
    };

    ExerciseProfile {
        id,
        family,
        primary,
        mirror: Some(mirror),
        thresholds,
    }
}

/// Lookup table from exercise to profile
#[derive(Clone, Debug)]
pub struct ProfileTable {
    profiles: HashMap<ExerciseId, ExerciseProfile>,
}

impl ProfileTable {
    /// Table with the built-in thresholds for every exercise
    pub fn standard() -> Self {
        let profiles = ExerciseId::all()
            .iter()
            .map(|&id| (id, standard_profile(id)))
            .collect();
        Self { profiles }
    }

    /// Empty table, to be filled with [`ProfileTable::insert`]
    pub fn empty() -> Self {
        Self {
            profiles: HashMap::new(),
        }
    }

    pub fn insert(&mut self, profile: ExerciseProfile) {
        self.profiles.insert(profile.id, profile);
    }

    /// Replace the thresholds of one exercise (no-op if absent)
    pub fn with_thresholds(mut self, id: ExerciseId, thresholds: StageThresholds) -> Self {
        if let Some(profile) = self.profiles.get_mut(&id) {
            profile.thresholds = thresholds;
        }
        self
    }

    pub fn get(&self, id: ExerciseId) -> Option<&ExerciseProfile> {
        self.profiles.get(&id)
    }

    /// Resolve a profile, failing fast when the exercise has no entry
    pub fn resolve(&self, id: ExerciseId) -> TrackerResult<ExerciseProfile> {
        self.profiles
            .get(&id)
            .cloned()
            .ok_or_else(|| TrackerError::UnknownExercise(id.to_string()))
    }

    /// Resolve from a wire identifier
    pub fn resolve_key(&self, key: &str) -> TrackerResult<ExerciseProfile> {
        self.resolve(key.parse()?)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl Default for ProfileTable {
    fn default() -> Self {
        Self::standard()
    }
}
