//! Keypoints and pose frames
//!
//! A [`PoseFrame`] is what the pose service returns for one capture instant:
//! a set of named, normalized 2-D landmarks. Names are unique within a frame.

use serde::{Deserialize, Serialize};

/// Single named body landmark
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    /// Landmark identifier (e.g. "left_hip")
    pub name: String,
    /// Normalized X coordinate (0.0-1.0)
    pub x: f64,
    /// Normalized Y coordinate (0.0-1.0)
    pub y: f64,
    /// Detection confidence (0.0-1.0), if the service reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl Keypoint {
    pub fn new(name: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            name: name.into(),
            x,
            y,
            score: None,
        }
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }
}

#[derive(Deserialize)]
struct RawPoseFrame {
    #[serde(default)]
    keypoints: Vec<Keypoint>,
}

impl From<RawPoseFrame> for PoseFrame {
    fn from(raw: RawPoseFrame) -> Self {
        PoseFrame::from_keypoints(raw.keypoints)
    }
}

/// Keypoints for one capture instant
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawPoseFrame")]
pub struct PoseFrame {
    keypoints: Vec<Keypoint>,
}

impl PoseFrame {
    /// Frame with no subject detected
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a frame; a repeated name overwrites the earlier entry in place
    pub fn from_keypoints<I>(keypoints: I) -> Self
    where
        I: IntoIterator<Item = Keypoint>,
    {
        let mut frame = Self::empty();
        for keypoint in keypoints {
            frame.insert(keypoint);
        }
        frame
    }

    /// Insert or replace a keypoint by name
    pub fn insert(&mut self, keypoint: Keypoint) {
        match self.keypoints.iter_mut().find(|k| k.name == keypoint.name) {
            Some(existing) => *existing = keypoint,
            None => self.keypoints.push(keypoint),
        }
    }

    /// Look up a keypoint by name
    pub fn get(&self, name: &str) -> Option<&Keypoint> {
        self.keypoints.iter().find(|k| k.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Keypoint> {
        self.keypoints.iter()
    }

    /// Keep only the named keypoints
    pub fn retain_names(&mut self, names: &[&str]) {
        self.keypoints.retain(|k| names.contains(&k.name.as_str()));
    }
}
