//! Joint angle evaluation
//!
//! The angle at vertex B of the chain A-B-C, always in [0, 180] degrees.
//! A missing keypoint yields `None` ("undetermined"), never 0.

use serde::{Deserialize, Serialize};

use crate::{JointTriplet, Keypoint, PoseFrame};

/// Which joint chains feed the angle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AngleMode {
    /// Primary side only
    #[default]
    Primary,
    /// Mean of primary and mirror sides, whichever are visible
    Bilateral,
}

/// Angle at `vertex` between the rays towards `proximal` and `distal`, in degrees
pub fn angle_between(proximal: &Keypoint, vertex: &Keypoint, distal: &Keypoint) -> f64 {
    let to_proximal = (proximal.y - vertex.y).atan2(proximal.x - vertex.x);
    let to_distal = (distal.y - vertex.y).atan2(distal.x - vertex.x);

    let degrees = (to_distal - to_proximal).to_degrees().abs();
    if degrees > 180.0 {
        360.0 - degrees
    } else {
        degrees
    }
}

/// Angle of one triplet in a frame, `None` if any keypoint is absent
pub fn triplet_angle(frame: &PoseFrame, triplet: &JointTriplet) -> Option<f64> {
    let proximal = frame.get(triplet.proximal)?;
    let vertex = frame.get(triplet.vertex)?;
    let distal = frame.get(triplet.distal)?;
    Some(angle_between(proximal, vertex, distal))
}
