//! Liveness monitor - is a subject currently in view?
//!
//! Decoupled from rep detection: a subject missing for a frame or two in the
//! middle of a rep stays active; only a gap longer than the timeout counts
//! as having left the frame.

use std::time::Duration;

use serde::Serialize;

use repsense_core::{PoseFrame, Timestamp};

/// Gap without keypoints after which the subject is idle
pub const LIVENESS_TIMEOUT: Duration = Duration::from_millis(800);

/// Liveness flag plus the last time any keypoint was seen
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize)]
pub struct LivenessState {
    pub last_seen: Option<Timestamp>,
    pub is_active: bool,
}

/// Flip of the liveness flag
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LivenessChange {
    BecameActive,
    BecameIdle,
}

/// Tracks liveness across the frame stream
#[derive(Clone, Debug)]
pub struct LivenessMonitor {
    timeout: Duration,
    state: LivenessState,
}

impl LivenessMonitor {
    pub fn new() -> Self {
        Self::with_timeout(LIVENESS_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        LivenessMonitor {
            timeout,
            state: LivenessState::default(),
        }
    }

    /// Update from one processed frame
    pub fn observe(&mut self, frame: &PoseFrame, now: Timestamp) -> Option<LivenessChange> {
        let was_active = self.state.is_active;

        if !frame.is_empty() {
            self.state.is_active = true;
            self.state.last_seen = Some(now);
        } else if let Some(last_seen) = self.state.last_seen {
            if now.since(last_seen) > self.timeout {
                self.state.is_active = false;
            }
        }

        match (was_active, self.state.is_active) {
            (false, true) => Some(LivenessChange::BecameActive),
            (true, false) => Some(LivenessChange::BecameIdle),
            _ => None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active
    }

    pub fn state(&self) -> LivenessState {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = LivenessState::default();
    }
}

impl Default for LivenessMonitor {
    fn default() -> Self {
        Self::new()
    }
}
