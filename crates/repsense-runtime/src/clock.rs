//! Session clock and cooperative stop flag

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::time::Instant;

use repsense_core::Timestamp;

/// Monotonic clock anchored at session start
/// Built on Tokio's clock so paused-time tests stay deterministic
#[derive(Clone, Copy, Debug)]
pub struct SessionClock {
    epoch: Instant,
}

impl SessionClock {
    pub fn start() -> Self {
        SessionClock {
            epoch: Instant::now(),
        }
    }

    /// Milliseconds since the epoch
    pub fn now(&self) -> Timestamp {
        Timestamp::from_duration(self.epoch.elapsed())
    }
}

/// Shared cancellation flag
/// Checked before every acquisition and every state mutation
#[derive(Clone, Debug, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}
