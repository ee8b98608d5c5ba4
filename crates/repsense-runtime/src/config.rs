//! Runtime configuration
//!
//! Every cadence the live loop uses lives here. Durations serialize as
//! whole milliseconds.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use repsense_core::AngleMode;
use repsense_motion::{RepSettings, LIVENESS_TIMEOUT, REP_DEBOUNCE};

/// Default capture period
pub const CAPTURE_INTERVAL: Duration = Duration::from_millis(300);

/// Default elapsed-time tick
pub const ELAPSED_TICK: Duration = Duration::from_secs(1);

/// Default cap on outstanding acquisitions
pub const MAX_IN_FLIGHT: usize = 4;

/// Live session runtime configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Period between frame acquisitions
    #[serde(rename = "capture_interval_ms", with = "millis")]
    pub capture_interval: Duration,
    /// Period of the elapsed-seconds counter
    #[serde(rename = "elapsed_tick_ms", with = "millis")]
    pub elapsed_tick: Duration,
    /// Minimum spacing between accepted reps
    #[serde(rename = "rep_debounce_ms", with = "millis")]
    pub rep_debounce: Duration,
    /// Gap without keypoints before the subject counts as idle
    #[serde(rename = "liveness_timeout_ms", with = "millis")]
    pub liveness_timeout: Duration,
    /// Outstanding acquisitions allowed at once; a tick at the cap is skipped
    pub max_in_flight: usize,
    pub angle_mode: AngleMode,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            capture_interval: CAPTURE_INTERVAL,
            elapsed_tick: ELAPSED_TICK,
            rep_debounce: REP_DEBOUNCE,
            liveness_timeout: LIVENESS_TIMEOUT,
            max_in_flight: MAX_IN_FLIGHT,
            angle_mode: AngleMode::Primary,
        }
    }
}

impl RuntimeConfig {
    /// Slow pose service or constrained uplink
    pub fn low_bandwidth() -> Self {
        RuntimeConfig {
            capture_interval: Duration::from_millis(500),
            liveness_timeout: Duration::from_millis(1200),
            max_in_flight: 2,
            ..Self::default()
        }
    }

    /// Local estimator with headroom for a faster cadence
    pub fn responsive() -> Self {
        RuntimeConfig {
            capture_interval: Duration::from_millis(150),
            max_in_flight: 6,
            ..Self::default()
        }
    }

    /// Offline replay of recorded footage
    pub fn replay() -> Self {
        RuntimeConfig {
            angle_mode: AngleMode::Bilateral,
            ..Self::default()
        }
    }

    pub fn rep_settings(&self) -> RepSettings {
        RepSettings {
            debounce: self.rep_debounce,
            angle_mode: self.angle_mode,
        }
    }

    /// Zero periods would spin the loop
    pub fn sanitized(mut self) -> Self {
        if self.capture_interval.is_zero() {
            self.capture_interval = CAPTURE_INTERVAL;
        }
        if self.elapsed_tick.is_zero() {
            self.elapsed_tick = ELAPSED_TICK;
        }
        self.max_in_flight = self.max_in_flight.max(1);
        self
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
