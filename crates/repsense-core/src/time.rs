//! Time primitives for RepSense
//!
//! Every frame, rep and liveness decision is stamped with a [`Timestamp`]:
//! milliseconds since the session epoch, monotonic, never negative.

use std::ops::{Add, Sub};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Session-relative wall time in milliseconds
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp(0);

    #[inline]
    pub fn from_millis(millis: u64) -> Self {
        Timestamp(millis)
    }

    #[inline]
    pub fn from_secs_f64(secs: f64) -> Self {
        Timestamp((secs.max(0.0) * 1000.0) as u64)
    }

    /// Build from a duration measured since the session epoch
    #[inline]
    pub fn from_duration(since_epoch: Duration) -> Self {
        Timestamp(since_epoch.as_millis().min(u64::MAX as u128) as u64)
    }

    #[inline]
    pub fn as_millis(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / 1000.0
    }

    /// Time elapsed since `earlier`, zero if `earlier` is in the future
    #[inline]
    pub fn since(self, earlier: Timestamp) -> Duration {
        self - earlier
    }

    #[inline]
    pub fn saturating_add(self, duration: Duration) -> Self {
        Timestamp(self.0.saturating_add(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)))
    }
}

impl Add<Duration> for Timestamp {
    type Output = Timestamp;

    #[inline]
    fn add(self, rhs: Duration) -> Self::Output {
        self.saturating_add(rhs)
    }
}

impl Sub<Timestamp> for Timestamp {
    type Output = Duration;

    #[inline]
    fn sub(self, rhs: Timestamp) -> Self::Output {
        Duration::from_millis(self.0.saturating_sub(rhs.0))
    }
}

impl std::fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "t({}ms)", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_sub_saturates() {
        let early = Timestamp::from_millis(100);
        let late = Timestamp::from_millis(850);

        assert_eq!(late - early, Duration::from_millis(750));
        assert_eq!(early - late, Duration::ZERO);
    }

    #[test]
    fn test_timestamp_add_duration() {
        let t = Timestamp::ZERO + Duration::from_millis(300);
        assert_eq!(t.as_millis(), 300);
        assert!((t.as_secs_f64() - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_timestamp_add_saturates() {
        let near_end = Timestamp::from_millis(u64::MAX - 5);
        assert_eq!((near_end + Duration::from_millis(10)).as_millis(), u64::MAX);
        assert_eq!((Timestamp::ZERO + Duration::MAX).as_millis(), u64::MAX);
    }

    #[test]
    fn test_timestamp_from_negative_secs() {
        assert_eq!(Timestamp::from_secs_f64(-1.0), Timestamp::ZERO);
    }
}
