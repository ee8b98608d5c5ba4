//! Form score aggregation
//!
//! Running mean of the pose service's per-frame quality signal. No judgement
//! happens here; the mean is read once, when the session report is built.

use serde::Serialize;

/// Sum and count of folded scores
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize)]
pub struct FormScoreAggregator {
    sum: f64,
    count: u64,
}

impl FormScoreAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one frame's score; absent and non-finite scores are skipped
    pub fn fold(&mut self, score: Option<f64>) {
        let Some(score) = score.filter(|s| s.is_finite()) else {
            return;
        };
        self.sum += score.clamp(0.0, 1.0);
        self.count += 1;
    }

    /// Mean score in [0, 1], 0 when nothing was folded
    pub fn average(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }

    pub fn samples(&self) -> u64 {
        self.count
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_average_is_zero() {
        assert_eq!(FormScoreAggregator::new().average(), 0.0);
    }

    #[test]
    fn test_running_mean() {
        let mut form = FormScoreAggregator::new();
        form.fold(Some(0.8));
        form.fold(None);
        form.fold(Some(0.6));

        assert_eq!(form.samples(), 2);
        assert!((form.average() - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_out_of_range_scores() {
        let mut form = FormScoreAggregator::new();
        form.fold(Some(f64::NAN));
        form.fold(Some(1.7));
        form.fold(Some(-0.3));

        assert_eq!(form.samples(), 2);
        assert!((form.average() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_reset() {
        let mut form = FormScoreAggregator::new();
        form.fold(Some(0.9));
        form.reset();
        assert_eq!(form.samples(), 0);
        assert_eq!(form.average(), 0.0);
    }
}
