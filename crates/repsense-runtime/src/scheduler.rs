//! Frame capture scheduler and elapsed timer
//!
//! Both are owned by the session task and polled from its select loop.
//! Neither ticks unless activated; deactivation drops the interval and, for
//! the capture scheduler, aborts every outstanding acquisition.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::{JoinError, JoinSet};
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

use repsense_core::{ExerciseId, TrackerError, TrackerResult};

use crate::{FrameSource, PoseResponse, RuntimeConfig, StopFlag};

/// Capture counters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub ticks: u64,
    pub launched: u64,
    /// Ticks skipped at the in-flight cap or after stop
    pub skipped: u64,
    pub completed: u64,
    pub failed: u64,
    /// Results aborted or arriving after stop
    pub discarded: u64,
}

/// One step of the capture scheduler
#[derive(Clone, Debug, PartialEq)]
pub enum CaptureEvent {
    Launched,
    Skipped,
    Frame(PoseResponse),
    Failed(TrackerError),
    Discarded,
}

/// Periodic frame acquisition with a bounded in-flight set
pub struct FrameCaptureScheduler<S> {
    source: Arc<S>,
    exercise: ExerciseId,
    period: Duration,
    max_in_flight: usize,
    ticker: Option<Interval>,
    in_flight: JoinSet<TrackerResult<PoseResponse>>,
    stop: StopFlag,
    stats: SchedulerStats,
}

impl<S: FrameSource> FrameCaptureScheduler<S> {
    pub fn new(source: Arc<S>, exercise: ExerciseId, config: &RuntimeConfig, stop: StopFlag) -> Self {
        FrameCaptureScheduler {
            source,
            exercise,
            period: config.capture_interval,
            max_in_flight: config.max_in_flight.max(1),
            ticker: None,
            in_flight: JoinSet::new(),
            stop,
            stats: SchedulerStats::default(),
        }
    }

    /// Start ticking; the first tick fires one full period from now
    pub fn activate(&mut self) {
        if self.ticker.is_some() || self.stop.is_stopped() {
            return;
        }
        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        self.ticker = Some(ticker);
        tracing::debug!(
            exercise = %self.exercise,
            period = %humantime::format_duration(self.period),
            "Capture scheduler active"
        );
    }

    /// Stop ticking and abort outstanding acquisitions
    pub fn deactivate(&mut self) {
        if self.ticker.take().is_some() {
            tracing::debug!(exercise = %self.exercise, "Capture scheduler idle");
        }
        self.abort_in_flight();
    }

    fn abort_in_flight(&mut self) {
        let outstanding = self.in_flight.len();
        if outstanding > 0 {
            self.stats.discarded += outstanding as u64;
            tracing::debug!(outstanding, "Aborting in-flight acquisitions");
        }
        // Dropping the set aborts its tasks
        self.in_flight = JoinSet::new();
    }

    pub fn is_active(&self) -> bool {
        self.ticker.is_some()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }

    /// Wait for the next tick or completion, whichever comes first
    ///
    /// Pending forever while inactive with nothing in flight. Cancel safe.
    pub async fn next_event(&mut self) -> CaptureEvent {
        tokio::select! {
            biased;
            Some(joined) = self.in_flight.join_next(), if !self.in_flight.is_empty() => {
                self.complete(joined)
            }
            _ = next_tick(&mut self.ticker) => self.launch(),
        }
    }

    fn launch(&mut self) -> CaptureEvent {
        self.stats.ticks += 1;

        if self.stop.is_stopped() || self.in_flight.len() >= self.max_in_flight {
            self.stats.skipped += 1;
            tracing::debug!(in_flight = self.in_flight.len(), "Capture tick skipped");
            return CaptureEvent::Skipped;
        }

        let source = Arc::clone(&self.source);
        let stop = self.stop.clone();
        let exercise = self.exercise;
        self.in_flight.spawn(async move {
            if stop.is_stopped() {
                return Err(TrackerError::SessionClosed);
            }
            source.acquire_for(exercise).await
        });
        self.stats.launched += 1;
        CaptureEvent::Launched
    }

    fn complete(&mut self, joined: Result<TrackerResult<PoseResponse>, JoinError>) -> CaptureEvent {
        if self.stop.is_stopped() {
            self.stats.discarded += 1;
            return CaptureEvent::Discarded;
        }

        match joined {
            Ok(Ok(response)) => {
                self.stats.completed += 1;
                CaptureEvent::Frame(response)
            }
            Ok(Err(e)) => {
                self.stats.failed += 1;
                tracing::warn!(error = %e, exercise = %self.exercise, "Frame acquisition failed, dropping");
                CaptureEvent::Failed(e)
            }
            Err(e) if e.is_cancelled() => {
                self.stats.discarded += 1;
                CaptureEvent::Discarded
            }
            Err(e) => {
                self.stats.failed += 1;
                tracing::warn!(error = %e, exercise = %self.exercise, "Frame acquisition task panicked");
                CaptureEvent::Failed(TrackerError::Acquisition(e.to_string()))
            }
        }
    }
}

/// Fixed-period counter for workout time
#[derive(Debug)]
pub struct ElapsedTimer {
    period: Duration,
    ticker: Option<Interval>,
}

impl ElapsedTimer {
    pub fn new(period: Duration) -> Self {
        ElapsedTimer {
            period,
            ticker: None,
        }
    }

    /// Start counting; the first tick fires one full period from now
    pub fn activate(&mut self) {
        if self.ticker.is_none() {
            self.ticker = Some(interval_at(Instant::now() + self.period, self.period));
        }
    }

    pub fn deactivate(&mut self) {
        self.ticker = None;
    }

    pub fn is_active(&self) -> bool {
        self.ticker.is_some()
    }

    /// Next tick; pending forever while inactive
    pub async fn tick(&mut self) {
        next_tick(&mut self.ticker).await
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}
