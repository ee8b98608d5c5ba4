//! Live session - handle plus the task that owns all session state
//!
//! The task runs a select loop over:
//! - control messages from the handle (commands, report bookkeeping)
//! - capture scheduler events (ticks and completed acquisitions)
//! - elapsed-time ticks
//!
//! After every iteration timers are aligned with the phase (active only while
//! Running) and a snapshot is published on a watch channel. Every exit path
//! sets the stop flag and releases both timers and all in-flight work.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use repsense_core::{ExerciseId, ProfileTable, Stage, TrackerError, TrackerResult};
use repsense_session::{
    RepOutcome, ReportLocator, ReportRequest, SessionCommand, SessionOrchestrator, SessionPhase,
    SessionPlan, SessionState,
};

use crate::{
    CaptureEvent, ElapsedTimer, FrameCaptureScheduler, FramePipeline, FrameSource,
    ReportGenerator, RuntimeConfig, SessionClock, StopFlag,
};

/// Control queue depth
const CONTROL_QUEUE: usize = 16;

/// Everything an observer needs to render the session
#[derive(Clone, Debug, PartialEq)]
pub struct SessionSnapshot {
    pub exercise: ExerciseId,
    pub state: SessionState,
    /// Angle of the latest frame, 0 when it could not be evaluated
    pub angle_degrees: f64,
    pub stage: Stage,
    /// Subject currently in view
    pub is_active: bool,
    /// Running mean form score in [0, 1]
    pub form_score: f64,
    pub report: Option<ReportLocator>,
    /// Capture scheduler ticking
    pub capturing: bool,
    pub frames_processed: u64,
    pub frames_dropped: u64,
}

impl SessionSnapshot {
    fn initial(exercise: ExerciseId) -> Self {
        SessionSnapshot {
            exercise,
            state: SessionState::initial(),
            angle_degrees: 0.0,
            stage: Stage::Unknown,
            is_active: false,
            form_score: 0.0,
            report: None,
            capturing: false,
            frames_processed: 0,
            frames_dropped: 0,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.phase
    }
}

enum Control {
    Command {
        command: SessionCommand,
        reply: oneshot::Sender<TrackerResult<SessionPhase>>,
    },
    PrepareReport {
        reply: oneshot::Sender<TrackerResult<(ReportRequest, u64)>>,
    },
    RecordReport {
        locator: ReportLocator,
        /// Workout run the request was prepared for
        run: u64,
        reply: oneshot::Sender<TrackerResult<()>>,
    },
    Dismiss,
}

/// Handle to a running session
///
/// Dropping the handle stops the session task.
pub struct LiveSession<R> {
    control: mpsc::Sender<Control>,
    snapshots: watch::Receiver<SessionSnapshot>,
    reporter: Arc<R>,
    stop: StopFlag,
    task: Option<JoinHandle<()>>,
}

impl<R: ReportGenerator> LiveSession<R> {
    /// Resolve the profile, validate the plan and spawn the session task
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start<S: FrameSource>(
        plan: SessionPlan,
        config: RuntimeConfig,
        table: &ProfileTable,
        source: S,
        reporter: R,
    ) -> TrackerResult<Self> {
        let profile = table.resolve(plan.exercise)?;
        let orchestrator = SessionOrchestrator::new(plan)?;
        let config = config.sanitized();
        let exercise = profile.id;

        tracing::info!(
            %exercise,
            reps_target = orchestrator.plan().reps_target,
            total_sets = orchestrator.plan().total_sets,
            capture = %humantime::format_duration(config.capture_interval),
            "Session started"
        );

        let stop = StopFlag::new();
        let (control_tx, control_rx) = mpsc::channel(CONTROL_QUEUE);
        let (snapshot_tx, snapshot_rx) = watch::channel(SessionSnapshot::initial(exercise));

        let runner = SessionRunner {
            scheduler: FrameCaptureScheduler::new(Arc::new(source), exercise, &config, stop.clone()),
            elapsed: ElapsedTimer::new(config.elapsed_tick),
            pipeline: FramePipeline::new(profile, &config),
            orchestrator,
            clock: SessionClock::start(),
            stop: stop.clone(),
            control: control_rx,
            snapshots: snapshot_tx,
            report: None,
            run: 0,
            angle: None,
            frames_processed: 0,
            frames_dropped: 0,
        };
        let task = tokio::spawn(runner.run());

        Ok(LiveSession {
            control: control_tx,
            snapshots: snapshot_rx,
            reporter: Arc::new(reporter),
            stop,
            task: Some(task),
        })
    }

    /// SetComplete -> Running with the next set
    pub async fn start_next_set(&self) -> TrackerResult<SessionPhase> {
        self.command(SessionCommand::StartNextSet).await
    }

    /// Finish the workout from any phase
    pub async fn end_workout(&self) -> TrackerResult<SessionPhase> {
        self.command(SessionCommand::EndWorkout).await
    }

    /// Reset all counters, elapsed time and any report, then resume capture
    pub async fn repeat_workout(&self) -> TrackerResult<SessionPhase> {
        self.command(SessionCommand::RepeatWorkout).await
    }

    /// Ask the report service for a report of the finished workout
    ///
    /// Only valid in WorkoutComplete. A failure leaves the session untouched
    /// so the call can be retried. A recorded locator is returned as is. A
    /// workout repeated while the service is working gets no locator and the
    /// call fails with `ReportUnavailable`.
    pub async fn generate_report(&self) -> TrackerResult<ReportLocator> {
        let existing = self.snapshots.borrow().report.clone();
        if let Some(locator) = existing {
            return Ok(locator);
        }

        let (request, run) = self.request(|reply| Control::PrepareReport { reply }).await?;
        let locator = match self.reporter.generate(request).await {
            Ok(locator) => locator,
            Err(e) => {
                tracing::warn!(error = %e, "Report generation failed");
                return Err(e);
            }
        };

        self.request(|reply| Control::RecordReport {
            locator: locator.clone(),
            run,
            reply,
        })
        .await?;
        tracing::info!(report = %locator, "Report ready");
        Ok(locator)
    }

    /// Close the session and wait for the task to release its resources
    pub async fn dismiss(mut self) {
        self.stop.stop();
        // The task may already be gone
        let _ = self.control.send(Control::Dismiss).await;
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    tracing::warn!(error = %e, "Session task failed");
                }
            }
        }
    }

    /// Latest published snapshot
    ///
    /// Already reflects every command whose call has returned.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver notified on every snapshot change
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.control.is_closed()
    }

    async fn command(&self, command: SessionCommand) -> TrackerResult<SessionPhase> {
        self.request(|reply| Control::Command { command, reply }).await
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<TrackerResult<T>>) -> Control,
    ) -> TrackerResult<T> {
        let (reply, response) = oneshot::channel();
        self.control
            .send(build(reply))
            .await
            .map_err(|_| TrackerError::SessionClosed)?;
        response.await.map_err(|_| TrackerError::SessionClosed)?
    }
}

impl<R> Drop for LiveSession<R> {
    fn drop(&mut self) {
        self.stop.stop();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Owner of all mutable session state; lives on the session task
struct SessionRunner<S> {
    orchestrator: SessionOrchestrator,
    pipeline: FramePipeline,
    scheduler: FrameCaptureScheduler<S>,
    elapsed: ElapsedTimer,
    clock: SessionClock,
    stop: StopFlag,
    control: mpsc::Receiver<Control>,
    snapshots: watch::Sender<SessionSnapshot>,
    report: Option<ReportLocator>,
    /// Bumped on every repeat
    run: u64,
    angle: Option<f64>,
    /// Per workout run, reset on repeat
    frames_processed: u64,
    frames_dropped: u64,
}

impl<S: FrameSource> SessionRunner<S> {
    async fn run(mut self) {
        self.sync_timers();
        self.publish();

        loop {
            tokio::select! {
                control = self.control.recv() => match control {
                    Some(Control::Dismiss) | None => break,
                    Some(control) => self.handle_control(control),
                },
                event = self.scheduler.next_event() => self.handle_capture(event),
                _ = self.elapsed.tick() => self.handle_second(),
            }

            if self.stop.is_stopped() {
                break;
            }
            self.sync_timers();
            self.publish();
        }

        self.teardown();
    }

    fn handle_control(&mut self, control: Control) {
        if self.stop.is_stopped() {
            reject(control);
            return;
        }

        match control {
            Control::Command { command, reply } => {
                let result = self.orchestrator.apply(command);
                match &result {
                    Ok(phase) => {
                        if command == SessionCommand::RepeatWorkout {
                            self.restart();
                        }
                        tracing::debug!(command = command.as_str(), %phase, "Command applied");
                    }
                    Err(e) => tracing::debug!(command = command.as_str(), error = %e, "Command rejected"),
                }
                self.sync_timers();
                self.publish();
                let _ = reply.send(result);
            }
            Control::PrepareReport { reply } => {
                let request = ReportRequest::from_session(&self.orchestrator, self.pipeline.form_score())
                    .map(|request| (request, self.run));
                let _ = reply.send(request);
            }
            Control::RecordReport { locator, run, reply } => {
                let result = if run == self.run && self.orchestrator.phase() == SessionPhase::WorkoutComplete {
                    self.report = Some(locator);
                    Ok(())
                } else {
                    tracing::debug!(run, current = self.run, "Stale report discarded");
                    Err(TrackerError::ReportUnavailable)
                };
                self.publish();
                let _ = reply.send(result);
            }
            Control::Dismiss => {}
        }
    }

    fn handle_capture(&mut self, event: CaptureEvent) {
        match event {
            CaptureEvent::Frame(response) => {
                if self.stop.is_stopped() || !self.orchestrator.is_running() {
                    self.frames_dropped += 1;
                    return;
                }
                let now = self.clock.now();
                let outcome = self.pipeline.process(&response, now);
                self.frames_processed += 1;
                self.angle = outcome.angle;

                tracing::debug!(
                    at = ?now,
                    angle = outcome.angle.unwrap_or(0.0),
                    stage = %outcome.stage,
                    active = outcome.active,
                    "Frame processed"
                );

                if let Some(rep) = outcome.rep {
                    match self.orchestrator.on_rep(&rep) {
                        RepOutcome::Counted | RepOutcome::Ignored => {}
                        RepOutcome::SetCompleted { set } => {
                            tracing::debug!(set, "Capture paused until next set")
                        }
                        RepOutcome::WorkoutCompleted => {
                            tracing::debug!("Capture stopped, workout complete")
                        }
                    }
                }
            }
            CaptureEvent::Failed(_) | CaptureEvent::Discarded => self.frames_dropped += 1,
            CaptureEvent::Launched | CaptureEvent::Skipped => {}
        }
    }

    fn handle_second(&mut self) {
        if self.stop.is_stopped() {
            return;
        }
        if self.orchestrator.tick_second() {
            tracing::debug!(elapsed = self.orchestrator.state().elapsed_seconds, "Elapsed tick");
        }
    }

    /// Fresh workout run: engines reset, capture and elapsed periods restart
    ///
    /// Acquisitions launched before the repeat are aborted.
    fn restart(&mut self) {
        self.scheduler.deactivate();
        self.elapsed.deactivate();
        self.pipeline.reset();
        self.run += 1;
        self.report = None;
        self.angle = None;
        self.frames_processed = 0;
        self.frames_dropped = 0;
    }

    /// Timers run only while Running
    fn sync_timers(&mut self) {
        if self.orchestrator.is_running() && !self.stop.is_stopped() {
            self.scheduler.activate();
            self.elapsed.activate();
        } else {
            self.scheduler.deactivate();
            self.elapsed.deactivate();
        }
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            exercise: self.pipeline.profile().id,
            state: self.orchestrator.state(),
            angle_degrees: self.angle.unwrap_or(0.0),
            stage: self.pipeline.stage(),
            is_active: self.pipeline.is_active(),
            form_score: self.pipeline.form_score(),
            report: self.report.clone(),
            capturing: self.scheduler.is_active(),
            frames_processed: self.frames_processed,
            frames_dropped: self.frames_dropped,
        }
    }

    fn publish(&self) {
        let next = self.snapshot();
        self.snapshots.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }

    fn teardown(&mut self) {
        self.stop.stop();
        self.scheduler.deactivate();
        self.elapsed.deactivate();
        self.publish();

        let stats = self.scheduler.stats();
        tracing::info!(
            phase = %self.orchestrator.phase(),
            total_reps = self.orchestrator.state().total_reps,
            frames = self.frames_processed,
            failed = stats.failed,
            "Session closed"
        );
    }
}

fn reject(control: Control) {
    match control {
        Control::Command { reply, .. } => {
            let _ = reply.send(Err(TrackerError::SessionClosed));
        }
        Control::PrepareReport { reply } => {
            let _ = reply.send(Err(TrackerError::SessionClosed));
        }
        Control::RecordReport { reply, .. } => {
            let _ = reply.send(Err(TrackerError::SessionClosed));
        }
        Control::Dismiss => {}
    }
}
