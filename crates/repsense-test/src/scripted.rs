//! Scripted collaborators
//!
//! Deterministic stand-ins for the camera/pose service and the report
//! service. Both are cheap to clone; clones share the script and the call
//! log, so a test can keep one copy after handing the other to a session.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use repsense_core::{ExerciseId, PoseFrame, TrackerError, TrackerResult};
use repsense_runtime::{FrameSource, PoseResponse, ReportGenerator};
use repsense_session::{ReportLocator, ReportRequest};

/// One scripted acquisition
#[derive(Clone, Debug, PartialEq)]
pub enum ScriptedStep {
    Respond(PoseResponse),
    /// Respond after the given delay
    Delayed(Duration, PoseResponse),
    Fail(String),
}

impl ScriptedStep {
    pub fn pose(frame: PoseFrame) -> Self {
        ScriptedStep::Respond(PoseResponse::new(frame))
    }

    pub fn scored(frame: PoseFrame, form_score: f64) -> Self {
        ScriptedStep::Respond(PoseResponse::new(frame).with_form_score(form_score))
    }

    pub fn fail(reason: impl Into<String>) -> Self {
        ScriptedStep::Fail(reason.into())
    }
}

#[derive(Default)]
struct Script {
    steps: VecDeque<ScriptedStep>,
    /// Replayed from the start when the queue runs dry
    cycle: Option<Vec<ScriptedStep>>,
    requests: Vec<ExerciseId>,
}

/// Frame source replaying a fixed script
///
/// Once the script is exhausted every acquisition returns an empty frame,
/// unless the source loops.
#[derive(Clone, Default)]
pub struct ScriptedFrameSource {
    script: Arc<Mutex<Script>>,
}

impl ScriptedFrameSource {
    pub fn new<I>(steps: I) -> Self
    where
        I: IntoIterator<Item = ScriptedStep>,
    {
        let source = Self::default();
        source.script.lock().steps.extend(steps);
        source
    }

    /// Replay `steps` forever
    pub fn looping(steps: Vec<ScriptedStep>) -> Self {
        let source = Self::new(steps.clone());
        source.script.lock().cycle = Some(steps);
        source
    }

    /// Append steps to the script
    pub fn push(&self, step: ScriptedStep) {
        self.script.lock().steps.push_back(step);
    }

    /// Acquisitions started so far
    pub fn calls(&self) -> usize {
        self.script.lock().requests.len()
    }

    pub fn requests(&self) -> Vec<ExerciseId> {
        self.script.lock().requests.clone()
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().steps.len()
    }

    fn next_step(&self, exercise: ExerciseId) -> ScriptedStep {
        let mut script = self.script.lock();
        script.requests.push(exercise);

        if script.steps.is_empty() {
            if let Some(cycle) = script.cycle.clone() {
                script.steps.extend(cycle);
            }
        }
        script
            .steps
            .pop_front()
            .unwrap_or_else(|| ScriptedStep::Respond(PoseResponse::default()))
    }
}

impl FrameSource for ScriptedFrameSource {
    async fn acquire_for(&self, exercise: ExerciseId) -> TrackerResult<PoseResponse> {
        let step = self.next_step(exercise);
        match step {
            ScriptedStep::Respond(response) => Ok(response),
            ScriptedStep::Delayed(delay, response) => {
                tokio::time::sleep(delay).await;
                Ok(response)
            }
            ScriptedStep::Fail(reason) => Err(TrackerError::Acquisition(reason)),
        }
    }
}

#[derive(Default)]
struct ReportLog {
    failures_left: usize,
    requests: Vec<ReportRequest>,
    issued: Vec<ReportLocator>,
}

/// Report generator that records every request
#[derive(Clone, Default)]
pub struct RecordingReportGenerator {
    log: Arc<Mutex<ReportLog>>,
}

impl RecordingReportGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the first `failures` calls
    pub fn failing(failures: usize) -> Self {
        let generator = Self::default();
        generator.log.lock().failures_left = failures;
        generator
    }

    pub fn requests(&self) -> Vec<ReportRequest> {
        self.log.lock().requests.clone()
    }

    pub fn issued(&self) -> Vec<ReportLocator> {
        self.log.lock().issued.clone()
    }

    fn record(&self, request: ReportRequest) -> TrackerResult<ReportLocator> {
        let mut log = self.log.lock();
        let patient = request.patient_id.clone();
        log.requests.push(request);

        if log.failures_left > 0 {
            log.failures_left -= 1;
            return Err(TrackerError::Report("report service unavailable".into()));
        }

        let locator = ReportLocator(format!("/reports/{}-{}.pdf", patient, log.issued.len() + 1));
        log.issued.push(locator.clone());
        Ok(locator)
    }
}

impl ReportGenerator for RecordingReportGenerator {
    async fn generate(&self, request: ReportRequest) -> TrackerResult<ReportLocator> {
        self.record(request)
    }
}
