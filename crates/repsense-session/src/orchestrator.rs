//! Session orchestrator - set / rep / workout state machine
//!
//! ```text
//!            rep (set target, more sets)          StartNextSet
//!  Running ─────────────────────────────▶ SetComplete ──────────▶ Running
//!     │  rep (set target, last set)            │
//!     └──────────────────────────┐             │ EndWorkout
//!              EndWorkout (any)   ▼             ▼
//!                          WorkoutComplete ◀────┘
//!  RepeatWorkout (any) ──▶ Running, all counters and elapsed time reset
//! ```
//!
//! INVARIANT: reps_in_set <= reps_target, current_set <= total_sets,
//! total_reps == sum of reps over completed and current sets.

use serde::{Deserialize, Serialize};

use repsense_core::{RepEvent, TrackerError, TrackerResult};

use crate::SessionPlan;

/// Workout phase
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    #[default]
    Running,
    SetComplete,
    WorkoutComplete,
}

impl SessionPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionPhase::Running => "running",
            SessionPhase::SetComplete => "set_complete",
            SessionPhase::WorkoutComplete => "workout_complete",
        }
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counters owned by the orchestrator
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub current_set: u32,
    pub reps_in_set: u32,
    pub total_reps: u32,
    pub elapsed_seconds: u64,
    pub phase: SessionPhase,
}

impl SessionState {
    pub fn initial() -> Self {
        SessionState {
            current_set: 1,
            reps_in_set: 0,
            total_reps: 0,
            elapsed_seconds: 0,
            phase: SessionPhase::Running,
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::initial()
    }
}

/// User-issued session commands
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionCommand {
    StartNextSet,
    EndWorkout,
    RepeatWorkout,
}

impl SessionCommand {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionCommand::StartNextSet => "start_next_set",
            SessionCommand::EndWorkout => "end_workout",
            SessionCommand::RepeatWorkout => "repeat_workout",
        }
    }
}

/// What a rep event did to the session
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RepOutcome {
    /// Counted, set still open
    Counted,
    /// Counted and closed the given set
    SetCompleted { set: u32 },
    /// Counted and closed the final set
    WorkoutCompleted,
    /// Arrived outside Running; dropped
    Ignored,
}

/// Set/rep/workout state machine
#[derive(Clone, Debug)]
pub struct SessionOrchestrator {
    plan: SessionPlan,
    state: SessionState,
}

impl SessionOrchestrator {
    /// Start a session; the plan is validated here
    pub fn new(plan: SessionPlan) -> TrackerResult<Self> {
        plan.validate()?;
        Ok(SessionOrchestrator {
            plan,
            state: SessionState::initial(),
        })
    }

    /// Consume one rep event
    pub fn on_rep(&mut self, event: &RepEvent) -> RepOutcome {
        if self.state.phase != SessionPhase::Running {
            tracing::debug!(phase = %self.state.phase, at = ?event.at, "Rep ignored");
            return RepOutcome::Ignored;
        }

        self.state.reps_in_set += 1;
        self.state.total_reps += 1;

        if self.state.reps_in_set < self.plan.reps_target {
            return RepOutcome::Counted;
        }

        if self.state.current_set >= self.plan.total_sets {
            self.state.phase = SessionPhase::WorkoutComplete;
            tracing::info!(total_reps = self.state.total_reps, "Workout complete");
            RepOutcome::WorkoutCompleted
        } else {
            self.state.phase = SessionPhase::SetComplete;
            tracing::info!(set = self.state.current_set, "Set complete");
            RepOutcome::SetCompleted {
                set: self.state.current_set,
            }
        }
    }

    /// Apply a user command
    pub fn apply(&mut self, command: SessionCommand) -> TrackerResult<SessionPhase> {
        match command {
            SessionCommand::StartNextSet => self.start_next_set()?,
            SessionCommand::EndWorkout => self.end_workout(),
            SessionCommand::RepeatWorkout => self.repeat_workout(),
        }
        Ok(self.state.phase)
    }

    /// SetComplete -> Running with the next set
    pub fn start_next_set(&mut self) -> TrackerResult<()> {
        if self.state.phase != SessionPhase::SetComplete {
            return Err(TrackerError::InvalidTransition {
                command: SessionCommand::StartNextSet.as_str(),
                phase: self.state.phase.as_str(),
            });
        }
        self.state.current_set += 1;
        self.state.reps_in_set = 0;
        self.state.phase = SessionPhase::Running;
        tracing::info!(set = self.state.current_set, "Set started");
        Ok(())
    }

    /// Any phase -> WorkoutComplete
    pub fn end_workout(&mut self) {
        if self.state.phase != SessionPhase::WorkoutComplete {
            tracing::info!(total_reps = self.state.total_reps, "Workout ended early");
        }
        self.state.phase = SessionPhase::WorkoutComplete;
    }

    /// Any phase -> fresh Running session
    pub fn repeat_workout(&mut self) {
        self.state = SessionState::initial();
        tracing::info!(exercise = %self.plan.exercise, "Workout restarted");
    }

    /// One second of wall time; counted only while Running
    pub fn tick_second(&mut self) -> bool {
        if self.state.phase == SessionPhase::Running {
            self.state.elapsed_seconds += 1;
            true
        } else {
            false
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.phase
    }

    pub fn is_running(&self) -> bool {
        self.state.phase == SessionPhase::Running
    }

    pub fn plan(&self) -> &SessionPlan {
        &self.plan
    }

    /// Elapsed seconds per counted rep, 0 before the first rep
    pub fn avg_secs_per_rep(&self) -> f64 {
        if self.state.total_reps == 0 {
            0.0
        } else {
            self.state.elapsed_seconds as f64 / self.state.total_reps as f64
        }
    }
}
