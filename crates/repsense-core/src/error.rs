//! Error types for RepSense

use thiserror::Error;

/// Core RepSense errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrackerError {
    // Configuration errors
    #[error("Unknown exercise: {0}")]
    UnknownExercise(String),

    #[error("Invalid thresholds: upper {upper} must exceed lower {lower}, both within [0, 180]")]
    InvalidThresholds { upper: f64, lower: f64 },

    #[error("Invalid session plan: {0}")]
    InvalidPlan(String),

    // Session errors
    #[error("Command {command} not valid while {phase}")]
    InvalidTransition {
        command: &'static str,
        phase: &'static str,
    },

    #[error("Report unavailable: workout not complete")]
    ReportUnavailable,

    #[error("Session closed")]
    SessionClosed,

    // Collaborator errors
    #[error("Frame acquisition failed: {0}")]
    Acquisition(String),

    #[error("Frame decode failed: {0}")]
    Decode(String),

    #[error("Report generation failed: {0}")]
    Report(String),
}

/// Result type for RepSense operations
pub type TrackerResult<T> = Result<T, TrackerError>;
