//! RepSense Session - Workout orchestration
//!
//! This crate implements the session layer:
//! - Session plan (exercise, reps per set, sets, patient) and its validation
//! - Set/rep/workout state machine with elapsed-time accounting
//! - End-of-session report request shape

pub mod orchestrator;
pub mod plan;
pub mod report;

pub use orchestrator::*;
pub use plan::*;
pub use report::*;
