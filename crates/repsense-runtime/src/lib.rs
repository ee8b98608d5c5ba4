//! RepSense Runtime - Live session orchestration
//!
//! One Tokio task per session drives the loop:
//! 1. Capture tick (300 ms) launches a frame acquisition
//! 2. Completed acquisitions run through the frame pipeline in arrival order
//! 3. Rep events advance the session orchestrator
//! 4. Elapsed tick (1 s) accrues workout time while Running
//! 5. User commands arrive over a channel; snapshots leave over a watch
//!
//! Timers run only while the session is Running and are released on every
//! exit path of the task.

pub mod clock;
pub mod collaborator;
pub mod config;
pub mod pipeline;
pub mod scheduler;
pub mod session;
pub mod telemetry;

pub use clock::*;
pub use collaborator::*;
pub use config::*;
pub use pipeline::*;
pub use scheduler::*;
pub use session::*;
