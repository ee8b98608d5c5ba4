//! RepSense Core - Fundamental types and primitives
//!
//! This crate defines the types shared by every RepSense layer:
//! - Time primitives (Timestamp)
//! - Keypoints and pose frames
//! - Exercise identifiers and the profile table
//! - Joint angle evaluation
//! - Stages and repetition events
//! - Error type

pub mod angle;
pub mod error;
pub mod event;
pub mod exercise;
pub mod keypoint;
pub mod time;

pub use angle::*;
pub use error::*;
pub use event::*;
pub use exercise::*;
pub use keypoint::*;
pub use time::*;
