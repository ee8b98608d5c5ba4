//! RepSense Test Harness - Synthetic sessions and end-to-end validation
//!
//! This crate provides:
//! - Synthetic pose generation for a target joint angle
//! - Scripted frame sources and recording report generators
//! - Chaos wrappers (failures, occlusion, latency) around any frame source
//! - End-to-end live session scenarios

pub mod chaos;
pub mod integration;
pub mod scripted;
pub mod synthetic;

pub use chaos::*;
pub use integration::*;
pub use scripted::*;
pub use synthetic::*;
