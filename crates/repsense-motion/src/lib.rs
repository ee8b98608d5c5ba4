//! RepSense Motion - Per-frame motion analysis
//!
//! This crate implements the frame-level engines:
//! - Repetition state machine (stage tracking, hysteresis, debounce)
//! - Liveness monitor (subject present / idle)
//! - Form score aggregation
//! - Offline recording analysis
//!
//! Every engine is a plain value advanced by explicit calls carrying the
//! frame and its timestamp; nothing here reads a clock.

pub mod form;
pub mod liveness;
pub mod recording;
pub mod rep;

pub use form::*;
pub use liveness::*;
pub use recording::*;
pub use rep::*;
