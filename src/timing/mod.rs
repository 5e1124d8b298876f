//! Timing
//!
//! Monotonic wall-time measurement used around interpreter runs.

pub mod timer;

pub use timer::{format_duration, format_time, Checkpoint, Timer, TimerReport};
