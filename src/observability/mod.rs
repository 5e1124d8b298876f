//! Observability
//!
//! Structured audit events for module loads, runs and panel lifecycle.

pub mod audit;
