//! playbox: session orchestration for a multi-version PHP code playground
//!
//! One shared editor feeds any number of output panels. Each panel owns an
//! interpreter session bound to a version, and all sessions share a cache so a
//! version's module is fetched once no matter how many panels want it.
//!
//! # Architecture
//!
//! ## Timing ([`timing`])
//! - [`timing::timer`]: Monotonic start/stop timer with formatted elapsed time
//!
//! ## Interpreter Runtime ([`runtime`])
//! - [`runtime::version`]: Version labels and newest-first ordering
//! - [`runtime::module`]: Module artifacts, factories and the output-sink boundary
//! - [`runtime::cache`]: Fetch deduplication shared across sessions
//! - [`runtime::fetch`]: Directory, executable and HTTP module fetchers
//! - [`runtime::process`]: Interpreter backed by a local `php` executable
//! - [`runtime::session`]: Version-bound session (load, run, capture, version query)
//!
//! ## Editor ([`editor`])
//! - [`editor::adapter`]: Backend-neutral facade with live backend switching
//! - [`editor::monaco`] / [`editor::codemirror`]: The two widget backends
//! - [`editor::mount`]: The element the editor is mounted on
//! - [`editor::status`]: Cursor and size readouts
//!
//! ## Panels ([`panel`])
//! - [`panel::controller`]: One output panel bound to the shared editor
//! - [`panel::autorun`]: Periodic re-runs
//! - [`panel::registry`]: Panel lifecycle and run-all
//! - [`panel::diagnostics`]: Error-line heuristics over stderr
//! - [`panel::view`]: Rendered panel state
//!
//! ## Examples ([`samples`])
//! - Catalogue, id validation, sources, serving endpoint, local files
//!
//! ## Observability ([`observability`])
//! - [`observability::audit`]: Structured run events
//!
//! ## Configuration ([`config`])
//! - [`config::settings`]: Configuration loading
//! - [`config::validator`]: Configuration checks
//! - [`config::types`]: Shared types and the error taxonomy
//! - [`config::presets`]: Version catalogue

// Timing
pub mod timing;

// Interpreter runtime
pub mod runtime;

// Editor
pub mod editor;

// Panels
pub mod panel;

// Examples
pub mod samples;

// Observability
pub mod observability;

// Configuration
pub mod config;

// CLI entrypoint
pub mod cli;

// Re-export commonly used types for convenience
pub use config::types::*;
