//! Configuration and shared types
//!
//! Error taxonomy, configuration file, validation, and the version catalog.

pub mod presets;
pub mod settings;
pub mod types;
pub mod validator;
