//! Example scripts
//!
//! Catalogue, identifier validation, fetching from a directory or a hosted
//! playground, the plain-text serving endpoint, and local file load/save.

pub mod catalog;
pub mod files;
pub mod server;
pub mod source;
pub mod validate;

pub use catalog::{SampleCatalog, SampleEntry};
pub use source::{reset_content, source_from_config, DirSampleSource, HttpSampleSource, SampleSource};
pub use validate::validate_sample_id;
