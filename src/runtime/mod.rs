//! Interpreter runtime
//!
//! Version labels, the module boundary, the shared module cache and the
//! per-panel interpreter session.

pub mod cache;
pub mod fetch;
pub mod mock;
pub mod module;
pub mod process;
pub mod session;
pub mod version;

pub use cache::ModuleCache;
pub use fetch::{ExecutableResolver, FileModuleFetcher, HttpModuleFetcher};
pub use module::{InterpreterModule, ModuleArtifact, ModuleFactory, ModuleFetcher, OutputSinks};
pub use process::ProcessModuleFactory;
pub use session::InterpreterSession;
pub use version::InterpreterVersion;
