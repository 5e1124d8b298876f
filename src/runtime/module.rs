use crate::config::types::Result;
use futures::future::BoxFuture;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Entry point evaluating an expression and returning its string value.
pub const EXEC_ENTRY: &str = "phpw_exec";
/// Entry point running a script for its output only.
pub const RUN_ENTRY: &str = "phpw_run";
/// Expression answering the interpreter's own version.
pub const VERSION_QUERY: &str = "phpversion();";
/// Leaves literal-text mode so untagged source runs as statements.
pub const SCRIPT_ESCAPE: &str = "?>";

/// Argument/return type tags of the module call interface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueKind {
    Null,
    Number,
    String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Number(f64),
    String(String),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Null => ValueKind::Null,
            Self::Number(_) => ValueKind::Number,
            Self::String(_) => ValueKind::String,
        }
    }

    /// String view of the value; `Null` converts to an empty string
    pub fn into_string(self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Number(n) => n.to_string(),
            Self::String(s) => s,
        }
    }
}

/// Anything the module throws while running
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{0}")]
pub struct ModuleFault(pub String);

/// Receives one captured output chunk
pub type OutputSink = Arc<dyn Fn(&str) + Send + Sync>;

/// Output callbacks handed to a module at instantiation
#[derive(Clone)]
pub struct OutputSinks {
    pub stdout: OutputSink,
    pub stderr: OutputSink,
}

impl fmt::Debug for OutputSinks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputSinks").finish_non_exhaustive()
    }
}

/// Resolved module resource
#[derive(Clone, Debug, PartialEq)]
pub enum ArtifactPayload {
    /// Raw module binary
    Bytes(Vec<u8>),
    /// Interpreter executable launched per call
    Executable(PathBuf),
}

/// Module resource for one version label, shared read-only through the cache
#[derive(Clone, Debug, PartialEq)]
pub struct ModuleArtifact {
    /// Requested label, the cache key
    pub version: String,
    /// Where the artifact was resolved from
    pub location: String,
    pub payload: ArtifactPayload,
}

/// Loaded interpreter instance.
///
/// Not reentrant: callers never issue a second `exec` before the first returns.
pub trait InterpreterModule: Send {
    fn exec(
        &mut self,
        kind: ValueKind,
        name: &str,
        arg_types: &[ValueKind],
        args: &[Value],
    ) -> std::result::Result<Value, ModuleFault>;
}

/// Resolves the module resource of a version label.
pub trait ModuleFetcher: Send + Sync {
    fn fetch(&self, version: &str) -> BoxFuture<'static, Result<ModuleArtifact>>;
}

/// Instantiates a fetched artifact with output sinks attached.
pub trait ModuleFactory: Send + Sync {
    fn instantiate(
        &self,
        artifact: Arc<ModuleArtifact>,
        sinks: OutputSinks,
    ) -> BoxFuture<'static, Result<Box<dyn InterpreterModule>>>;
}
