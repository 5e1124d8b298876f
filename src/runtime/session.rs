//! Interpreter session: one loaded module plus its captured output.

use crate::config::types::{ExecutionResult, PlaygroundError, Result};
use crate::observability::audit::{self, RunEvent, RunEventKind};
use crate::runtime::cache::ModuleCache;
use crate::runtime::module::{
    InterpreterModule, ModuleFactory, OutputSink, OutputSinks, Value, ValueKind, EXEC_ENTRY,
    RUN_ENTRY, SCRIPT_ESCAPE, VERSION_QUERY,
};
use crate::timing::{format_duration, Timer};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// Ordered output chunks of both channels
#[derive(Debug, Default)]
struct StreamBuffers {
    stdout: Vec<String>,
    stderr: Vec<String>,
}

impl StreamBuffers {
    fn clear(&mut self) {
        self.stdout.clear();
        self.stderr.clear();
    }
}

#[derive(Clone, Copy)]
enum Channel {
    Stdout,
    Stderr,
}

/// Separator-joined append: chunks after the first are preceded by a newline
fn push_chunk(buffer: &mut Vec<String>, chunk: &str) {
    if chunk.is_empty() {
        return;
    }
    if !buffer.is_empty() {
        buffer.push("\n".to_string());
    }
    buffer.push(chunk.to_string());
}

struct LoadedModule {
    requested: String,
    reported: String,
    module: Box<dyn InterpreterModule>,
}

pub struct InterpreterSession {
    cache: Arc<ModuleCache>,
    factory: Arc<dyn ModuleFactory>,
    buffers: Arc<Mutex<StreamBuffers>>,
    loaded: Option<LoadedModule>,
}

impl InterpreterSession {
    pub fn new(cache: Arc<ModuleCache>, factory: Arc<dyn ModuleFactory>) -> Self {
        Self {
            cache,
            factory,
            buffers: Arc::new(Mutex::new(StreamBuffers::default())),
            loaded: None,
        }
    }

    fn buffers(&self) -> MutexGuard<'_, StreamBuffers> {
        self.buffers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn sink(&self, channel: Channel) -> OutputSink {
        let buffers = Arc::clone(&self.buffers);
        Arc::new(move |chunk: &str| {
            let mut buffers = buffers.lock().unwrap_or_else(PoisonError::into_inner);
            match channel {
                Channel::Stdout => push_chunk(&mut buffers.stdout, chunk),
                Channel::Stderr => push_chunk(&mut buffers.stderr, chunk),
            }
        })
    }

    /// Load the module for `version` unless it is already the loaded one
    pub async fn ensure_loaded(&mut self, version: &str) -> Result<()> {
        if matches!(&self.loaded, Some(loaded) if loaded.requested == version) {
            return Ok(());
        }

        // the previous module reference goes away even if this load fails
        self.loaded = None;

        let artifact = self.cache.get(version).await?;
        let sinks = OutputSinks {
            stdout: self.sink(Channel::Stdout),
            stderr: self.sink(Channel::Stderr),
        };
        let mut module = self.factory.instantiate(artifact, sinks).await?;

        let reported = module
            .exec(
                ValueKind::String,
                EXEC_ENTRY,
                &[ValueKind::String],
                &[Value::String(VERSION_QUERY.to_string())],
            )
            .map_err(|fault| PlaygroundError::load(version, fault))?
            .into_string();
        let reported = match reported.trim() {
            "" => "unknown".to_string(),
            trimmed => trimmed.to_string(),
        };

        if reported != version {
            log::warn!(
                "Module requested as {} reports version {}",
                version,
                reported
            );
        }
        audit::emit(
            RunEvent::new(RunEventKind::ModuleLoaded)
                .version(version)
                .detail(format!("reported {reported}")),
        );

        self.loaded = Some(LoadedModule {
            requested: version.to_string(),
            reported,
            module,
        });
        Ok(())
    }

    /// Run `code` on `version`, capturing both output channels
    pub async fn execute(&mut self, code: &str, version: &str) -> Result<ExecutionResult> {
        let version = version.trim();
        if version.is_empty() {
            return Err(PlaygroundError::InvalidVersion("no version selected".to_string()));
        }

        self.buffers().clear();
        self.ensure_loaded(version).await?;

        let loaded = self
            .loaded
            .as_mut()
            .ok_or_else(|| PlaygroundError::load(version, "module unavailable after load"))?;
        let run_id = Uuid::new_v4();
        let script = format!("{SCRIPT_ESCAPE}{code}");

        let timer = Timer::start(format!("run {run_id}"));
        let outcome = loaded.module.exec(
            ValueKind::Null,
            RUN_ENTRY,
            &[ValueKind::String],
            &[Value::String(script)],
        );
        let report = timer.stop();

        outcome.map_err(|fault| PlaygroundError::Execution(fault.0))?;

        let reported = loaded.reported.clone();
        let buffers = self.buffers();
        Ok(ExecutionResult {
            run_id,
            stdout: buffers.stdout.concat(),
            stderr: buffers.stderr.concat(),
            version: reported,
            elapsed: report.total_time,
            elapsed_display: format_duration(report.total_time),
        })
    }

    /// Release the module and clear buffers; the shared cache keeps the artifact
    pub fn unload(&mut self) {
        self.buffers().clear();
        if let Some(loaded) = self.loaded.take() {
            log::debug!("Unloaded interpreter module {}", loaded.requested);
        }
    }

    /// Label the loaded module was requested under
    pub fn loaded_version(&self) -> Option<&str> {
        self.loaded.as_ref().map(|l| l.requested.as_str())
    }

    /// Version the loaded module reported about itself
    pub fn reported_version(&self) -> Option<&str> {
        self.loaded.as_ref().map(|l| l.reported.as_str())
    }

    pub fn stdout(&self) -> String {
        self.buffers().stdout.concat()
    }

    pub fn stderr(&self) -> String {
        self.buffers().stderr.concat()
    }
}
