//! Interpreter module backed by a native `php` executable.
//!
//! Each call spawns the executable once; output is split into lines and fed to the
//! sinks the same way a line-buffered embedded module would print them.

use crate::config::types::{PlaygroundError, Result};
use crate::runtime::module::{
    ArtifactPayload, InterpreterModule, ModuleArtifact, ModuleFactory, ModuleFault, OutputSinks,
    Value, ValueKind, EXEC_ENTRY, RUN_ENTRY,
};
use futures::future::{BoxFuture, FutureExt};
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};
use std::sync::Arc;

/// Flags passed before every script
const BASE_ARGS: &[&str] = &["-d", "display_errors=stderr", "-d", "html_errors=0"];

#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessModuleFactory;

impl ProcessModuleFactory {
    pub fn new() -> Self {
        Self
    }
}

impl ModuleFactory for ProcessModuleFactory {
    fn instantiate(
        &self,
        artifact: Arc<ModuleArtifact>,
        sinks: OutputSinks,
    ) -> BoxFuture<'static, Result<Box<dyn InterpreterModule>>> {
        let outcome = match &artifact.payload {
            ArtifactPayload::Executable(path) => Ok(Box::new(ProcessModule {
                executable: path.clone(),
                sinks,
            }) as Box<dyn InterpreterModule>),
            ArtifactPayload::Bytes(_) => Err(PlaygroundError::load(
                &artifact.version,
                format!("malformed module at {}: expected an executable", artifact.location),
            )),
        };
        async move { outcome }.boxed()
    }
}

pub struct ProcessModule {
    executable: PathBuf,
    sinks: OutputSinks,
}

impl ProcessModule {
    fn spawn(&self, code: &str) -> std::result::Result<Output, ModuleFault> {
        Command::new(&self.executable)
            .args(BASE_ARGS)
            .arg("-r")
            .arg(code)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| ModuleFault(format!("{}: {}", self.executable.display(), e)))
    }

    fn forward(&self, output: &Output) {
        for line in String::from_utf8_lossy(&output.stdout).lines() {
            (self.sinks.stdout)(line);
        }
        for line in String::from_utf8_lossy(&output.stderr).lines() {
            (self.sinks.stderr)(line);
        }
    }
}

impl InterpreterModule for ProcessModule {
    fn exec(
        &mut self,
        _kind: ValueKind,
        name: &str,
        _arg_types: &[ValueKind],
        args: &[Value],
    ) -> std::result::Result<Value, ModuleFault> {
        let source = match args.first() {
            Some(Value::String(source)) => source.as_str(),
            _ => return Err(ModuleFault(format!("{name}: expected a string argument"))),
        };

        match name {
            EXEC_ENTRY => {
                let expression = source.trim().trim_end_matches(';');
                let output = self.spawn(&format!("echo ({expression});"))?;
                if !output.status.success() {
                    return Err(ModuleFault(
                        String::from_utf8_lossy(&output.stderr).trim().to_string(),
                    ));
                }
                Ok(Value::String(
                    String::from_utf8_lossy(&output.stdout).trim().to_string(),
                ))
            }
            RUN_ENTRY => {
                let output = self.spawn(source)?;
                self.forward(&output);
                Ok(Value::Null)
            }
            other => Err(ModuleFault(format!("unknown entry point: {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn discard() -> OutputSinks {
        OutputSinks {
            stdout: Arc::new(|_: &str| {}),
            stderr: Arc::new(|_: &str| {}),
        }
    }

    #[tokio::test]
    async fn byte_payloads_are_rejected() {
        let artifact = Arc::new(ModuleArtifact {
            version: "8.4.3".to_string(),
            location: "assets/wasm/php-8.4.3-web.wasm".to_string(),
            payload: ArtifactPayload::Bytes(vec![0, 97, 115, 109]),
        });

        let result = ProcessModuleFactory::new().instantiate(artifact, discard()).await;
        assert!(matches!(result, Err(PlaygroundError::Load { .. })));
    }

    #[test]
    fn missing_executable_faults() {
        let mut module = ProcessModule {
            executable: PathBuf::from("/nonexistent/php-0.0.0"),
            sinks: discard(),
        };
        let result = module.exec(
            ValueKind::Null,
            RUN_ENTRY,
            &[ValueKind::String],
            &[Value::String("?>hi".to_string())],
        );
        assert!(result.is_err());
    }

    #[test]
    fn forward_splits_lines_per_channel() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let module = ProcessModule {
            executable: PathBuf::from("php"),
            sinks: OutputSinks {
                stdout: Arc::new(move |line: &str| sink.lock().unwrap().push(line.to_string())),
                stderr: Arc::new(|_: &str| {}),
            },
        };

        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            module.forward(&Output {
                status: std::process::ExitStatus::from_raw(0),
                stdout: b"one\ntwo\n".to_vec(),
                stderr: Vec::new(),
            });
            assert_eq!(*seen.lock().unwrap(), ["one", "two"]);
        }
    }
}
