//! In-memory fetcher and interpreter for tests and benchmarks.
//!
//! Available to integration tests and external test crates.

use crate::config::types::{PlaygroundError, Result};
use crate::runtime::module::{
    ArtifactPayload, InterpreterModule, ModuleArtifact, ModuleFactory, ModuleFault,
    ModuleFetcher, OutputSinks, Value, ValueKind, EXEC_ENTRY, RUN_ENTRY, SCRIPT_ESCAPE,
    VERSION_QUERY,
};
use futures::future::{BoxFuture, FutureExt};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Fetcher that counts requests per version and can be told to fail.
#[derive(Default)]
pub struct MockFetcher {
    delay: Option<Duration>,
    failing: Mutex<HashSet<String>>,
    fetches: Arc<Mutex<HashMap<String, usize>>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Suspend every fetch for `delay` before resolving
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Answer fetches of `version` with a load failure
    pub fn failing(self, version: &str) -> Self {
        locked(&self.failing).insert(version.to_string());
        self
    }

    /// Let `version` load again after `failing`
    pub fn recover(&self, version: &str) {
        locked(&self.failing).remove(version);
    }

    pub fn fetch_count(&self, version: &str) -> usize {
        locked(&self.fetches).get(version).copied().unwrap_or(0)
    }

    pub fn total_fetches(&self) -> usize {
        locked(&self.fetches).values().sum()
    }
}

impl ModuleFetcher for MockFetcher {
    fn fetch(&self, version: &str) -> BoxFuture<'static, Result<ModuleArtifact>> {
        *locked(&self.fetches).entry(version.to_string()).or_insert(0) += 1;
        let fails = locked(&self.failing).contains(version);
        let delay = self.delay;
        let version = version.to_string();

        async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            if fails {
                return Err(PlaygroundError::load(&version, "Failed to fetch module: 404 Not Found"));
            }
            Ok(ModuleArtifact {
                location: format!("mock://php-{version}"),
                payload: ArtifactPayload::Bytes(version.as_bytes().to_vec()),
                version,
            })
        }
        .boxed()
    }
}

/// What the mock interpreter does with a script, after the escape prefix is removed.
pub type ScriptBehavior =
    Arc<dyn Fn(&str, &OutputSinks) -> std::result::Result<(), ModuleFault> + Send + Sync>;

/// Default behavior: every line of the form `echo <text>;` prints `<text>`,
/// `error <text>;` writes `<text>` to stderr, and `throw <text>;` faults.
pub fn echo_behavior() -> ScriptBehavior {
    Arc::new(|script, sinks| {
        for line in script.lines().map(str::trim) {
            let statement = line.trim_end_matches(';');
            if let Some(text) = statement.strip_prefix("echo ") {
                (sinks.stdout)(text.trim_matches('\''));
            } else if let Some(text) = statement.strip_prefix("error ") {
                (sinks.stderr)(text.trim_matches('\''));
            } else if let Some(text) = statement.strip_prefix("throw ") {
                return Err(ModuleFault(text.trim_matches('\'').to_string()));
            }
        }
        Ok(())
    })
}

#[derive(Default)]
struct FactoryLog {
    instantiations: Vec<String>,
    scripts: Vec<String>,
}

/// Factory of scripted interpreters that records every instantiation and run.
pub struct MockModuleFactory {
    behavior: ScriptBehavior,
    reported_versions: Mutex<HashMap<String, String>>,
    log: Arc<Mutex<FactoryLog>>,
}

impl Default for MockModuleFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl MockModuleFactory {
    pub fn new() -> Self {
        Self {
            behavior: echo_behavior(),
            reported_versions: Mutex::new(HashMap::new()),
            log: Arc::new(Mutex::new(FactoryLog::default())),
        }
    }

    pub fn with_behavior(mut self, behavior: ScriptBehavior) -> Self {
        self.behavior = behavior;
        self
    }

    /// Make the module loaded for `requested` report `reported` as its version
    pub fn reporting(self, requested: &str, reported: &str) -> Self {
        locked(&self.reported_versions).insert(requested.to_string(), reported.to_string());
        self
    }

    pub fn instantiations(&self) -> Vec<String> {
        locked(&self.log).instantiations.clone()
    }

    pub fn instantiation_count(&self, version: &str) -> usize {
        locked(&self.log)
            .instantiations
            .iter()
            .filter(|v| *v == version)
            .count()
    }

    /// Scripts received by the run entry point, escape prefix included
    pub fn scripts(&self) -> Vec<String> {
        locked(&self.log).scripts.clone()
    }

    pub fn run_count(&self) -> usize {
        locked(&self.log).scripts.len()
    }
}

impl ModuleFactory for MockModuleFactory {
    fn instantiate(
        &self,
        artifact: Arc<ModuleArtifact>,
        sinks: OutputSinks,
    ) -> BoxFuture<'static, Result<Box<dyn InterpreterModule>>> {
        locked(&self.log).instantiations.push(artifact.version.clone());
        let reported = locked(&self.reported_versions)
            .get(&artifact.version)
            .cloned()
            .unwrap_or_else(|| artifact.version.clone());
        let module = MockModule {
            reported,
            sinks,
            behavior: Arc::clone(&self.behavior),
            log: Arc::clone(&self.log),
        };
        async move { Ok(Box::new(module) as Box<dyn InterpreterModule>) }.boxed()
    }
}

struct MockModule {
    reported: String,
    sinks: OutputSinks,
    behavior: ScriptBehavior,
    log: Arc<Mutex<FactoryLog>>,
}

impl InterpreterModule for MockModule {
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
            EXEC_ENTRY if source == VERSION_QUERY => Ok(Value::String(self.reported.clone())),
            EXEC_ENTRY => Ok(Value::Null),
            RUN_ENTRY => {
                locked(&self.log).scripts.push(source.to_string());
                let script = source.strip_prefix(SCRIPT_ESCAPE).unwrap_or(source);
                (self.behavior)(script, &self.sinks)?;
                Ok(Value::Null)
            }
            other => Err(ModuleFault(format!("unknown entry point: {other}"))),
        }
    }
}
