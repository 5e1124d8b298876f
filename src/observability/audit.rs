/// Run event logging for playbox
/// Structured, uuid-correlated records of module loads, runs, panel changes and editor switches
///
/// Every event goes to the standard logger. When an audit trail is initialized the
/// same record is also appended to it as one JSON line.
use crate::config::types::{PanelId, PlaygroundError, Result};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock, PoisonError};
use std::time::{Duration, SystemTime};
use uuid::Uuid;

/// Types of events we track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunEventKind {
    ModuleFetched,
    ModuleLoaded,
    RunStarted,
    RunCompleted,
    RunFailed,
    BackendSwitched,
    BackendFallback,
    PanelAdded,
    PanelRemoved,
}

impl RunEventKind {
    fn is_failure(self) -> bool {
        matches!(self, Self::RunFailed | Self::BackendFallback)
    }
}

/// Single event record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunEvent {
    pub kind: RunEventKind,
    pub timestamp: SystemTime,
    pub run_id: Option<Uuid>,
    pub panel: Option<PanelId>,
    pub version: Option<String>,
    pub elapsed_ms: Option<f64>,
    pub detail: Option<String>,
}

impl RunEvent {
    pub fn new(kind: RunEventKind) -> Self {
        Self {
            kind,
            timestamp: SystemTime::now(),
            run_id: None,
            panel: None,
            version: None,
            elapsed_ms: None,
            detail: None,
        }
    }

    pub fn run_id(mut self, run_id: Uuid) -> Self {
        self.run_id = Some(run_id);
        self
    }

    pub fn panel(mut self, panel: PanelId) -> Self {
        self.panel = Some(panel);
        self
    }

    pub fn version(mut self, version: &str) -> Self {
        self.version = Some(version.to_string());
        self
    }

    pub fn elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed_ms = Some(elapsed.as_secs_f64() * 1000.0);
        self
    }

    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// One-line JSON form written to the audit trail
    pub fn to_json_line(&self) -> String {
        let mut entry = serde_json::json!({
            "timestamp": self.timestamp
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis() as u64,
            "event": self.kind,
        });
        if let Some(run_id) = &self.run_id {
            entry["run_id"] = serde_json::json!(run_id);
        }
        if let Some(panel) = self.panel {
            entry["panel"] = serde_json::json!(panel.0);
        }
        if let Some(version) = &self.version {
            entry["version"] = serde_json::json!(version);
        }
        if let Some(elapsed_ms) = self.elapsed_ms {
            entry["elapsed_ms"] = serde_json::json!(elapsed_ms);
        }
        if let Some(detail) = &self.detail {
            entry["detail"] = serde_json::json!(detail);
        }
        entry.to_string()
    }
}

/// Append-only JSON lines file
pub struct AuditTrail {
    file: Mutex<File>,
    path: PathBuf,
}

impl AuditTrail {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                PlaygroundError::Config(format!("Failed to create audit log directory: {}", e))
            })?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| PlaygroundError::Config(format!("Failed to open audit log: {}", e)))?;
        Ok(Self {
            file: Mutex::new(file),
            path,
        })
    }

    pub fn record(&self, event: &RunEvent) {
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = writeln!(file, "{}", event.to_json_line()) {
            error!("Failed to write to audit log: {}", e);
        }
        if let Err(e) = file.flush() {
            error!("Failed to flush audit log: {}", e);
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

static AUDIT_TRAIL: OnceLock<AuditTrail> = OnceLock::new();

/// Start mirroring events into `path`. Later calls are ignored.
pub fn init_audit_trail(path: impl Into<PathBuf>) -> Result<()> {
    let trail = AuditTrail::open(path)?;
    let path = trail.path().display().to_string();
    if AUDIT_TRAIL.set(trail).is_err() {
        warn!("Audit trail already initialized");
    } else {
        info!("Audit trail at {}", path);
    }
    Ok(())
}

/// Log `event`, and append it to the audit trail if one is open
pub fn emit(event: RunEvent) {
    let line = event.to_json_line();
    if event.kind.is_failure() {
        warn!("AUDIT {}", line);
    } else {
        info!("AUDIT {}", line);
    }
    if let Some(trail) = AUDIT_TRAIL.get() {
        trail.record(&event);
    }
}
