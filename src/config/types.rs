/// Core types and error taxonomy for the playbox system
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Smallest editor font size accepted by any backend
pub const MIN_FONT_SIZE: u8 = 10;
/// Largest editor font size accepted by any backend
pub const MAX_FONT_SIZE: u8 = 32;
/// Font size used until the user changes it
pub const DEFAULT_FONT_SIZE: u8 = 14;

/// Concrete editor widget family backing an [`crate::editor::EditorAdapter`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Monaco-style widget (1-based positions, option updates, decorations)
    Monaco,
    /// CodeMirror-style widget (0-based positions, wraps a text area)
    #[serde(rename = "codemirror")]
    CodeMirror,
}

impl BackendKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Monaco => "monaco",
            Self::CodeMirror => "codemirror",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = PlaygroundError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monaco" => Ok(Self::Monaco),
            "codemirror" | "code-mirror" | "cm" => Ok(Self::CodeMirror),
            other => Err(PlaygroundError::Config(format!(
                "unknown editor backend: {other}"
            ))),
        }
    }
}

/// Identifier of a panel, unique within one registry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PanelId(pub u32);

impl fmt::Display for PanelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of one successful `execute` call
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Correlates log events of this run
    pub run_id: Uuid,
    /// Captured standard output, chunks joined in arrival order
    pub stdout: String,
    /// Captured standard error, chunks joined in arrival order
    pub stderr: String,
    /// Version reported by the loaded module itself
    pub version: String,
    /// Wall time of the run entry point call
    pub elapsed: Duration,
    /// Human readable form of `elapsed`
    pub elapsed_display: String,
}

/// Line-scoped error highlight placed into the editor
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMarker {
    /// 1-based line number
    pub line: u32,
    pub message: String,
}

/// Error types for playbox
#[derive(Error, Debug)]
pub enum PlaygroundError {
    #[error("Invalid interpreter version: {0}")]
    InvalidVersion(String),

    #[error("Failed to load interpreter {version}: {message}")]
    Load { version: String, message: String },

    #[error("Interpreter execution failed: {0}")]
    Execution(String),

    #[error("Failed to switch editor to {backend}: {message}")]
    AdapterSwitch { backend: BackendKind, message: String },

    #[error("Invalid time value provided: {0}")]
    InvalidTime(f64),

    #[error("Panel {0} not found")]
    PanelNotFound(PanelId),

    #[error("Example error: {0}")]
    Sample(String),

    #[error("Example not found: {0}")]
    SampleNotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl PlaygroundError {
    pub fn load(version: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Load {
            version: version.into(),
            message: message.to_string(),
        }
    }

    /// Whether re-triggering the same run can succeed without user changes
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Load { .. } | Self::Execution(_) | Self::Http(_))
    }
}

pub type Result<T> = std::result::Result<T, PlaygroundError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_kind_parses_both_spellings() {
        assert_eq!("monaco".parse::<BackendKind>().unwrap(), BackendKind::Monaco);
        assert_eq!(
            " CodeMirror ".parse::<BackendKind>().unwrap(),
            BackendKind::CodeMirror
        );
        assert!("ace".parse::<BackendKind>().is_err());
    }

    #[test]
    fn backend_kind_serializes_lowercase() {
        let json = serde_json::to_string(&BackendKind::CodeMirror).unwrap();
        assert_eq!(json, "\"codemirror\"");
    }

    #[test]
    fn load_errors_are_retryable_but_version_errors_are_not() {
        assert!(PlaygroundError::load("8.4.3", "404").is_retryable());
        assert!(!PlaygroundError::InvalidVersion("none selected".into()).is_retryable());
    }
}
