/// Configuration loading from playbox.json
use crate::config::types::{BackendKind, PlaygroundError, Result, DEFAULT_FONT_SIZE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Placeholder substituted with the version label in module templates
pub const VERSION_PLACEHOLDER: &str = "{version}";

/// How example sources are served
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleMode {
    /// Static file hosting returns the raw `<id>.php` file
    #[default]
    Static,
    /// Dynamic backend validates the identifier through `_get_file`
    Dynamic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    pub backend: BackendKind,
    pub font_size: u8,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            backend: BackendKind::Monaco,
            font_size: DEFAULT_FONT_SIZE,
        }
    }
}

/// Full playbox.json structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaygroundConfig {
    /// Directory (or URL path prefix) holding interpreter modules
    pub module_root: PathBuf,
    /// File name template of one module, must contain `{version}`
    pub module_template: String,
    /// JSON array of available version labels
    pub versions_manifest: PathBuf,
    /// Directory holding example scripts and `examples.json`
    pub examples_dir: PathBuf,
    /// Base URL of a hosted playground, used instead of `examples_dir` when set
    pub examples_url: Option<String>,
    pub examples_mode: SampleMode,
    pub editor: EditorSettings,
    /// Auto-run interval; auto-run is off when unset
    pub auto_run_interval_ms: Option<u64>,
}

impl Default for PlaygroundConfig {
    fn default() -> Self {
        Self {
            module_root: PathBuf::from("assets/wasm"),
            module_template: format!("php-{VERSION_PLACEHOLDER}"),
            versions_manifest: PathBuf::from("assets/wasm/php-versions.json"),
            examples_dir: PathBuf::from("examples"),
            examples_url: None,
            examples_mode: SampleMode::Static,
            editor: EditorSettings::default(),
            auto_run_interval_ms: None,
        }
    }
}

impl PlaygroundConfig {
    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            PlaygroundError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let config: PlaygroundConfig = serde_json::from_str(&content)
            .map_err(|e| PlaygroundError::Config(format!("Failed to parse config JSON: {}", e)))?;

        log::debug!("Loaded playground config from {}", path.display());
        Ok(config)
    }

    /// Load `./playbox.json` when present, defaults otherwise
    pub fn load_default() -> Result<Self> {
        let config_path = std::env::current_dir()?.join("playbox.json");
        if !config_path.exists() {
            log::debug!("playbox.json not found, using built-in defaults");
            return Ok(Self::default());
        }
        Self::load_from_file(config_path)
    }

    pub fn auto_run_interval(&self) -> Option<Duration> {
        self.auto_run_interval_ms.map(Duration::from_millis)
    }
}

/// Substitute the version label into a module template
pub fn render_template(template: &str, version: &str) -> String {
    template.replace(VERSION_PLACEHOLDER, version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: PlaygroundConfig =
            serde_json::from_str(r#"{ "module_root": "/opt/php", "editor": { "backend": "codemirror" } }"#)
                .unwrap();
        assert_eq!(config.module_root, PathBuf::from("/opt/php"));
        assert_eq!(config.module_template, "php-{version}");
        assert_eq!(config.editor.backend, BackendKind::CodeMirror);
        assert_eq!(config.editor.font_size, DEFAULT_FONT_SIZE);
        assert_eq!(config.examples_mode, SampleMode::Static);
    }

    #[test]
    fn auto_run_interval_is_off_unless_configured() {
        assert_eq!(PlaygroundConfig::default().auto_run_interval(), None);
        let config: PlaygroundConfig = serde_json::from_str(r#"{ "auto_run_interval_ms": 1500 }"#).unwrap();
        assert_eq!(config.auto_run_interval(), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn load_from_file_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("playbox.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = PlaygroundConfig::load_from_file(&path).unwrap_err();
        assert!(matches!(err, PlaygroundError::Config(_)));
    }
}
