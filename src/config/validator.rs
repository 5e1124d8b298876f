// Config validation
// Startup validation fails fast with actionable errors; recoverable issues are warnings

use crate::config::settings::{PlaygroundConfig, SampleMode, VERSION_PLACEHOLDER};
use crate::config::types::{PlaygroundError, Result, MAX_FONT_SIZE, MIN_FONT_SIZE};

/// Shortest auto-run interval that does not starve interactive runs
pub const MIN_AUTO_RUN_INTERVAL_MS: u64 = 100;

/// Validation result with detailed errors
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn add_error(&mut self, error: String) {
        self.valid = false;
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

/// Validate config at startup; any error is fatal
pub fn validate_config(config: &PlaygroundConfig) -> Result<ValidationResult> {
    let mut result = ValidationResult::new();

    validate_modules(config, &mut result);
    validate_editor(config, &mut result);
    validate_auto_run(config, &mut result);
    validate_samples(config, &mut result);

    for warning in &result.warnings {
        log::warn!("config: {}", warning);
    }

    if !result.is_valid() {
        return Err(PlaygroundError::Config(format!(
            "Config validation failed:\n{}",
            result.errors.join("\n")
        )));
    }

    Ok(result)
}

fn validate_modules(config: &PlaygroundConfig, result: &mut ValidationResult) {
    if !config.module_template.contains(VERSION_PLACEHOLDER) {
        result.add_error(format!(
            "module_template '{}' must contain {}",
            config.module_template, VERSION_PLACEHOLDER
        ));
    }
    if config.module_template.contains('/') || config.module_template.contains('\\') {
        result.add_error("module_template must be a file name, not a path".to_string());
    }
}

fn validate_editor(config: &PlaygroundConfig, result: &mut ValidationResult) {
    let size = config.editor.font_size;
    if !(MIN_FONT_SIZE..=MAX_FONT_SIZE).contains(&size) {
        result.add_warning(format!(
            "editor.font_size {} outside [{}, {}], will be clamped",
            size, MIN_FONT_SIZE, MAX_FONT_SIZE
        ));
    }
}

fn validate_auto_run(config: &PlaygroundConfig, result: &mut ValidationResult) {
    match config.auto_run_interval_ms {
        Some(0) => result.add_error("auto_run_interval_ms cannot be zero".to_string()),
        Some(ms) if ms < MIN_AUTO_RUN_INTERVAL_MS => result.add_warning(format!(
            "auto_run_interval_ms {} is very low (< {}ms), most ticks will be skipped",
            ms, MIN_AUTO_RUN_INTERVAL_MS
        )),
        _ => {}
    }
}

fn validate_samples(config: &PlaygroundConfig, result: &mut ValidationResult) {
    if let Some(url) = &config.examples_url {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            result.add_error(format!("examples_url '{}' must be an http(s) URL", url));
        }
    } else if config.examples_mode == SampleMode::Dynamic {
        result.add_warning(
            "examples_mode is dynamic but no examples_url is set; reading examples_dir directly"
                .to_string(),
        );
    }
}
