/// Example identifier validation
///
/// An identifier is a bare file stem: no directory parts, no parent references,
/// no extension. It must also name a script that actually exists.
use crate::config::types::{PlaygroundError, Result};
use std::collections::BTreeSet;
use std::path::Path;

/// Extension of example scripts
pub const SAMPLE_EXTENSION: &str = "php";

/// Files in the examples directory that are never served as examples
const RESERVED_FILES: &[&str] = &["_get_file.php", "examples.json"];

/// Check the shape of `id` without touching the file system
pub fn validate_sample_id(id: &str) -> Result<&str> {
    let id = id.trim();
    if id.is_empty() {
        return Err(PlaygroundError::Sample("empty example identifier".to_string()));
    }
    if id.contains(['/', '\\']) || id.contains("..") {
        return Err(PlaygroundError::Sample(format!(
            "example identifier must not contain a path: {id}"
        )));
    }
    if id.contains('.') {
        return Err(PlaygroundError::Sample(format!(
            "example identifier must not carry an extension: {id}"
        )));
    }
    if id.chars().any(char::is_control) {
        return Err(PlaygroundError::Sample(
            "example identifier contains control characters".to_string(),
        ));
    }
    Ok(id)
}

/// Stems of every example script in `dir`
pub fn accepted_ids(dir: &Path) -> Result<BTreeSet<String>> {
    let mut ids = BTreeSet::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if RESERVED_FILES.contains(&name) {
            continue;
        }
        if let Some(stem) = name.strip_suffix(".php") {
            ids.insert(stem.to_string());
        }
    }
    Ok(ids)
}

/// Validate `id` and resolve it to a script inside `dir`
pub fn resolve_sample(dir: &Path, id: &str) -> Result<std::path::PathBuf> {
    let id = validate_sample_id(id)?;
    if !accepted_ids(dir)?.contains(id) {
        return Err(PlaygroundError::SampleNotFound(id.to_string()));
    }
    Ok(dir.join(format!("{id}.{SAMPLE_EXTENSION}")))
}
