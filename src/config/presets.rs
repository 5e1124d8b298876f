/// Interpreter version catalog
///
/// The catalog is read from a JSON array of version labels (`php-versions.json`)
/// and always kept newest first. A missing or malformed manifest yields an empty
/// catalog so the playground can still start; panels then report that no
/// version is selected.
use crate::config::types::{PlaygroundError, Result};
use crate::runtime::version::{sort_descending, InterpreterVersion};
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct VersionCatalog {
    versions: Vec<InterpreterVersion>,
}

impl VersionCatalog {
    /// Sort newest first, dropping repeated labels; "8.4" and "8.4.0" are distinct
    pub fn new(mut versions: Vec<InterpreterVersion>) -> Self {
        let mut seen = HashSet::new();
        versions.retain(|v| seen.insert(v.as_str().to_string()));
        sort_descending(&mut versions);
        Self { versions }
    }

    /// Build from raw labels, rejecting the first malformed one
    pub fn from_labels<I, S>(labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let versions = labels
            .into_iter()
            .map(|label| InterpreterVersion::parse(label.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(versions))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let labels: Vec<String> = serde_json::from_str(json)?;
        Self::from_labels(labels)
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            PlaygroundError::Config(format!(
                "Failed to read version manifest {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&content)
    }

    /// Load the manifest, logging and falling back to an empty catalog on failure
    pub async fn load_or_empty(path: &Path) -> Self {
        match Self::load(path).await {
            Ok(catalog) => {
                log::info!("Loaded {} interpreter versions", catalog.len());
                catalog
            }
            Err(e) => {
                log::error!("Error loading interpreter versions: {}", e);
                Self::default()
            }
        }
    }

    /// Newest available version, the default selection of a new panel
    pub fn newest(&self) -> Option<&InterpreterVersion> {
        self.versions.first()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.versions.iter().any(|v| v.as_str() == label)
    }

    pub fn versions(&self) -> &[InterpreterVersion] {
        &self.versions
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_is_sorted_newest_first() {
        let catalog = VersionCatalog::from_json(r#"["8.2.27", "8.4.3", "8.3.16", "8.4.3"]"#).unwrap();
        let labels: Vec<_> = catalog.versions().iter().map(|v| v.as_str()).collect();
        assert_eq!(labels, ["8.4.3", "8.3.16", "8.2.27"]);
        assert_eq!(catalog.newest().map(|v| v.as_str()), Some("8.4.3"));
    }

    #[test]
    fn numerically_equal_labels_are_both_kept() {
        let catalog = VersionCatalog::from_labels(["8.4", "8.4.0", "8.4", "8.3.16"]).unwrap();
        let labels: Vec<_> = catalog.versions().iter().map(|v| v.as_str()).collect();
        assert_eq!(labels, ["8.4", "8.4.0", "8.3.16"]);
        assert!(catalog.contains("8.4") && catalog.contains("8.4.0"));
    }

    #[tokio::test]
    async fn missing_manifest_yields_empty_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = VersionCatalog::load_or_empty(&dir.path().join("php-versions.json")).await;
        assert!(catalog.is_empty());
        assert!(catalog.newest().is_none());
    }
}
