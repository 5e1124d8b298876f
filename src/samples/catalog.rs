use crate::config::types::{PlaygroundError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File name of the catalogue inside the examples directory
pub const CATALOG_FILE: &str = "examples.json";

/// One entry of the example picker
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleEntry {
    /// Identifier passed to the example source
    pub value: String,
    pub label: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SampleCatalog {
    entries: Vec<SampleEntry>,
}

impl SampleCatalog {
    pub fn new(entries: Vec<SampleEntry>) -> Self {
        Self { entries }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let entries: Vec<SampleEntry> = serde_json::from_str(json)?;
        Ok(Self::new(entries))
    }

    pub async fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(CATALOG_FILE);
        let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
            PlaygroundError::Sample(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }

    pub fn get(&self, value: &str) -> Option<&SampleEntry> {
        self.entries.iter().find(|e| e.value == value)
    }

    pub fn entries(&self) -> &[SampleEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
