//! Interpreter version labels.
//!
//! Labels are compared numerically component by component, so "8.10.0" sorts
//! above "8.9.12". Missing components count as zero.

use crate::config::types::{PlaygroundError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Debug)]
pub struct InterpreterVersion {
    label: String,
    parts: Vec<u32>,
}

impl InterpreterVersion {
    pub fn parse(label: &str) -> Result<Self> {
        let label = label.trim();
        if label.is_empty() {
            return Err(PlaygroundError::InvalidVersion("no version selected".to_string()));
        }

        let parts = label
            .split('.')
            .map(|part| {
                part.parse::<u32>().map_err(|_| {
                    PlaygroundError::InvalidVersion(format!("'{label}' is not a numeric version"))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            label: label.to_string(),
            parts,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.label
    }

    pub fn major(&self) -> u32 {
        self.component(0)
    }

    pub fn minor(&self) -> u32 {
        self.component(1)
    }

    pub fn patch(&self) -> u32 {
        self.component(2)
    }

    fn component(&self, idx: usize) -> u32 {
        self.parts.get(idx).copied().unwrap_or(0)
    }
}

impl Ord for InterpreterVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.parts.len().max(other.parts.len());
        (0..len)
            .map(|i| self.component(i).cmp(&other.component(i)))
            .find(|ord| ord.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for InterpreterVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for InterpreterVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for InterpreterVersion {}

impl fmt::Display for InterpreterVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

impl FromStr for InterpreterVersion {
    type Err = PlaygroundError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for InterpreterVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.label)
    }
}

impl<'de> Deserialize<'de> for InterpreterVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Self::parse(&label).map_err(serde::de::Error::custom)
    }
}

/// Sort newest first, the order used in every listing
pub fn sort_descending(versions: &mut [InterpreterVersion]) {
    versions.sort_by(|a, b| b.cmp(a));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(label: &str) -> InterpreterVersion {
        InterpreterVersion::parse(label).unwrap()
    }

    #[test]
    fn compares_numerically_not_lexically() {
        assert!(v("8.10.0") > v("8.9.12"));
        assert!(v("7.4.33") < v("8.0.0"));
        assert_eq!(v("8.4"), v("8.4.0"));
    }

    #[test]
    fn sorts_descending() {
        let mut versions = vec![v("8.1.31"), v("8.4.3"), v("7.4.33"), v("8.3.16")];
        sort_descending(&mut versions);
        let labels: Vec<_> = versions.iter().map(|v| v.as_str()).collect();
        assert_eq!(labels, ["8.4.3", "8.3.16", "8.1.31", "7.4.33"]);
    }

    #[test]
    fn rejects_empty_and_non_numeric_labels() {
        assert!(matches!(
            InterpreterVersion::parse("  "),
            Err(PlaygroundError::InvalidVersion(_))
        ));
        assert!(InterpreterVersion::parse("8.x").is_err());
    }

    #[test]
    fn exposes_components() {
        let version = v("8.4.3");
        assert_eq!((version.major(), version.minor(), version.patch()), (8, 4, 3));
    }
}
