//! Fixture loading and management.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::HarnessError;

/// A single fixture test case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureCase {
    /// Case identifier.
    pub name: String,
    /// Conversion under test (`to_c_str`, `from_c_str`, `from_c_str_with_length`).
    pub function: String,
    /// Contract clause the case exercises.
    pub contract: String,
    /// Input parameters.
    pub inputs: serde_json::Value,
    /// Expected output, rendered as a canonical string.
    pub expected_output: String,
    /// `strict`, `hardened` or `both`.
    pub mode: String,
}

/// A collection of fixture cases for one conversion family.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureSet {
    /// Schema version.
    pub version: String,
    /// Family name.
    pub family: String,
    /// UTC timestamp of capture.
    pub captured_at: String,
    /// Individual test cases.
    pub cases: Vec<FixtureCase>,
}

impl FixtureSet {
    /// Load fixture set from JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize fixture set to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load fixture set from a file path.
    pub fn from_file(path: &Path) -> Result<Self, HarnessError> {
        let content = std::fs::read_to_string(path).map_err(|e| HarnessError::io(path, e))?;
        Ok(Self::from_json(&content)?)
    }

    /// Load every `*.json` fixture set in `dir`, sorted by file name.
    pub fn load_dir(dir: &Path) -> Result<Vec<Self>, HarnessError> {
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(|e| HarnessError::io(dir, e))? {
            let path = entry.map_err(|e| HarnessError::io(dir, e))?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();
        paths.iter().map(|p| Self::from_file(p)).collect()
    }
}
