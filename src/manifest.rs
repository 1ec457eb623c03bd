//! The persisted mapping from original asset paths to fingerprinted paths.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Default manifest file name, joined onto the output base when unset.
pub const DEFAULT_MANIFEST_FILE: &str = "rev-manifest.json";

/// Mapping from original relative paths to fingerprinted relative paths.
///
/// Keys are unique; recording a path that is already present replaces the
/// earlier entry, so merged runs end up with the latest fingerprint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RevManifest {
    entries: BTreeMap<String, String>,
}

impl RevManifest {
    /// Create an empty manifest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a manifest from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse manifest {}", path.display()))
    }

    /// Load a manifest for merging, treating a missing file as empty.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content)
                .with_context(|| format!("failed to parse manifest {}", path.display())),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(err)
                .with_context(|| format!("failed to read manifest {}", path.display())),
        }
    }

    /// Record a mapping, replacing any previous entry for `original`.
    pub fn insert(&mut self, original: String, fingerprinted: String) {
        self.entries.insert(original, fingerprinted);
    }

    /// Look up the fingerprinted path recorded for `original`.
    pub fn get(&self, original: &str) -> Option<&str> {
        self.entries.get(original).map(String::as_str)
    }

    /// Number of recorded entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no entries are recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Serialize as pretty-printed JSON and write to `path`, replacing any
    /// existing content.
    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize manifest")?;
        fs::write(path, json)
            .with_context(|| format!("failed to write manifest {}", path.display()))
    }
}
