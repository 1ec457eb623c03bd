//! Configuration describing a revision run and its resolution into a plan.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::manifest::DEFAULT_MANIFEST_FILE;
use crate::pathspec::PathSpec;

/// Default configuration file searched for in the project root.
pub const DEFAULT_CONFIG_FILE: &str = "buster.config.json";

/// Raw configuration consumed from the host project.
///
/// Optional fields stay unset here; [`BusterConfig::into_plan`] applies the
/// default tiers against a concrete project root.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BusterConfig {
    /// Path specifiers selecting the files to fingerprint.
    pub files: Vec<PathSpec>,
    /// Base directory for resolution and relative-path stripping.
    #[serde(default)]
    pub files_base: Option<PathBuf>,
    /// Destination root for fingerprinted copies.
    #[serde(default)]
    pub output_base: Option<PathBuf>,
    /// Location of the manifest file.
    #[serde(default)]
    pub manifest: Option<PathBuf>,
    /// Merge into an existing manifest instead of starting empty.
    #[serde(default)]
    pub merge: bool,
}

/// Errors raised while loading or validating the configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    Io {
        /// Path that caused the error.
        path: PathBuf,
        /// Source I/O error.
        source: std::io::Error,
    },
    /// Failed to parse the JSON configuration document.
    Parse {
        /// Path that caused the error.
        path: PathBuf,
        /// Source parse error.
        source: serde_json::Error,
    },
    /// The `files` list was present but named nothing.
    EmptyFiles,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read {}: {}", path.display(), source)
            }
            Self::Parse { path, source } => {
                write!(f, "failed to parse {}: {}", path.display(), source)
            }
            Self::EmptyFiles => {
                write!(f, "the files list must name at least one path or pattern")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::EmptyFiles => None,
        }
    }
}

impl BusterConfig {
    /// Read configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Resolve the optional fields against `project_root` into a concrete
    /// plan, rejecting an empty `files` list before any filesystem work.
    pub fn into_plan(self, project_root: &Path) -> Result<RevisionPlan, ConfigError> {
        if self.files.is_empty() {
            return Err(ConfigError::EmptyFiles);
        }

        let files_base = match self.files_base {
            Some(base) => absolutize(project_root, base),
            None => project_root.to_path_buf(),
        };
        let output_base = match self.output_base {
            Some(base) => absolutize(project_root, base),
            None => files_base.clone(),
        };
        let manifest_path = match self.manifest {
            Some(path) => absolutize(project_root, path),
            None => output_base.join(DEFAULT_MANIFEST_FILE),
        };

        Ok(RevisionPlan {
            files: self.files,
            files_base,
            output_base,
            manifest_path,
            merge: self.merge,
        })
    }
}

/// Fully resolved inputs for a single revision run.
#[derive(Debug, Clone)]
pub struct RevisionPlan {
    /// Path specifiers selecting the files to fingerprint.
    pub files: Vec<PathSpec>,
    /// Base directory for resolution and relative-path stripping.
    pub files_base: PathBuf,
    /// Destination root for fingerprinted copies.
    pub output_base: PathBuf,
    /// Location the manifest is written to.
    pub manifest_path: PathBuf,
    /// Merge into an existing manifest instead of starting empty.
    pub merge: bool,
}

fn absolutize(root: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() { path } else { root.join(path) }
}
