//! Path specifiers naming the files a revision run should touch.

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Deserializer};

/// A single entry of the `files` configuration list.
///
/// A plain JSON string names a literal path resolved against the files base.
/// The `{"pattern": "…"}` form compiles to a regular expression matched
/// against the slash-normalized string form of every path underneath the
/// files base.
#[derive(Debug, Clone)]
pub enum PathSpec {
    /// Literal relative path, resolved against the files base.
    Literal(String),
    /// Regular expression matched against walked file paths.
    Pattern(Regex),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPathSpec {
    Literal(String),
    Pattern { pattern: String },
}

impl<'de> Deserialize<'de> for PathSpec {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match RawPathSpec::deserialize(deserializer)? {
            RawPathSpec::Literal(path) => Ok(Self::Literal(path)),
            RawPathSpec::Pattern { pattern } => Regex::new(&pattern).map(Self::Pattern).map_err(
                |err| serde::de::Error::custom(format!("invalid file pattern {pattern:?}: {err}")),
            ),
        }
    }
}

impl fmt::Display for PathSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(path) => f.write_str(path),
            Self::Pattern(pattern) => write!(f, "/{}/", pattern.as_str()),
        }
    }
}
