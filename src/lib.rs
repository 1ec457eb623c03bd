#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod config;
pub mod fingerprint;
pub mod hook;
pub mod manifest;
pub mod pathspec;
pub mod resolver;
pub mod revision;

pub use config::{BusterConfig, ConfigError, RevisionPlan};
pub use hook::{PostCompileStep, RevisionStep};
pub use manifest::RevManifest;
pub use pathspec::PathSpec;
pub use revision::{RevisionBuilder, RevisionOutcome};
