//! Content digests and fingerprinted file naming.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use md5::{Digest, Md5};

/// Number of hex characters of the digest embedded in fingerprinted names.
///
/// Ten characters keeps names short, at a slightly higher collision
/// probability than a full digest; manifests produced at this length stay
/// compatible with the established `rev-manifest.json` tooling.
pub const FINGERPRINT_LEN: usize = 10;

/// Digest primitive used to fingerprint file content.
///
/// The pipeline only needs a stable hex digest of a byte slice, so the
/// algorithm stays swappable behind this trait.
pub trait ContentDigest {
    /// Lowercase hex digest of `bytes`.
    fn hex_digest(&self, bytes: &[u8]) -> String;
}

/// Default digest: MD5, matching the manifests this tool is a drop-in for.
#[derive(Debug, Clone, Copy, Default)]
pub struct Md5Digest;

impl ContentDigest for Md5Digest {
    fn hex_digest(&self, bytes: &[u8]) -> String {
        format!("{:x}", Md5::digest(bytes))
    }
}

/// Fingerprint of `bytes`: the digest truncated to [`FINGERPRINT_LEN`].
pub fn fingerprint_bytes(digest: &dyn ContentDigest, bytes: &[u8]) -> String {
    let mut hex = digest.hex_digest(bytes);
    hex.truncate(FINGERPRINT_LEN);
    hex
}

/// Read `path` and compute its content fingerprint.
pub fn fingerprint_file(digest: &dyn ContentDigest, path: &Path) -> Result<String> {
    let bytes =
        fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok(fingerprint_bytes(digest, &bytes))
}

/// Split a file name into basename and extension on the final dot.
///
/// Names without a dot cannot carry a fingerprint suffix and are rejected.
pub fn split_name(file_name: &str) -> Result<(&str, &str)> {
    match file_name.rsplit_once('.') {
        Some((basename, extension)) => Ok((basename, extension)),
        None => bail!(
            "cannot fingerprint {file_name:?}: file names without an extension are not supported"
        ),
    }
}

/// Derive the fingerprinted sibling path `<basename>-<fingerprint>.<extension>`.
///
/// Pure apart from the read-only content hash; the copy to this path happens
/// in the revision pass.
pub fn fingerprinted_path(digest: &dyn ContentDigest, path: &Path) -> Result<PathBuf> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| anyhow!("invalid file name in {}", path.display()))?;
    let (basename, extension) = split_name(file_name)?;
    let fingerprint = fingerprint_file(digest, path)?;
    Ok(path.with_file_name(format!("{basename}-{fingerprint}.{extension}")))
}
