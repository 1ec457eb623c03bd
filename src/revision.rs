//! The revision pass: copy resolved files to fingerprinted names and record
//! the manifest.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use same_file::is_same_file;
use tracing::debug;

use crate::config::RevisionPlan;
use crate::fingerprint::{ContentDigest, Md5Digest, fingerprinted_path};
use crate::manifest::RevManifest;
use crate::resolver::{WalkCache, normalized, resolve_files};

/// Summary of a completed revision run.
#[derive(Debug)]
pub struct RevisionOutcome {
    /// Files resolved from the configured specifiers.
    pub resolved: usize,
    /// Fingerprinted copies written under the output base.
    pub copied: Vec<PathBuf>,
    /// Location the manifest was written to.
    pub manifest_path: PathBuf,
    /// Entries recorded in the written manifest.
    pub entries: usize,
}

/// Executes the resolve → fingerprint → copy → record pipeline for a plan.
///
/// The manifest is written only after every copy succeeded; a failed run
/// never claims a consistent manifest, though fingerprinted files copied
/// before the failure are left in place.
pub struct RevisionBuilder<'a> {
    plan: &'a RevisionPlan,
    digest: Box<dyn ContentDigest>,
}

impl<'a> RevisionBuilder<'a> {
    /// Create a builder for the plan using the default MD5 digest.
    pub fn new(plan: &'a RevisionPlan) -> Self {
        Self {
            plan,
            digest: Box::new(Md5Digest),
        }
    }

    /// Replace the digest primitive used for fingerprinting.
    pub fn with_digest(mut self, digest: Box<dyn ContentDigest>) -> Self {
        self.digest = digest;
        self
    }

    /// Run the revision pass and write the manifest.
    pub fn run(&self) -> Result<RevisionOutcome> {
        let plan = self.plan;
        let mut cache = WalkCache::new();
        let files = resolve_files(&plan.files_base, &plan.files, &mut cache);

        let mut manifest = if plan.merge {
            RevManifest::load_or_default(&plan.manifest_path)?
        } else {
            RevManifest::new()
        };

        let mut copied = Vec::with_capacity(files.len());
        for file in &files {
            let fingerprinted = fingerprinted_path(self.digest.as_ref(), file)?;
            let original_rel = relative_to(file, &plan.files_base)?;
            let fingerprinted_rel = relative_to(&fingerprinted, &plan.files_base)?;

            let destination = plan.output_base.join(&fingerprinted_rel);
            if let Some(parent) = destination.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            copy_fingerprinted(file, &destination)?;
            debug!("copied {} -> {}", file.display(), destination.display());

            manifest.insert(normalized(&original_rel), normalized(&fingerprinted_rel));
            copied.push(destination);
        }

        if let Some(parent) = plan.manifest_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        manifest.write(&plan.manifest_path)?;

        Ok(RevisionOutcome {
            resolved: files.len(),
            copied,
            manifest_path: plan.manifest_path.clone(),
            entries: manifest.len(),
        })
    }
}

/// Strip the files base prefix from a resolved path.
fn relative_to(path: &Path, base: &Path) -> Result<PathBuf> {
    path.strip_prefix(base)
        .map(Path::to_path_buf)
        .map_err(|_| anyhow!("{} is not underneath {}", path.display(), base.display()))
}

/// Copy `source` to `destination`, overwriting existing content. Copies onto
/// an identical inode are skipped.
fn copy_fingerprinted(source: &Path, destination: &Path) -> Result<()> {
    if destination.exists()
        && is_same_file(source, destination).with_context(|| {
            format!(
                "failed to compare {} and {}",
                source.display(),
                destination.display()
            )
        })?
    {
        return Ok(());
    }

    fs::copy(source, destination).map(|_| ()).with_context(|| {
        format!(
            "failed to copy {} to {}",
            source.display(),
            destination.display()
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pathspec::PathSpec;
    use regex::Regex;
    use tempfile::tempdir;

    fn touch(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn plan_for(root: &Path, files: Vec<PathSpec>) -> RevisionPlan {
        RevisionPlan {
            files,
            files_base: root.to_path_buf(),
            output_base: root.to_path_buf(),
            manifest_path: root.join("rev-manifest.json"),
            merge: false,
        }
    }

    #[test]
    fn copies_and_records_the_reference_example() {
        let temp = tempdir().unwrap();
        touch(&temp.path().join("foo.css"), "foo");

        let plan = plan_for(temp.path(), vec![PathSpec::Literal("foo.css".into())]);
        let outcome = RevisionBuilder::new(&plan).run().unwrap();

        assert_eq!(outcome.resolved, 1);
        assert_eq!(outcome.entries, 1);
        assert!(temp.path().join("foo-acbd18db4c.css").exists());

        let manifest = RevManifest::load(&plan.manifest_path).unwrap();
        assert_eq!(manifest.get("foo.css"), Some("foo-acbd18db4c.css"));
    }

    #[test]
    fn nested_files_keep_their_directories_in_the_mapping() {
        let temp = tempdir().unwrap();
        touch(&temp.path().join("css/site.css"), "site");

        let plan = plan_for(temp.path(), vec![PathSpec::Literal("css".into())]);
        RevisionBuilder::new(&plan).run().unwrap();

        let manifest = RevManifest::load(&plan.manifest_path).unwrap();
        let fingerprinted = manifest.get("css/site.css").unwrap();
        assert!(fingerprinted.starts_with("css/site-"));
        assert!(fingerprinted.ends_with(".css"));
    }

    #[test]
    fn separate_output_base_receives_the_copies() {
        let temp = tempdir().unwrap();
        touch(&temp.path().join("public/app.js"), "app");

        let plan = RevisionPlan {
            files: vec![PathSpec::Pattern(Regex::new(r"\.js$").unwrap())],
            files_base: temp.path().join("public"),
            output_base: temp.path().join("dist"),
            manifest_path: temp.path().join("dist/rev-manifest.json"),
            merge: false,
        };
        let outcome = RevisionBuilder::new(&plan).run().unwrap();

        assert_eq!(outcome.copied.len(), 1);
        assert!(outcome.copied[0].starts_with(temp.path().join("dist")));
        assert!(outcome.copied[0].exists());
        assert!(plan.manifest_path.exists());
    }

    #[test]
    fn merge_overwrites_stale_entries_and_keeps_unrelated_ones() {
        let temp = tempdir().unwrap();
        touch(&temp.path().join("a.css"), "fresh");

        let mut existing = RevManifest::new();
        existing.insert("a.css".into(), "a-1111111111.css".into());
        existing.insert("keep.css".into(), "keep-2222222222.css".into());
        existing.write(&temp.path().join("rev-manifest.json")).unwrap();

        let mut plan = plan_for(temp.path(), vec![PathSpec::Literal("a.css".into())]);
        plan.merge = true;
        RevisionBuilder::new(&plan).run().unwrap();

        let manifest = RevManifest::load(&plan.manifest_path).unwrap();
        assert_eq!(manifest.len(), 2);
        assert_ne!(manifest.get("a.css"), Some("a-1111111111.css"));
        assert_eq!(manifest.get("keep.css"), Some("keep-2222222222.css"));
    }

    #[test]
    fn non_merge_runs_discard_existing_manifest_content() {
        let temp = tempdir().unwrap();
        touch(&temp.path().join("a.css"), "fresh");

        let mut existing = RevManifest::new();
        existing.insert("stale.css".into(), "stale-3333333333.css".into());
        existing.write(&temp.path().join("rev-manifest.json")).unwrap();

        let plan = plan_for(temp.path(), vec![PathSpec::Literal("a.css".into())]);
        RevisionBuilder::new(&plan).run().unwrap();

        let manifest = RevManifest::load(&plan.manifest_path).unwrap();
        assert_eq!(manifest.len(), 1);
        assert!(manifest.get("stale.css").is_none());
    }

    #[test]
    fn missing_specs_still_produce_a_manifest() {
        let temp = tempdir().unwrap();

        let plan = plan_for(temp.path(), vec![PathSpec::Literal("ghost.css".into())]);
        let outcome = RevisionBuilder::new(&plan).run().unwrap();

        assert_eq!(outcome.resolved, 0);
        assert_eq!(outcome.entries, 0);
        assert!(plan.manifest_path.exists());
    }

    #[test]
    fn rerunning_overwrites_the_previous_copy() {
        let temp = tempdir().unwrap();
        touch(&temp.path().join("foo.css"), "foo");

        let plan = plan_for(temp.path(), vec![PathSpec::Literal("foo.css".into())]);
        RevisionBuilder::new(&plan).run().unwrap();
        RevisionBuilder::new(&plan).run().unwrap();

        let copy = temp.path().join("foo-acbd18db4c.css");
        assert_eq!(fs::read_to_string(copy).unwrap(), "foo");
    }

    #[test]
    fn extensionless_files_fail_loudly() {
        let temp = tempdir().unwrap();
        touch(&temp.path().join("LICENSE"), "text");

        let plan = plan_for(temp.path(), vec![PathSpec::Literal("LICENSE".into())]);
        let err = RevisionBuilder::new(&plan).run().unwrap_err();
        assert!(err.to_string().contains("not supported"));
        assert!(!plan.manifest_path.exists());
    }

    struct FixedDigest;

    impl ContentDigest for FixedDigest {
        fn hex_digest(&self, _bytes: &[u8]) -> String {
            "feedfacefeedfaceffff".into()
        }
    }

    #[test]
    fn digest_primitive_is_swappable() {
        let temp = tempdir().unwrap();
        touch(&temp.path().join("foo.css"), "foo");

        let plan = plan_for(temp.path(), vec![PathSpec::Literal("foo.css".into())]);
        RevisionBuilder::new(&plan)
            .with_digest(Box::new(FixedDigest))
            .run()
            .unwrap();

        assert!(temp.path().join("foo-feedfacefe.css").exists());
    }
}
