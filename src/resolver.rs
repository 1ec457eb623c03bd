//! Expansion of path specifiers into the concrete list of files to revise.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::pathspec::PathSpec;

/// Per-run memoized directory walk, keyed by walked root.
///
/// Pattern specifiers match against every path underneath the files base, so
/// repeated patterns would otherwise re-walk the same tree. The cache lives
/// for a single run and is passed in explicitly, keeping walks out of any
/// process-wide state.
#[derive(Debug, Default)]
pub struct WalkCache {
    walks: BTreeMap<PathBuf, Vec<PathBuf>>,
}

impl WalkCache {
    /// Create an empty cache for a single revision run.
    pub fn new() -> Self {
        Self::default()
    }

    /// All files transitively underneath `dir`, walking at most once per root.
    pub fn files_under(&mut self, dir: &Path) -> &[PathBuf] {
        self.walks
            .entry(dir.to_path_buf())
            .or_insert_with(|| walk_files(dir))
    }

    #[cfg(test)]
    fn walked_roots(&self) -> usize {
        self.walks.len()
    }
}

/// Expand `specs` against `files_base` into a deduplicated list of existing
/// files, preserving input order (first occurrence wins).
///
/// Specifiers that name nothing are non-fatal: they log a warning and
/// contribute no files.
pub fn resolve_files(
    files_base: &Path,
    specs: &[PathSpec],
    cache: &mut WalkCache,
) -> Vec<PathBuf> {
    let mut resolved = Vec::new();
    let mut seen = BTreeSet::new();

    for spec in specs {
        match spec {
            PathSpec::Literal(literal) => {
                let target = files_base.join(literal);
                if !target.exists() {
                    warn!(
                        "file spec {spec} does not exist under {}",
                        files_base.display()
                    );
                    continue;
                }
                push_expanded(&target, cache, &mut resolved, &mut seen);
            }
            PathSpec::Pattern(pattern) => {
                let matches: Vec<PathBuf> = cache
                    .files_under(files_base)
                    .iter()
                    .filter(|path| pattern.is_match(&normalized(path)))
                    .cloned()
                    .collect();
                if matches.is_empty() {
                    warn!(
                        "file spec {spec} matched nothing under {}",
                        files_base.display()
                    );
                }
                for target in matches {
                    push_expanded(&target, cache, &mut resolved, &mut seen);
                }
            }
        }
    }

    resolved
}

/// Slash-normalized string form of a path, as matched by pattern specifiers
/// and recorded in the manifest.
pub(crate) fn normalized(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn push_expanded(
    target: &Path,
    cache: &mut WalkCache,
    resolved: &mut Vec<PathBuf>,
    seen: &mut BTreeSet<PathBuf>,
) {
    if target.is_dir() {
        let children = cache.files_under(target).to_vec();
        for child in children {
            push_file(child, resolved, seen);
        }
    } else {
        push_file(target.to_path_buf(), resolved, seen);
    }
}

fn push_file(path: PathBuf, resolved: &mut Vec<PathBuf>, seen: &mut BTreeSet<PathBuf>) {
    if seen.insert(path.clone()) {
        resolved.push(path);
    }
}

/// Depth-first listing of every file underneath `dir`, in filesystem order.
fn walk_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    collect_files(dir, &mut files);
    files
}

fn collect_files(dir: &Path, files: &mut Vec<PathBuf>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            warn!("skipping unreadable directory {}: {}", dir.display(), err);
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        match entry.file_type() {
            Ok(file_type) if file_type.is_dir() => collect_files(&path, files),
            Ok(file_type) if file_type.is_file() => files.push(path),
            _ => {}
        }
    }
}
