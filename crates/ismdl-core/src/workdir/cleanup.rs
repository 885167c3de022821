//! Post-reassembly retention policies.

use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::path::Path;

use super::WorkDir;
use crate::config::CleanupMode;
use crate::http::partial_path;
use crate::plan::ConcatPlan;

/// What survives after a successful reassembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetentionPolicy {
    /// Leave every intermediate file for inspection or a later resume.
    KeepParts,
    /// Delete fragments and list/state files; keep the directory.
    RemoveIntermediates,
    /// Delete the whole working directory.
    RemoveDirectory,
}

impl RetentionPolicy {
    /// `keep_parts` overrides the configured mode.
    pub fn resolve(keep_parts: bool, mode: CleanupMode) -> Self {
        if keep_parts {
            return RetentionPolicy::KeepParts;
        }
        match mode {
            CleanupMode::Intermediates => RetentionPolicy::RemoveIntermediates,
            CleanupMode::Directory => RetentionPolicy::RemoveDirectory,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupSummary {
    pub files_removed: usize,
    pub directory_removed: bool,
}

/// Applies `policy` to `workdir`. Call only after the muxer succeeded.
///
/// `keep` lists files that must survive: the output and any manifest file the
/// user supplied. `RemoveDirectory` is downgraded to `RemoveIntermediates` when
/// one of them lives inside the working directory. `remove_snapshot` is false
/// when the manifest snapshot was supplied by the user rather than written by
/// this tool.
pub fn cleanup(
    workdir: &WorkDir,
    plan: &ConcatPlan,
    policy: RetentionPolicy,
    keep: &[&Path],
    remove_snapshot: bool,
) -> Result<CleanupSummary> {
    match policy {
        RetentionPolicy::KeepParts => {
            tracing::info!(dir = %workdir.root().display(), "keeping intermediate files");
            Ok(CleanupSummary::default())
        }
        RetentionPolicy::RemoveDirectory
            if keep.iter().any(|path| contains(workdir.root(), path)) =>
        {
            let inside: Vec<_> = keep
                .iter()
                .filter(|path| contains(workdir.root(), path))
                .map(|path| path.display().to_string())
                .collect();
            tracing::warn!(
                dir = %workdir.root().display(),
                ?inside,
                "working directory holds files to keep; removing intermediates only"
            );
            remove_intermediates(workdir, plan, remove_snapshot)
        }
        RetentionPolicy::RemoveDirectory => {
            std::fs::remove_dir_all(workdir.root()).with_context(|| {
                format!("remove working directory {}", workdir.root().display())
            })?;
            tracing::info!(dir = %workdir.root().display(), "removed working directory");
            Ok(CleanupSummary {
                files_removed: 0,
                directory_removed: true,
            })
        }
        RetentionPolicy::RemoveIntermediates => remove_intermediates(workdir, plan, remove_snapshot),
    }
}

fn remove_intermediates(
    workdir: &WorkDir,
    plan: &ConcatPlan,
    remove_snapshot: bool,
) -> Result<CleanupSummary> {
    let mut targets: Vec<std::path::PathBuf> = plan
        .file_names()
        .into_iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .flat_map(|name| {
            let path = workdir.root().join(name);
            let partial = partial_path(&path);
            [path, partial]
        })
        .collect();
    targets.push(workdir.list_path());
    targets.push(workdir.available_list_path());
    targets.push(workdir.digest_path());
    if remove_snapshot {
        targets.push(workdir.snapshot_path());
    }

    let mut summary = CleanupSummary::default();
    for path in targets {
        match std::fs::remove_file(&path) {
            Ok(()) => summary.files_removed += 1,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e).with_context(|| format!("remove {}", path.display()));
            }
        }
    }
    tracing::info!(
        dir = %workdir.root().display(),
        files = summary.files_removed,
        "removed intermediate files"
    );
    Ok(summary)
}

/// True if `path` is `dir` or lies beneath it.
fn contains(dir: &Path, path: &Path) -> bool {
    let dir = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
    let target = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .and_then(|p| p.canonicalize().ok())
        .map(|p| match path.file_name() {
            Some(name) => p.join(name),
            None => p,
        })
        .or_else(|| std::env::current_dir().ok().map(|cwd| cwd.join(path)))
        .unwrap_or_else(|| path.to_path_buf());
    target.starts_with(&dir)
}
