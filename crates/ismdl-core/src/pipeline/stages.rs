//! Blocking stage bodies run by the pipeline on the blocking pool.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;

use crate::config::FailurePolicy;
use crate::context::RunContext;
use crate::error::{FetchError, PipelineError};
use crate::fetch::FetchReport;
use crate::manifest::{self, FragmentPattern};
use crate::plan::{self, ConcatPlan};
use crate::resolver::{ManifestSource, ResolvedManifest};
use crate::workdir::manifest_digest;

pub(super) struct LoadedManifest {
    pub(super) bytes: Vec<u8>,
    /// False when the snapshot file is the user's own input.
    pub(super) snapshot_generated: bool,
}

/// Obtains the manifest bytes and writes the snapshot.
pub(super) fn load_manifest(
    ctx: &RunContext,
    resolved: &ResolvedManifest,
    abort: &AtomicBool,
) -> Result<LoadedManifest> {
    let snapshot = ctx.workdir.snapshot_path();
    match &resolved.source {
        ManifestSource::Remote => {
            let url = resolved.base.manifest_url(&ctx.tracks);
            tracing::info!(%url, "fetching manifest");
            let bytes = ctx.http.get_bytes(&url, Some(abort)).map_err(|e| match e {
                FetchError::Aborted => PipelineError::Cancelled,
                other => PipelineError::ManifestFetch(other),
            })?;
            ctx.workdir.write_snapshot(&bytes)?;
            Ok(LoadedManifest {
                bytes,
                snapshot_generated: true,
            })
        }
        ManifestSource::File(path) => {
            let bytes = std::fs::read(path)
                .with_context(|| format!("read manifest file {}", path.display()))?;
            let is_snapshot = match (path.canonicalize(), snapshot.canonicalize()) {
                (Ok(a), Ok(b)) => a == b,
                _ => false,
            };
            if !is_snapshot {
                ctx.workdir.write_snapshot(&bytes)?;
            }
            tracing::info!(path = %path.display(), bytes = bytes.len(), "loaded manifest file");
            Ok(LoadedManifest {
                bytes,
                snapshot_generated: !is_snapshot,
            })
        }
        ManifestSource::Text(text) => {
            ctx.workdir.write_snapshot(text.as_bytes())?;
            Ok(LoadedManifest {
                bytes: text.clone().into_bytes(),
                snapshot_generated: true,
            })
        }
    }
}

/// Reuses the stored plan for an unchanged manifest, otherwise extracts the
/// identifiers and writes a fresh list. Returns the plan and whether it was reused.
pub(super) fn prepare_plan(
    ctx: &RunContext,
    bytes: &[u8],
    pattern: &dyn FragmentPattern,
) -> Result<(ConcatPlan, bool)> {
    let digest = manifest_digest(bytes);
    if let Some(plan) = ctx.workdir.reusable_plan(&digest) {
        tracing::info!(entries = plan.len(), "reusing concat list from previous run");
        return Ok((plan, true));
    }
    let text = manifest::decode(bytes)?;
    let ids = manifest::extract_fragments(text, pattern)?;
    let plan = ConcatPlan::from_ids(ids);
    ctx.workdir.save_plan(&plan, &digest)?;
    tracing::info!(entries = plan.len(), "built concat list");
    Ok((plan, false))
}

/// Picks the list handed to the muxer, applying the failure policy.
pub(super) fn list_for_muxer(
    ctx: &RunContext,
    plan: &ConcatPlan,
    report: &FetchReport,
    policy: FailurePolicy,
) -> Result<PathBuf> {
    if report.is_complete() {
        return Ok(ctx.workdir.list_path());
    }
    let failed = || {
        let (first_id, first_error) = report
            .failures
            .first()
            .map(|(id, e)| (*id, e.to_string()))
            .unwrap_or((plan.ids()[0], String::new()));
        PipelineError::FragmentsFailed {
            failed: report.failed(),
            total: report.total,
            first_id,
            first_error,
        }
    };
    if policy == FailurePolicy::Abort {
        return Err(failed().into());
    }

    let missing: HashSet<_> = report.failures.iter().map(|(id, _)| *id).collect();
    let available = ConcatPlan::from_ids(
        plan.ids()
            .iter()
            .copied()
            .filter(|id| !missing.contains(id))
            .collect(),
    );
    if available.is_empty() {
        return Err(failed().into());
    }
    tracing::warn!(
        missing = missing.len(),
        kept = available.len(),
        total = plan.len(),
        "muxing with gaps"
    );
    let path = ctx.workdir.available_list_path();
    plan::write_list(&available, &path)?;
    Ok(path)
}
