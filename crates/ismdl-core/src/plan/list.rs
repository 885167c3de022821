//! ffmpeg concat demuxer list file: `file '<path>'` per line.
//!
//! Quoting follows ffmpeg's token rules: inside single quotes everything is
//! literal; outside, a backslash escapes the next character. A `'` in a path
//! is therefore written as `'\''`.

use anyhow::{Context, Result};
use std::path::Path;

use super::{ConcatPlan, FRAGMENT_SUFFIX};
use crate::error::PipelineError;
use crate::manifest::FragmentId;

fn quote(path: &str) -> String {
    format!("'{}'", path.replace('\'', r"'\''"))
}

/// Undoes `quote` (and any other valid ffmpeg token quoting).
fn unquote(token: &str) -> Result<String, String> {
    let mut out = String::with_capacity(token.len());
    let mut chars = token.chars();
    let mut in_quotes = false;
    while let Some(c) = chars.next() {
        match c {
            '\'' => in_quotes = !in_quotes,
            '\\' if !in_quotes => match chars.next() {
                Some(next) => out.push(next),
                None => return Err("dangling backslash".to_string()),
            },
            _ => out.push(c),
        }
    }
    if in_quotes {
        return Err("unterminated quote".to_string());
    }
    Ok(out)
}

/// Renders the plan as list-file text, one directive per entry.
pub fn render_list(plan: &ConcatPlan) -> String {
    let mut out = String::new();
    for name in plan.file_names() {
        out.push_str("file ");
        out.push_str(&quote(&name));
        out.push('\n');
    }
    out
}

/// Parses list-file text back into a plan. Every entry must name a
/// `<digits>.part` fragment file.
pub fn parse_list(text: &str) -> Result<ConcatPlan, PipelineError> {
    let mut ids = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let malformed = |reason: String| PipelineError::MalformedList {
            line: line_no,
            reason,
        };
        let rest = line
            .strip_prefix("file")
            .filter(|r| r.starts_with(char::is_whitespace))
            .ok_or_else(|| malformed("expected a `file` directive".to_string()))?;
        let path = unquote(rest.trim()).map_err(malformed)?;
        let digits = path
            .strip_suffix(FRAGMENT_SUFFIX)
            .ok_or_else(|| malformed(format!("not a fragment file: {}", path)))?;
        let id = FragmentId::from_digits(digits)
            .map_err(|_| malformed(format!("not a fragment file: {}", path)))?;
        ids.push(id);
    }
    Ok(ConcatPlan::from_ids(ids))
}

/// Writes the list file for `plan` to `path`.
pub fn write_list(plan: &ConcatPlan, path: &Path) -> Result<()> {
    std::fs::write(path, render_list(plan))
        .with_context(|| format!("write concat list {}", path.display()))?;
    tracing::debug!(path = %path.display(), entries = plan.len(), "wrote concat list");
    Ok(())
}

/// Reads and parses a list file written by `write_list`.
pub fn read_list(path: &Path) -> Result<ConcatPlan> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read concat list {}", path.display()))?;
    Ok(parse_list(&text)?)
}
