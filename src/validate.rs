//! Root path validation.

use std::path::{Path, PathBuf};

use crate::error::PipelineError;

/// Resolve `raw` to an absolute, canonical directory.
///
/// A leading `~` is expanded from `HOME`. Fails with
/// [`PipelineError::InvalidPath`] when the path is empty, does not exist,
/// or is not a directory. Nothing is read or written.
pub fn validate_root(raw: &str) -> Result<PathBuf, PipelineError> {
    let invalid = |reason: &str| PipelineError::InvalidPath {
        path: PathBuf::from(raw),
        reason: reason.to_string(),
    };

    if raw.trim().is_empty() {
        return Err(invalid("missing path"));
    }

    let expanded = expand_home(raw);
    let resolved = std::fs::canonicalize(&expanded).map_err(|e| invalid(&e.to_string()))?;

    if !resolved.is_dir() {
        return Err(PipelineError::InvalidPath {
            path: resolved,
            reason: "not a directory".to_string(),
        });
    }
    Ok(resolved)
}

fn expand_home(raw: &str) -> PathBuf {
    if let Some(rest) = raw.strip_prefix("~/").or_else(|| (raw == "~").then_some("")) {
        if let Some(home) = std::env::var_os("HOME") {
            return Path::new(&home).join(rest);
        }
    }
    PathBuf::from(raw)
}
