//! Filesystem collector.
//!
//! Walks a validated project root in a fixed order and turns every allowed
//! file into a [`Document`]. Per file, the steps run in this order:
//!
//! 1. **Filter**: [`TraversalRules`] and the configured exclude globs
//!    decide whether to descend into a directory or collect a file.
//! 2. **Sanitize**: dotenv-style files have every value redacted.
//! 3. **Govern**: the byte cap, then the line cap for lock and large
//!    structured-config files.
//! 4. **Budget**: the first document that would push the running total
//!    past `max_total_bytes` stops the walk. It is not included.
//!
//! Directory entries are visited depth-first and sorted by file name, so
//! two runs over an unchanged tree produce identical documents and the
//! budget cutoff always lands on the same file.
//!
//! Only reads happen here; nothing is written.

use anyhow::Result;
use globset::{Glob, GlobSet, GlobSetBuilder};
use readmegen_core::limits::{mark_truncated, SizeLimits, Truncation};
use readmegen_core::models::{CollectionResult, Document, DocumentKind};
use readmegen_core::rules::{extension_of, FileDecision, SkipReason, TraversalRules};
use readmegen_core::sanitize::sanitize_env;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::Config;

/// Traversal rules, limits, and exclude globs for one or more collection passes.
#[derive(Debug, Clone)]
pub struct Collector {
    rules: TraversalRules,
    limits: SizeLimits,
    exclude: GlobSet,
    follow_symlinks: bool,
}

impl Collector {
    pub fn new(rules: TraversalRules, limits: SizeLimits) -> Self {
        Self {
            rules,
            limits,
            exclude: GlobSet::empty(),
            follow_symlinks: false,
        }
    }

    /// Build a collector from the `[collector]` and `[limits]` sections.
    ///
    /// # Errors
    ///
    /// Returns an error if an `exclude_globs` pattern is invalid.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut collector = Self::new(config.collector.rules(), config.limits.limits());
        collector.exclude = build_globset(&config.collector.exclude_globs)?;
        collector.follow_symlinks = config.collector.follow_symlinks;
        Ok(collector)
    }

    /// Run one collection pass over `root`.
    ///
    /// `root` must be a validated directory (see
    /// [`validate_root`](crate::validate::validate_root)). Unreadable
    /// entries are logged and skipped; this never fails.
    pub fn collect(&self, root: &Path) -> CollectionResult {
        let mut result = CollectionResult::default();

        let mut walker = WalkDir::new(root)
            .min_depth(1)
            .follow_links(self.follow_symlinks)
            .sort_by_file_name()
            .into_iter();

        while let Some(entry) = walker.next() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let at = e
                        .path()
                        .map(|p| relative_path(root, p))
                        .unwrap_or_default();
                    warn!(path = %at, error = %e, "walk error");
                    result.log.push(format!("skipped: {} ({})", at, e));
                    continue;
                }
            };

            let rel = relative_path(root, entry.path());
            let name = entry.file_name().to_string_lossy();

            if entry.file_type().is_dir() {
                if !self.rules.should_descend(&name) || self.exclude.is_match(&rel) {
                    debug!(path = %rel, "skipping directory");
                    result.log.push(format!("skipped: {}/", rel));
                    walker.skip_current_dir();
                }
                continue;
            }
            if !entry.file_type().is_file() {
                continue;
            }

            if self.exclude.is_match(&rel) {
                debug!(path = %rel, "excluded by glob");
                continue;
            }

            let kind = match self.rules.file_decision(&name) {
                FileDecision::Collect(kind) => kind,
                FileDecision::Skip(SkipReason::NotAllowed) => {
                    debug!(path = %rel, "not on allow-list");
                    continue;
                }
                FileDecision::Skip(reason) => {
                    result
                        .log
                        .push(format!("skipped: {} ({})", rel, reason.as_str()));
                    continue;
                }
            };

            let document = match self.read_document(entry.path(), &rel, &name, kind) {
                Ok((document, truncations)) => {
                    for t in truncations {
                        result.log.push(format!("truncated: {} to {}", rel, t));
                    }
                    document
                }
                Err(e) => {
                    warn!(path = %rel, error = %e, "unreadable file");
                    result
                        .log
                        .push(format!("skipped: {} (unreadable: {})", rel, e));
                    continue;
                }
            };

            if !self.limits.fits_total(result.total_bytes, document.byte_size) {
                info!(
                    path = %rel,
                    total_bytes = result.total_bytes,
                    "total size limit reached"
                );
                result.log.push(format!(
                    "stopped: total size limit reached ({} bytes) at {}",
                    self.limits.max_total_bytes, rel
                ));
                break;
            }

            debug!(path = %rel, kind = kind.as_str(), bytes = document.byte_size, "collected");
            result.push(document);
        }

        result.log.push(format!(
            "collected: {} files, {} bytes",
            result.documents.len(),
            result.total_bytes
        ));
        result
    }

    /// Read, sanitize, and govern one file.
    fn read_document(
        &self,
        path: &Path,
        rel: &str,
        name: &str,
        kind: DocumentKind,
    ) -> std::io::Result<(Document, Vec<Truncation>)> {
        let (raw, read_cut) = read_prefix(path, self.limits.max_file_bytes)?;

        let text = if kind == DocumentKind::Env {
            sanitize_env(&raw)
        } else {
            raw
        };

        let ext = extension_of(name).unwrap_or_default();
        let governed = self.limits.govern(text, kind, &ext);
        let mut content = governed.content;
        let mut truncations = governed.truncations;

        // A sanitized prefix can shrink below the cap; the read still cut the file.
        if read_cut && !truncations.iter().any(|t| matches!(t, Truncation::Bytes { .. })) {
            truncations.insert(
                0,
                Truncation::Bytes {
                    limit: self.limits.max_file_bytes,
                },
            );
            if !truncations.iter().any(|t| matches!(t, Truncation::Lines { .. })) {
                content = mark_truncated(content, self.limits.max_file_bytes);
            }
        }

        let truncated = !truncations.is_empty();
        Ok((
            Document::new(rel, content, kind, truncated),
            truncations,
        ))
    }
}

/// Read at most `max_bytes + 1` bytes and decode them as UTF-8.
///
/// The extra byte lets the byte cap see that the file was longer than the
/// limit. Invalid sequences are replaced, not rejected.
fn read_prefix(path: &Path, max_bytes: usize) -> std::io::Result<(String, bool)> {
    let file = std::fs::File::open(path)?;
    let mut buf = Vec::new();
    file.take(max_bytes as u64 + 1).read_to_end(&mut buf)?;
    let cut = buf.len() > max_bytes;
    Ok((String::from_utf8_lossy(&buf).into_owned(), cut))
}

/// `path` relative to `root`, `/`-separated on every platform.
fn relative_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
