//! End-to-end data preparation for one README request.
//!
//! ```text
//! root path ─► validate ─► collect ─► assess (concurrent) ─► select ─► report
//! ```
//!
//! An invalid root is the only request-level failure. Scorer errors,
//! truncation, and empty selections all land in the report's log and
//! counts, so a valid path always yields a best-effort result.

use readmegen_core::assess::RelevanceScorer;
use readmegen_core::models::{CollectionResult, ScoredDocument, SelectionResult};
use readmegen_core::select::{select, Threshold};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::assess::{assess_documents, AssessOptions};
use crate::collector::Collector;
use crate::config::Config;
use crate::error::PipelineError;
use crate::progress::{ProgressEvent, ProgressReporter};
use crate::validate::validate_root;

/// Caller input for one run.
#[derive(Debug, Clone, Default)]
pub struct PipelineRequest {
    pub root_path: String,
    /// Raw threshold input; missing or malformed values fall back to the
    /// configured default (3 unless `[selection]` says otherwise).
    pub relevance_threshold: Option<String>,
}

impl PipelineRequest {
    pub fn new(root_path: impl Into<String>) -> Self {
        Self {
            root_path: root_path.into(),
            relevance_threshold: None,
        }
    }

    pub fn with_threshold(mut self, raw: impl Into<String>) -> Self {
        self.relevance_threshold = Some(raw.into());
        self
    }
}

/// Caller-facing summary of a run, serializable as the response body.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub root: PathBuf,
    pub logs: Vec<String>,
    pub selected_paths: Vec<String>,
    pub count_collected: usize,
    pub count_selected: usize,
    pub used_fallback: bool,
    pub total_bytes: usize,
}

/// Everything a run produced: the report plus the documents behind it.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub report: PipelineReport,
    pub threshold: Threshold,
    pub collection: CollectionResult,
    pub scored: Vec<ScoredDocument>,
    pub selection: SelectionResult,
}

pub struct Pipeline {
    collector: Collector,
    scorer: Arc<dyn RelevanceScorer>,
    options: AssessOptions,
    default_threshold: Threshold,
}

impl Pipeline {
    pub fn new(collector: Collector, scorer: Arc<dyn RelevanceScorer>) -> Self {
        Self {
            collector,
            scorer,
            options: AssessOptions::default(),
            default_threshold: Threshold::default(),
        }
    }

    /// Build from a loaded config with an already-constructed scorer.
    pub fn from_config(config: &Config, scorer: Arc<dyn RelevanceScorer>) -> anyhow::Result<Self> {
        Ok(Self {
            collector: Collector::from_config(config)?,
            scorer,
            options: AssessOptions::from_config(&config.scorer),
            default_threshold: config.selection.threshold(),
        })
    }

    pub fn with_options(mut self, options: AssessOptions) -> Self {
        self.options = options;
        self
    }

    /// Validate `raw` and run one collection pass, without scoring.
    pub fn collect(
        &self,
        raw: &str,
        progress: &dyn ProgressReporter,
    ) -> Result<(PathBuf, CollectionResult), PipelineError> {
        collect_root(&self.collector, raw, progress)
    }

    /// Run validate, collect, assess, and select for one request.
    ///
    /// # Errors
    ///
    /// Only [`PipelineError::InvalidPath`], before any traversal.
    pub async fn run(
        &self,
        request: &PipelineRequest,
        progress: &dyn ProgressReporter,
    ) -> Result<PipelineOutput, PipelineError> {
        let (root, collection) = self.collect(&request.root_path, progress)?;
        let mut logs = collection.log.clone();

        let threshold = self.resolve_threshold(request.relevance_threshold.as_deref(), &mut logs);

        let assessed = assess_documents(
            self.scorer.as_ref(),
            &collection.documents,
            self.options,
            progress,
        )
        .await;
        logs.extend(assessed.log);

        progress.report(ProgressEvent::Selecting {
            threshold: threshold.value(),
        });
        let selection = select(&assessed.scored, threshold);

        if selection.used_fallback {
            logs.push(format!(
                "fallback: no document met threshold {}; using all {} collected documents",
                threshold,
                collection.documents.len()
            ));
        } else {
            logs.push(format!(
                "selected: {} of {} documents at threshold {}",
                selection.selected.len(),
                collection.documents.len(),
                threshold
            ));
        }
        for path in &selection.selected_paths {
            logs.push(format!("selected: {}", path));
        }

        info!(
            root = %root.display(),
            collected = collection.documents.len(),
            selected = selection.selected.len(),
            used_fallback = selection.used_fallback,
            scorer = self.scorer.name(),
            "pipeline complete"
        );

        let report = PipelineReport {
            root,
            logs,
            selected_paths: selection.selected_paths.clone(),
            count_collected: collection.documents.len(),
            count_selected: selection.selected.len(),
            used_fallback: selection.used_fallback,
            total_bytes: collection.total_bytes,
        };

        Ok(PipelineOutput {
            report,
            threshold,
            collection,
            scored: assessed.scored,
            selection,
        })
    }

    /// Request input wins over the configured default; malformed input
    /// falls back to the configured default with a log line.
    fn resolve_threshold(&self, raw: Option<&str>, logs: &mut Vec<String>) -> Threshold {
        if raw.is_none() {
            return self.default_threshold;
        }
        let coerced = Threshold::coerce(raw);
        match coerced.rejected_input {
            Some(bad) => {
                warn!(input = %bad, "invalid relevance threshold");
                logs.push(format!(
                    "relevance threshold '{}' invalid; using {}",
                    bad, self.default_threshold
                ));
                self.default_threshold
            }
            None => coerced.threshold,
        }
    }
}

/// Validate `raw` and run one collection pass with `collector`.
///
/// Shared by [`Pipeline::collect`] and the `collect` command, which has no
/// scorer to build a full pipeline with.
pub fn collect_root(
    collector: &Collector,
    raw: &str,
    progress: &dyn ProgressReporter,
) -> Result<(PathBuf, CollectionResult), PipelineError> {
    let root = validate_root(raw)?;
    progress.report(ProgressEvent::Collecting {
        root: root.display().to_string(),
    });
    let collection = collector.collect(&root);
    Ok((root, collection))
}
