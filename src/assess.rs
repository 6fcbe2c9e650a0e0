//! Concurrent relevance assessment.
//!
//! Runs a [`RelevanceScorer`] over every collected document with bounded
//! concurrency and a per-document deadline, then validates each response.
//! Results come back in collection order no matter which call finishes
//! first. A failed, timed-out, or malformed response turns into
//! `score = 0, include = false` for that document alone, with a log line;
//! the batch always completes.

use futures::stream::{self, StreamExt};
use readmegen_core::assess::{validate_assessment, RelevanceScorer};
use readmegen_core::models::{Document, ScoredDocument};
use std::time::Duration;
use tracing::warn;

use crate::config::ScorerConfig;
use crate::progress::{ProgressEvent, ProgressReporter};

/// Concurrency and deadline for one assessment run.
#[derive(Debug, Clone, Copy)]
pub struct AssessOptions {
    pub max_concurrency: usize,
    /// Deadline for a single document, retries included.
    pub timeout: Option<Duration>,
}

impl Default for AssessOptions {
    fn default() -> Self {
        Self {
            max_concurrency: 8,
            timeout: None,
        }
    }
}

impl AssessOptions {
    pub fn from_config(config: &ScorerConfig) -> Self {
        Self {
            max_concurrency: config.max_concurrency.max(1),
            timeout: Some(Duration::from_secs(config.document_timeout_secs)),
        }
    }
}

/// Scored documents plus the log lines for every rejected response.
#[derive(Debug, Default)]
pub struct AssessOutcome {
    pub scored: Vec<ScoredDocument>,
    pub log: Vec<String>,
}

/// Score every document, preserving input order.
pub async fn assess_documents(
    scorer: &dyn RelevanceScorer,
    documents: &[Document],
    options: AssessOptions,
    progress: &dyn ProgressReporter,
) -> AssessOutcome {
    let total = documents.len() as u64;

    // `buffered` yields in input order while running up to N calls at once.
    let results: Vec<Result<ScoredDocument, (ScoredDocument, String)>> =
        stream::iter(documents.iter().cloned())
            .map(|document| score_one(scorer, document, options.timeout))
            .buffered(options.max_concurrency.max(1))
            .enumerate()
            .map(|(i, result)| {
                progress.report(ProgressEvent::Scoring {
                    n: i as u64 + 1,
                    total,
                });
                result
            })
            .collect()
            .await;

    let mut outcome = AssessOutcome::default();
    for result in results {
        match result {
            Ok(scored) => outcome.scored.push(scored),
            Err((rejected, line)) => {
                outcome.log.push(line);
                outcome.scored.push(rejected);
            }
        }
    }
    outcome
}

async fn score_one(
    scorer: &dyn RelevanceScorer,
    document: Document,
    timeout: Option<Duration>,
) -> Result<ScoredDocument, (ScoredDocument, String)> {
    let call = scorer.score(&document);
    let response = match timeout {
        Some(limit) => match tokio::time::timeout(limit, call).await {
            Ok(response) => response,
            Err(_) => Err(anyhow::anyhow!("timed out after {}s", limit.as_secs())),
        },
        None => call.await,
    };

    let failure = match response {
        Ok(value) => match validate_assessment(&value) {
            Ok(assessment) => return Ok(assessment.into_scored(document)),
            Err(e) => format!("malformed response: {}", e),
        },
        Err(e) => format!("scorer error: {:#}", e),
    };

    warn!(path = %document.path, scorer = scorer.name(), reason = %failure, "assessment rejected");
    let line = format!(
        "assessment failed: {} ({}); treated as score 0, include false",
        document.path, failure
    );
    Err((ScoredDocument::rejected(document, failure), line))
}
