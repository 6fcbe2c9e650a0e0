//! Relevance scoring contract.
//!
//! A [`RelevanceScorer`] is an opaque, possibly slow and unreliable
//! capability (usually a language model behind an HTTP API) that rates one
//! [`Document`] at a time. Scorers return the raw JSON object they
//! received; [`validate_assessment`] is the single gate that turns it into
//! an [`Assessment`]. Anything that fails validation is rejected, never
//! silently coerced.
//!
//! Concrete scorers (OpenAI, Ollama, the offline heuristic) and the
//! concurrent driver live in the `readmegen` app crate.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::models::{Document, ScoredDocument};

/// Highest relevance score a scorer may return.
pub const MAX_SCORE: i64 = 5;

/// Rates how useful one document is for writing the project README.
///
/// # Example
///
/// ```rust
/// use anyhow::Result;
/// use async_trait::async_trait;
/// use readmegen_core::assess::RelevanceScorer;
/// use readmegen_core::models::Document;
/// use serde_json::{json, Value};
///
/// struct Everything;
///
/// #[async_trait]
/// impl RelevanceScorer for Everything {
///     fn name(&self) -> &str { "everything" }
///
///     async fn score(&self, document: &Document) -> Result<Value> {
///         Ok(json!({ "path": document.path, "score": 5, "include": true }))
///     }
/// }
/// ```
#[async_trait]
pub trait RelevanceScorer: Send + Sync {
    /// Short identifier used in log lines (e.g. `"openai:gpt-4o-mini"`).
    fn name(&self) -> &str;

    /// Rate one document.
    ///
    /// Returns the structured response as JSON, expected to carry
    /// `score` (integer 0-5), `include` (boolean), and optionally
    /// `summary` and `rationale` (or `reason`). Transport failures are
    /// returned as errors.
    async fn score(&self, document: &Document) -> Result<Value>;
}

/// A validated relevance response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assessment {
    pub score: u8,
    pub include: bool,
    pub summary: String,
    pub rationale: String,
}

impl Assessment {
    pub fn into_scored(self, document: Document) -> ScoredDocument {
        ScoredDocument {
            document,
            score: self.score,
            include: self.include,
            summary: self.summary,
            rationale: self.rationale,
        }
    }
}

/// Structural problems in a scorer response.
#[derive(Debug, Error, PartialEq)]
pub enum AssessmentError {
    #[error("response is not a JSON object")]
    NotAnObject,

    #[error("response is missing field '{0}'")]
    MissingField(&'static str),

    #[error("score is not an integer: {0}")]
    ScoreNotInteger(String),

    #[error("score {0} is outside 0..={max}", max = MAX_SCORE)]
    ScoreOutOfRange(i64),

    #[error("include is not a boolean: {0}")]
    IncludeNotBoolean(String),
}

/// Validate a raw scorer response.
///
/// `score` must be a JSON integer in `[0, 5]` and `include` a JSON
/// boolean; numeric strings and floats are rejected. `summary` and
/// `rationale` default to empty when absent; `reason` is accepted as an
/// alias for `rationale`.
pub fn validate_assessment(value: &Value) -> Result<Assessment, AssessmentError> {
    let obj = value.as_object().ok_or(AssessmentError::NotAnObject)?;

    let raw_score = obj.get("score").ok_or(AssessmentError::MissingField("score"))?;
    let score = raw_score
        .as_i64()
        .ok_or_else(|| AssessmentError::ScoreNotInteger(raw_score.to_string()))?;
    if !(0..=MAX_SCORE).contains(&score) {
        return Err(AssessmentError::ScoreOutOfRange(score));
    }

    let raw_include = obj
        .get("include")
        .ok_or(AssessmentError::MissingField("include"))?;
    let include = raw_include
        .as_bool()
        .ok_or_else(|| AssessmentError::IncludeNotBoolean(raw_include.to_string()))?;

    let text = |key: &str| obj.get(key).and_then(|v| v.as_str()).map(str::to_string);

    Ok(Assessment {
        score: score as u8,
        include,
        summary: text("summary").unwrap_or_default(),
        rationale: text("rationale")
            .or_else(|| text("reason"))
            .unwrap_or_default(),
    })
}

/// Clip document content to a prompt-sized sample.
///
/// Counts characters, not bytes. Clipped samples end with a truncation
/// marker so the scorer knows it is looking at a prefix.
pub fn clip_sample(content: &str, max_chars: usize) -> String {
    match content.char_indices().nth(max_chars) {
        None => content.to_string(),
        Some((idx, _)) => format!("{}\n\n# ...truncated...\n", &content[..idx]),
    }
}
