//! Selection policy over scored documents.
//!
//! Two terminal states:
//!
//! - **Thresholded**: documents with `include == true` and
//!   `score >= threshold`, in collection order. Used whenever this set is
//!   non-empty.
//! - **Fallback**: every collected document, ignoring scores, when the
//!   thresholded set is empty.
//!
//! The outcome depends only on the scored documents and the threshold, so
//! scoring order and concurrency cannot change it.

use crate::models::{ScoredDocument, SelectionResult};

pub const DEFAULT_THRESHOLD: u8 = 3;

/// A relevance threshold in `[0, 5]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Threshold(u8);

impl Default for Threshold {
    fn default() -> Self {
        Threshold(DEFAULT_THRESHOLD)
    }
}

/// Result of coercing caller-supplied threshold input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coerced {
    pub threshold: Threshold,
    /// Set when the input was rejected and the default used instead.
    pub rejected_input: Option<String>,
}

impl Threshold {
    /// Strict constructor; `None` outside `[0, 5]`.
    pub fn new(value: i64) -> Option<Self> {
        (0..=5).contains(&value).then_some(Threshold(value as u8))
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    /// Lenient parse of request input.
    ///
    /// Missing input yields the default. Non-numeric or out-of-range input
    /// also yields the default, with the raw input reported back so the
    /// caller can log it.
    ///
    /// ```rust
    /// use readmegen_core::select::Threshold;
    ///
    /// assert_eq!(Threshold::coerce(Some("4")).threshold.value(), 4);
    /// assert_eq!(Threshold::coerce(Some("high")).threshold.value(), 3);
    /// assert_eq!(Threshold::coerce(None).threshold.value(), 3);
    /// ```
    pub fn coerce(raw: Option<&str>) -> Coerced {
        let Some(raw) = raw else {
            return Coerced {
                threshold: Threshold::default(),
                rejected_input: None,
            };
        };
        match raw.trim().parse::<i64>().ok().and_then(Threshold::new) {
            Some(threshold) => Coerced {
                threshold,
                rejected_input: None,
            },
            None => Coerced {
                threshold: Threshold::default(),
                rejected_input: Some(raw.to_string()),
            },
        }
    }
}

impl std::fmt::Display for Threshold {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether a scored document clears the threshold.
pub fn passes(scored: &ScoredDocument, threshold: Threshold) -> bool {
    scored.include && scored.score >= threshold.value()
}

/// Apply the threshold, falling back to every document when none passes.
///
/// `scored` must be in collection order, one entry per collected document.
pub fn select(scored: &[ScoredDocument], threshold: Threshold) -> SelectionResult {
    let passing: Vec<&ScoredDocument> = scored.iter().filter(|s| passes(s, threshold)).collect();

    let (selected, used_fallback) = if passing.is_empty() {
        (scored.iter().map(|s| s.document.clone()).collect::<Vec<_>>(), true)
    } else {
        (passing.into_iter().map(|s| s.document.clone()).collect(), false)
    };

    let selected_paths = selected.iter().map(|d| d.path.clone()).collect();
    SelectionResult {
        selected,
        selected_paths,
        used_fallback,
    }
}
