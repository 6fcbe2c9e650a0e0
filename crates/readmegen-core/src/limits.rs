//! Size governance: per-file byte cap, category line caps, and the
//! aggregate budget checked by the collector.
//!
//! All limits are plain numbers in [`SizeLimits`], fixed for the lifetime
//! of a collection pass. The per-file steps run in this order:
//!
//! 1. **Byte cap**: content longer than `max_file_bytes` is cut to a
//!    prefix and [`TRUNCATION_MARKER`] is appended. The marker counts
//!    toward the cap, so the result never exceeds `max_file_bytes`.
//! 2. **Line cap**: lock files keep their first `lock_max_lines` lines;
//!    `.json`, `.yaml` and `.yml` files keep their first
//!    `config_max_lines` lines. The cut keeps exactly that many lines.
//!
//! The aggregate budget is enforced by the collector with
//! [`SizeLimits::fits_total`]: collection stops at the first document that
//! would push the running total past `max_total_bytes`.

use crate::models::DocumentKind;

pub const DEFAULT_MAX_FILE_BYTES: usize = 512 * 1024;
pub const DEFAULT_MAX_TOTAL_BYTES: usize = 5 * 1024 * 1024;
pub const DEFAULT_LOCK_MAX_LINES: usize = 200;
pub const DEFAULT_CONFIG_MAX_LINES: usize = 800;

/// Appended to content cut by the byte cap.
pub const TRUNCATION_MARKER: &str = "\n# ...truncated...\n";

const LINE_CAPPED_CONFIG_EXTS: &[&str] = &["json", "yaml", "yml"];

/// The four size limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeLimits {
    pub max_file_bytes: usize,
    pub max_total_bytes: usize,
    pub lock_max_lines: usize,
    pub config_max_lines: usize,
}

impl Default for SizeLimits {
    fn default() -> Self {
        Self {
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            max_total_bytes: DEFAULT_MAX_TOTAL_BYTES,
            lock_max_lines: DEFAULT_LOCK_MAX_LINES,
            config_max_lines: DEFAULT_CONFIG_MAX_LINES,
        }
    }
}

/// A cap that shortened a file's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Truncation {
    Bytes { limit: usize },
    Lines { limit: usize },
}

impl std::fmt::Display for Truncation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Truncation::Bytes { limit } => write!(f, "{} bytes", limit),
            Truncation::Lines { limit } => write!(f, "{} lines", limit),
        }
    }
}

/// Content after the per-file caps, with the caps that fired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Governed {
    pub content: String,
    pub truncations: Vec<Truncation>,
}

impl SizeLimits {
    /// Line cap for a file of this kind and extension, if any.
    pub fn line_cap(&self, kind: DocumentKind, ext: &str) -> Option<usize> {
        if kind == DocumentKind::Lock {
            return Some(self.lock_max_lines);
        }
        if LINE_CAPPED_CONFIG_EXTS.contains(&ext) {
            return Some(self.config_max_lines);
        }
        None
    }

    /// Apply the byte cap, then the line cap.
    pub fn govern(&self, content: String, kind: DocumentKind, ext: &str) -> Governed {
        let mut truncations = Vec::new();

        let (mut content, cut) = cap_bytes(content, self.max_file_bytes);
        if cut {
            truncations.push(Truncation::Bytes {
                limit: self.max_file_bytes,
            });
        }

        if let Some(limit) = self.line_cap(kind, ext) {
            let (capped, cut) = head_lines(content, limit);
            content = capped;
            if cut {
                truncations.push(Truncation::Lines { limit });
            }
        }

        Governed {
            content,
            truncations,
        }
    }

    /// Whether a document of `byte_size` still fits after `running_total`.
    pub fn fits_total(&self, running_total: usize, byte_size: usize) -> bool {
        running_total.saturating_add(byte_size) <= self.max_total_bytes
    }
}

/// Cut `text` to at most `max_bytes` bytes, marker included.
///
/// The cut lands on the nearest UTF-8 character boundary at or below the
/// target so the result stays valid text. Returns whether a cut happened.
pub fn cap_bytes(mut text: String, max_bytes: usize) -> (String, bool) {
    if text.len() <= max_bytes {
        return (text, false);
    }
    let (budget, marker) = if max_bytes > TRUNCATION_MARKER.len() {
        (max_bytes - TRUNCATION_MARKER.len(), TRUNCATION_MARKER)
    } else {
        (max_bytes, "")
    };
    let cut = floor_char_boundary(&text, budget);
    text.truncate(cut);
    text.push_str(marker);
    (text, true)
}

/// Append [`TRUNCATION_MARKER`] to `text` that was cut before it got here,
/// trimming it so the result still fits in `max_bytes`.
///
/// Used when the cut happened upstream (a bounded read) and a later rewrite
/// brought the content back under the cap. Without room for the marker the
/// text is returned as is.
pub fn mark_truncated(mut text: String, max_bytes: usize) -> String {
    if max_bytes <= TRUNCATION_MARKER.len() || text.ends_with(TRUNCATION_MARKER) {
        return text;
    }
    let cut = floor_char_boundary(&text, max_bytes - TRUNCATION_MARKER.len());
    text.truncate(cut);
    text.push_str(TRUNCATION_MARKER);
    text
}

/// Keep the first `max_lines` lines of `text`.
///
/// When a cut happens the result holds exactly `max_lines` lines, each
/// terminated by `\n`. Returns whether a cut happened.
pub fn head_lines(text: String, max_lines: usize) -> (String, bool) {
    if text.lines().count() <= max_lines {
        return (text, false);
    }
    let mut out = String::new();
    for line in text.lines().take(max_lines) {
        out.push_str(line);
        out.push('\n');
    }
    (out, true)
}

fn floor_char_boundary(s: &str, mut index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    while !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}
