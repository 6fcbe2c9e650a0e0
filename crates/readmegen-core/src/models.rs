//! Core data models used throughout readmegen.
//!
//! These types represent the documents, relevance assessments, and
//! selection outcomes that flow from the collector through the scorer
//! to the generation hand-off.

use serde::Serialize;

/// Category of a collected file, derived from its name during traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// Source code.
    Source,
    /// Structured configuration, manifests, and container build files.
    Config,
    /// Dependency lock files.
    Lock,
    /// dotenv-style secret files (always sanitized).
    Env,
    /// Documentation, license files, and anything else on the allow-lists.
    Other,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Source => "source",
            DocumentKind::Config => "config",
            DocumentKind::Lock => "lock",
            DocumentKind::Env => "env",
            DocumentKind::Other => "other",
        }
    }
}

/// One collected file: its path, sanitized and truncated content, and size.
///
/// Produced once by the collector and never mutated afterwards. `path` is
/// relative to the collection root and always uses `/` separators.
/// `byte_size` is the length of `content` in bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    pub path: String,
    pub content: String,
    pub byte_size: usize,
    pub kind: DocumentKind,
    /// Whether any size cap shortened the content.
    pub truncated: bool,
}

impl Document {
    /// Build a document, deriving `byte_size` from the final content.
    pub fn new(path: impl Into<String>, content: String, kind: DocumentKind, truncated: bool) -> Self {
        let byte_size = content.len();
        Self {
            path: path.into(),
            content,
            byte_size,
            kind,
            truncated,
        }
    }

    /// Lowercased file extension without the dot, or `""`.
    pub fn extension(&self) -> String {
        let name = self.path.rsplit('/').next().unwrap_or(&self.path);
        match name.rfind('.') {
            Some(idx) if idx > 0 => name[idx + 1..].to_ascii_lowercase(),
            _ => String::new(),
        }
    }
}

/// A [`Document`] together with its relevance assessment.
///
/// Created 1:1 for each collected document, in collection order.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredDocument {
    pub document: Document,
    /// Relevance in `[0, 5]`.
    pub score: u8,
    pub include: bool,
    pub summary: String,
    pub rationale: String,
}

impl ScoredDocument {
    pub fn path(&self) -> &str {
        &self.document.path
    }

    /// Assessment used when the scorer failed or returned malformed output.
    pub fn rejected(document: Document, rationale: impl Into<String>) -> Self {
        Self {
            document,
            score: 0,
            include: false,
            summary: String::new(),
            rationale: rationale.into(),
        }
    }
}

/// Output of one collection pass.
///
/// `total_bytes` always equals the sum of `byte_size` over `documents`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CollectionResult {
    pub documents: Vec<Document>,
    pub total_bytes: usize,
    pub log: Vec<String>,
}

impl CollectionResult {
    /// Append a document, keeping `total_bytes` in step.
    pub fn push(&mut self, document: Document) {
        self.total_bytes += document.byte_size;
        self.documents.push(document);
    }
}

/// Documents chosen for the generation step.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SelectionResult {
    pub selected: Vec<Document>,
    pub selected_paths: Vec<String>,
    pub used_fallback: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_size_follows_content() {
        let doc = Document::new("src/é.rs", "héllo".to_string(), DocumentKind::Source, false);
        assert_eq!(doc.byte_size, 6);
    }

    #[test]
    fn extension_of_nested_and_dotfiles() {
        let doc = Document::new("a/b/Main.PY", String::new(), DocumentKind::Source, false);
        assert_eq!(doc.extension(), "py");
        let env = Document::new(".env", String::new(), DocumentKind::Env, false);
        assert_eq!(env.extension(), "");
        let plain = Document::new("Dockerfile", String::new(), DocumentKind::Config, false);
        assert_eq!(plain.extension(), "");
    }

    #[test]
    fn push_tracks_total_bytes() {
        let mut result = CollectionResult::default();
        result.push(Document::new("a", "abc".into(), DocumentKind::Other, false));
        result.push(Document::new("b", "de".into(), DocumentKind::Other, false));
        assert_eq!(result.total_bytes, 5);
        assert_eq!(result.documents.len(), 2);
    }
}
