//! Offline path-based scorer.
//!
//! Rates a document from its path and kind alone, mapped onto the same
//! 0-5 onboarding rubric the model-backed scorers use. Deterministic and
//! free, which makes it the default when no model is configured.

use anyhow::Result;
use async_trait::async_trait;
use readmegen_core::assess::RelevanceScorer;
use readmegen_core::models::{Document, DocumentKind};
use serde_json::{json, Value};

const MANIFESTS: &[&str] = &[
    "package.json",
    "pyproject.toml",
    "setup.py",
    "requirements.txt",
    "Pipfile",
    "Cargo.toml",
    "go.mod",
    "Gemfile",
    "pom.xml",
    "build.gradle",
    "composer.json",
    "Dockerfile",
    "docker-compose.yml",
    "docker-compose.yaml",
    "compose.yml",
    "compose.yaml",
    "Makefile",
    "Procfile",
    "Justfile",
];

const ENTRY_STEMS: &[&str] = &["main", "app", "index", "server", "cli", "manage", "wsgi", "asgi"];
const ENTRY_FILES: &[&str] = &["main.rs", "lib.rs", "__main__.py"];

const INTEGRATION_DIRS: &[&str] = &[
    "api",
    "routes",
    "routers",
    "handlers",
    "controllers",
    "models",
    "services",
    "pages",
    "providers",
    "db",
    "database",
];
const CORE_DIRS: &[&str] = &["src", "lib", "app", "core", "pkg", "internal", "cmd"];
const TEST_DIRS: &[&str] = &["test", "tests", "spec", "__tests__"];
const LOW_DIRS: &[&str] = &[
    "fixtures",
    "mocks",
    "examples",
    "vendor",
    "third_party",
    "migrations",
    "scripts",
];

pub struct HeuristicScorer;

impl HeuristicScorer {
    /// Score and a one-line reason for `document`.
    pub fn rate(document: &Document) -> (u8, &'static str) {
        let path = document.path.as_str();
        let components: Vec<&str> = path.split('/').collect();
        let (dirs, file) = components.split_at(components.len().saturating_sub(1));
        let file = file.first().copied().unwrap_or(path);
        let stem = file.split('.').next().unwrap_or(file);
        let in_dir = |set: &[&str]| dirs.iter().any(|d| set.contains(d));

        match document.kind {
            DocumentKind::Lock => return (1, "dependency lock file"),
            DocumentKind::Env => return (5, "environment variable schema"),
            _ => {}
        }

        if in_dir(LOW_DIRS) {
            return (1, "fixture, example, or vendored file");
        }
        if in_dir(TEST_DIRS)
            || file.starts_with("test_")
            || file.contains("_test.")
            || file.contains(".test.")
            || file.contains(".spec.")
        {
            return (2, "test file");
        }
        if file == "__init__.py" {
            return (1, "package marker");
        }
        if MANIFESTS.contains(&file) {
            return (5, "project manifest or container file");
        }
        if ENTRY_FILES.contains(&file)
            || (document.kind == DocumentKind::Source && ENTRY_STEMS.contains(&stem))
        {
            return (5, "entry point");
        }
        if dirs.starts_with(&[".github", "workflows"]) {
            return (4, "CI workflow");
        }
        if stem == "config" || stem == "settings" {
            return (4, "application configuration");
        }
        if document.kind == DocumentKind::Source && in_dir(INTEGRATION_DIRS) {
            return (4, "integration module");
        }

        match document.kind {
            DocumentKind::Config => (3, "tooling configuration"),
            DocumentKind::Other => (3, "documentation or license"),
            DocumentKind::Source if in_dir(CORE_DIRS) || dirs.is_empty() => (3, "core module"),
            _ => (2, "minor helper"),
        }
    }
}

#[async_trait]
impl RelevanceScorer for HeuristicScorer {
    fn name(&self) -> &str {
        "heuristic"
    }

    async fn score(&self, document: &Document) -> Result<Value> {
        let (score, reason) = Self::rate(document);
        Ok(json!({
            "path": document.path,
            "score": score,
            "include": score >= 3,
            "reason": reason,
            "summary": format!("{} ({})", document.path, reason),
        }))
    }
}
