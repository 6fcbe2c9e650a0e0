//! Static traversal rule sets.
//!
//! [`TraversalRules`] decides, per filesystem entry, whether the collector
//! descends into a directory or collects a file, and which
//! [`DocumentKind`] a collected file has. The rule sets are plain data,
//! built once (from the defaults below or from configuration) and passed
//! into the collector; nothing here touches the filesystem.
//!
//! # Rules
//!
//! - A directory is skipped when its name is in `skip_dirs`.
//! - A file is collected when its lowercased extension is in
//!   `include_exts`, when its exact name is in `key_filenames`, or when it
//!   is a dotenv-style file (`.env`, `.env.local`, ...).
//! - The generated output of a previous run ([`GENERATED_OUTPUT_NAME`]) is
//!   never collected. Existing readme files are skipped unless
//!   `include_readme` is set.

use std::collections::BTreeSet;

use crate::models::DocumentKind;

/// File name of the README this tool produces downstream.
pub const GENERATED_OUTPUT_NAME: &str = "README.generated.md";

/// Name prefix identifying dotenv-style secret files.
pub const ENV_FILE_PREFIX: &str = ".env";

pub const DEFAULT_SKIP_DIRS: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    "node_modules",
    "bower_components",
    "__pycache__",
    ".pytest_cache",
    ".mypy_cache",
    ".ruff_cache",
    ".tox",
    ".venv",
    "venv",
    ".idea",
    ".vscode",
    ".vs",
    "dist",
    "build",
    "target",
    "out",
    ".next",
    ".nuxt",
    ".svelte-kit",
    ".cache",
    "coverage",
    ".gradle",
    ".terraform",
    ".eggs",
];

pub const DEFAULT_INCLUDE_EXTS: &[&str] = &[
    // source
    "py", "js", "jsx", "mjs", "cjs", "ts", "tsx", "rs", "go", "java", "kt", "kts", "swift",
    "rb", "php", "c", "h", "cc", "cpp", "hpp", "cs", "scala", "ex", "exs", "sh", "bash",
    "ps1", "sql", "html", "css", "scss", "vue", "svelte",
    // structured config / data
    "json", "yaml", "yml", "toml", "ini", "cfg", "conf", "xml", "lock",
    // documentation
    "md", "rst", "txt", "adoc",
];

pub const DEFAULT_KEY_FILENAMES: &[&str] = &[
    "Dockerfile",
    "docker-compose.yml",
    "docker-compose.yaml",
    "compose.yml",
    "compose.yaml",
    ".dockerignore",
    "Makefile",
    "Procfile",
    "Justfile",
    "package.json",
    "requirements.txt",
    "Pipfile",
    "pyproject.toml",
    "setup.py",
    "setup.cfg",
    "Cargo.toml",
    "go.mod",
    "Gemfile",
    "pom.xml",
    "build.gradle",
    "composer.json",
    "LICENSE",
    "LICENSE.md",
    "LICENSE.txt",
    "COPYING",
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "Cargo.lock",
    "poetry.lock",
    "Pipfile.lock",
    "composer.lock",
    "Gemfile.lock",
    "go.sum",
];

pub const DEFAULT_LOCK_BASENAMES: &[&str] = &[
    "package-lock.json",
    "npm-shrinkwrap.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "Cargo.lock",
    "poetry.lock",
    "Pipfile.lock",
    "composer.lock",
    "Gemfile.lock",
    "go.sum",
    "mix.lock",
];

const CONFIG_EXTS: &[&str] = &["json", "yaml", "yml", "toml", "ini", "cfg", "conf", "xml"];
const DOC_EXTS: &[&str] = &["md", "rst", "txt", "adoc"];
const README_NAMES: &[&str] = &["readme", "readme.md", "readme.rst", "readme.txt"];

/// Why a file was not collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Output of a previous run.
    GeneratedOutput,
    /// An existing readme while `include_readme` is off.
    Readme,
    /// Neither the extension nor the name is on an allow-list.
    NotAllowed,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::GeneratedOutput => "generated output",
            SkipReason::Readme => "existing readme",
            SkipReason::NotAllowed => "not on allow-list",
        }
    }
}

/// Outcome of evaluating one file entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileDecision {
    Collect(DocumentKind),
    Skip(SkipReason),
}

/// Include/skip rule sets applied during traversal.
#[derive(Debug, Clone)]
pub struct TraversalRules {
    pub skip_dirs: BTreeSet<String>,
    /// Lowercased extensions without the leading dot.
    pub include_exts: BTreeSet<String>,
    pub key_filenames: BTreeSet<String>,
    pub lock_basenames: BTreeSet<String>,
    pub include_readme: bool,
}

impl Default for TraversalRules {
    fn default() -> Self {
        Self {
            skip_dirs: to_set(DEFAULT_SKIP_DIRS),
            include_exts: to_set(DEFAULT_INCLUDE_EXTS),
            key_filenames: to_set(DEFAULT_KEY_FILENAMES),
            lock_basenames: to_set(DEFAULT_LOCK_BASENAMES),
            include_readme: false,
        }
    }
}

fn to_set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Lowercased extension of a file name, without the dot.
///
/// Leading-dot names such as `.gitignore` have no extension.
pub fn extension_of(file_name: &str) -> Option<String> {
    match file_name.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < file_name.len() => {
            Some(file_name[idx + 1..].to_ascii_lowercase())
        }
        _ => None,
    }
}

/// `true` for `.env` and its variants (`.env.local`, `.env.production`, ...).
pub fn is_env_file(file_name: &str) -> bool {
    file_name.starts_with(ENV_FILE_PREFIX)
}

impl TraversalRules {
    /// Whether the walker should enter a directory with this name.
    pub fn should_descend(&self, dir_name: &str) -> bool {
        !self.skip_dirs.contains(dir_name)
    }

    pub fn is_lock_like(&self, file_name: &str) -> bool {
        self.lock_basenames.contains(file_name)
            || extension_of(file_name).as_deref() == Some("lock")
    }

    /// Decide whether a file is collected, and as what.
    pub fn file_decision(&self, file_name: &str) -> FileDecision {
        if file_name == GENERATED_OUTPUT_NAME {
            return FileDecision::Skip(SkipReason::GeneratedOutput);
        }
        if !self.include_readme && README_NAMES.contains(&file_name.to_lowercase().as_str()) {
            return FileDecision::Skip(SkipReason::Readme);
        }

        let ext = extension_of(file_name);
        let allowed = is_env_file(file_name)
            || self.key_filenames.contains(file_name)
            || ext.as_ref().is_some_and(|e| self.include_exts.contains(e));

        if allowed {
            FileDecision::Collect(self.classify(file_name))
        } else {
            FileDecision::Skip(SkipReason::NotAllowed)
        }
    }

    /// Kind of an allowed file. Env wins over lock, lock over config.
    pub fn classify(&self, file_name: &str) -> DocumentKind {
        if is_env_file(file_name) {
            return DocumentKind::Env;
        }
        if self.is_lock_like(file_name) {
            return DocumentKind::Lock;
        }

        let ext = extension_of(file_name).unwrap_or_default();
        let upper = file_name.to_ascii_uppercase();
        if upper.starts_with("LICENSE") || upper.starts_with("COPYING") {
            return DocumentKind::Other;
        }
        if CONFIG_EXTS.contains(&ext.as_str()) || self.key_filenames.contains(file_name) {
            return DocumentKind::Config;
        }
        if DOC_EXTS.contains(&ext.as_str()) {
            return DocumentKind::Other;
        }
        DocumentKind::Source
    }
}
