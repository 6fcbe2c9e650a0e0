//! TOML configuration.
//!
//! Every section is optional. A missing file section falls back to the
//! built-in defaults, so `Config::default()` is a complete configuration.
//!
//! ```toml
//! [collector]
//! skip_dirs = ["node_modules", ".git", "target"]
//! exclude_globs = ["**/fixtures/**"]
//! include_readme = false
//!
//! [limits]
//! max_file_bytes = 524288
//! max_total_bytes = 5242880
//! lock_max_lines = 200
//! config_max_lines = 800
//!
//! [scorer]
//! provider = "openai"
//! model = "gpt-4o-mini"
//! max_concurrency = 8
//!
//! [selection]
//! relevance_threshold = 3
//! ```

use anyhow::{Context, Result};
use readmegen_core::limits::{
    SizeLimits, DEFAULT_CONFIG_MAX_LINES, DEFAULT_LOCK_MAX_LINES, DEFAULT_MAX_FILE_BYTES,
    DEFAULT_MAX_TOTAL_BYTES,
};
use readmegen_core::rules::TraversalRules;
use readmegen_core::select::{Threshold, DEFAULT_THRESHOLD};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub collector: CollectorConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub scorer: ScorerConfig,
    #[serde(default)]
    pub selection: SelectionConfig,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CollectorConfig {
    /// Replaces the built-in directory skip-set when present.
    #[serde(default)]
    pub skip_dirs: Option<Vec<String>>,
    /// Replaces the built-in extension allow-set when present.
    #[serde(default)]
    pub include_exts: Option<Vec<String>>,
    /// Replaces the built-in key-file allow-set when present.
    #[serde(default)]
    pub key_filenames: Option<Vec<String>>,
    #[serde(default)]
    pub lock_basenames: Option<Vec<String>>,
    /// Extra glob patterns (relative paths) that are never collected.
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub include_readme: bool,
    #[serde(default)]
    pub follow_symlinks: bool,
}

impl CollectorConfig {
    /// Build the traversal rule sets, overlaying configured lists on the defaults.
    pub fn rules(&self) -> TraversalRules {
        let defaults = TraversalRules::default();
        let set = |items: &Option<Vec<String>>, fallback: BTreeSet<String>| -> BTreeSet<String> {
            match items {
                Some(list) => list.iter().cloned().collect(),
                None => fallback,
            }
        };
        TraversalRules {
            skip_dirs: set(&self.skip_dirs, defaults.skip_dirs),
            include_exts: match &self.include_exts {
                Some(list) => list
                    .iter()
                    .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                    .collect(),
                None => defaults.include_exts,
            },
            key_filenames: set(&self.key_filenames, defaults.key_filenames),
            lock_basenames: set(&self.lock_basenames, defaults.lock_basenames),
            include_readme: self.include_readme,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LimitsConfig {
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: usize,
    #[serde(default = "default_max_total_bytes")]
    pub max_total_bytes: usize,
    #[serde(default = "default_lock_max_lines")]
    pub lock_max_lines: usize,
    #[serde(default = "default_config_max_lines")]
    pub config_max_lines: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            max_total_bytes: DEFAULT_MAX_TOTAL_BYTES,
            lock_max_lines: DEFAULT_LOCK_MAX_LINES,
            config_max_lines: DEFAULT_CONFIG_MAX_LINES,
        }
    }
}

fn default_max_file_bytes() -> usize {
    DEFAULT_MAX_FILE_BYTES
}
fn default_max_total_bytes() -> usize {
    DEFAULT_MAX_TOTAL_BYTES
}
fn default_lock_max_lines() -> usize {
    DEFAULT_LOCK_MAX_LINES
}
fn default_config_max_lines() -> usize {
    DEFAULT_CONFIG_MAX_LINES
}

impl LimitsConfig {
    pub fn limits(&self) -> SizeLimits {
        SizeLimits {
            max_file_bytes: self.max_file_bytes,
            max_total_bytes: self.max_total_bytes,
            lock_max_lines: self.lock_max_lines,
            config_max_lines: self.config_max_lines,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScorerConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    /// Base URL override (Ollama host, or an OpenAI-compatible endpoint).
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Deadline for scoring one document, retries and backoff included.
    #[serde(default = "default_document_timeout_secs")]
    pub document_timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    #[serde(default = "default_sample_chars")]
    pub sample_chars: usize,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            url: None,
            timeout_secs: default_timeout_secs(),
            document_timeout_secs: default_document_timeout_secs(),
            max_retries: default_max_retries(),
            max_concurrency: default_max_concurrency(),
            sample_chars: default_sample_chars(),
        }
    }
}

fn default_provider() -> String {
    "heuristic".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_document_timeout_secs() -> u64 {
    120
}
fn default_max_retries() -> u32 {
    3
}
fn default_max_concurrency() -> usize {
    8
}
fn default_sample_chars() -> usize {
    4000
}

impl ScorerConfig {
    pub fn is_remote(&self) -> bool {
        matches!(self.provider.as_str(), "openai" | "ollama")
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SelectionConfig {
    #[serde(default = "default_relevance_threshold")]
    pub relevance_threshold: i64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            relevance_threshold: default_relevance_threshold(),
        }
    }
}

fn default_relevance_threshold() -> i64 {
    DEFAULT_THRESHOLD as i64
}

impl SelectionConfig {
    /// The configured threshold; validated by [`load_config`].
    pub fn threshold(&self) -> Threshold {
        Threshold::new(self.relevance_threshold).unwrap_or_default()
    }
}

/// Load and validate a configuration file.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

/// Load `path` when given, otherwise use the built-in defaults.
pub fn load_or_default(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(p) => load_config(p),
        None => Ok(Config::default()),
    }
}

pub fn validate(config: &Config) -> Result<()> {
    // Validate limits
    let limits = &config.limits;
    if limits.max_file_bytes == 0 || limits.max_total_bytes == 0 {
        anyhow::bail!("limits.max_file_bytes and limits.max_total_bytes must be > 0");
    }
    if limits.max_file_bytes > limits.max_total_bytes {
        anyhow::bail!("limits.max_file_bytes must be <= limits.max_total_bytes");
    }
    if limits.lock_max_lines == 0 || limits.config_max_lines == 0 {
        anyhow::bail!("limits.lock_max_lines and limits.config_max_lines must be > 0");
    }

    // Validate scorer
    match config.scorer.provider.as_str() {
        "heuristic" | "openai" | "ollama" | "disabled" => {}
        other => anyhow::bail!(
            "Unknown scorer provider: '{}'. Must be heuristic, openai, ollama, or disabled.",
            other
        ),
    }
    if config.scorer.is_remote() && config.scorer.model.is_none() {
        anyhow::bail!(
            "scorer.model must be specified when provider is '{}'",
            config.scorer.provider
        );
    }
    if config.scorer.max_concurrency == 0 {
        anyhow::bail!("scorer.max_concurrency must be >= 1");
    }
    if config.scorer.timeout_secs == 0 || config.scorer.document_timeout_secs == 0 {
        anyhow::bail!("scorer.timeout_secs and scorer.document_timeout_secs must be > 0");
    }

    // Validate selection
    if Threshold::new(config.selection.relevance_threshold).is_none() {
        anyhow::bail!("selection.relevance_threshold must be in [0, 5]");
    }

    Ok(())
}
