//! Pipeline progress reporting.
//!
//! Reports observable progress while a project is collected and scored so
//! users see which directory is being walked and how many documents are
//! left to score. Progress is emitted on **stderr** so stdout remains
//! parseable for scripts.

use std::io::Write;

/// A single progress event for one pipeline run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ProgressEvent {
    /// Walking the project directory. Total unknown.
    Collecting { root: String },
    /// Scoring: n documents assessed out of total.
    Scoring { n: u64, total: u64 },
    /// Applying the relevance threshold.
    Selecting { threshold: u8 },
}

/// Reports pipeline progress. Implementations write to stderr (human or JSON).
pub trait ProgressReporter: Send + Sync {
    /// Emit a progress event. Called from the pipeline and the scoring driver.
    fn report(&self, event: ProgressEvent);
}

/// Human-friendly progress on stderr: "readmegen  scoring  12 / 1,400 files".
pub struct StderrProgress;

impl ProgressReporter for StderrProgress {
    fn report(&self, event: ProgressEvent) {
        let line = match &event {
            ProgressEvent::Collecting { root } => {
                format!("readmegen  collecting {}...\n", root)
            }
            ProgressEvent::Scoring { n, total } => {
                format!(
                    "readmegen  scoring  {} / {} files\n",
                    format_number(*n),
                    format_number(*total)
                )
            }
            ProgressEvent::Selecting { threshold } => {
                format!("readmegen  selecting (threshold {})\n", threshold)
            }
        };
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
        let _ = std::io::stderr().lock().flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl JsonProgress {
    fn to_json(event: &ProgressEvent) -> serde_json::Value {
        match event {
            ProgressEvent::Collecting { root } => serde_json::json!({
                "event": "progress",
                "phase": "collecting",
                "root": root
            }),
            ProgressEvent::Scoring { n, total } => serde_json::json!({
                "event": "progress",
                "phase": "scoring",
                "n": n,
                "total": total
            }),
            ProgressEvent::Selecting { threshold } => serde_json::json!({
                "event": "progress",
                "phase": "selecting",
                "threshold": threshold
            }),
        }
    }
}

impl ProgressReporter for JsonProgress {
    fn report(&self, event: ProgressEvent) {
        if let Ok(line) = serde_json::to_string(&Self::to_json(&event)) {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
            let _ = std::io::stderr().lock().flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _event: ProgressEvent) {}
}

fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    /// Parse a `--progress` value.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "off" | "none" => Some(ProgressMode::Off),
            "human" => Some(ProgressMode::Human),
            "json" => Some(ProgressMode::Json),
            _ => None,
        }
    }

    pub fn reporter(&self) -> Box<dyn ProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
