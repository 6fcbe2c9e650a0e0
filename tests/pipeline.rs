//! End-to-end tests for the collection and selection pipeline.
//!
//! Scorers here are in-memory fakes implementing `RelevanceScorer`, so the
//! tests exercise the real collector, assessment driver, and selection
//! policy without any network access.

use anyhow::{bail, Result};
use async_trait::async_trait;
use readmegen::assess::AssessOptions;
use readmegen::collector::Collector;
use readmegen::config::Config;
use readmegen::context::format_context;
use readmegen::error::PipelineError;
use readmegen::pipeline::{Pipeline, PipelineRequest};
use readmegen::progress::NoProgress;
use readmegen_core::assess::RelevanceScorer;
use readmegen_core::limits::SizeLimits;
use readmegen_core::models::Document;
use readmegen_core::rules::TraversalRules;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

// ─── Test Scorers ───────────────────────────────────────────────────

/// Returns a fixed `(score, include)` per path; unknown paths score 0.
struct TableScorer {
    table: HashMap<&'static str, (u8, bool)>,
    calls: AtomicUsize,
}

impl TableScorer {
    fn new(entries: &[(&'static str, u8, bool)]) -> Self {
        Self {
            table: entries.iter().map(|(p, s, i)| (*p, (*s, *i))).collect(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl RelevanceScorer for TableScorer {
    fn name(&self) -> &str {
        "table"
    }

    async fn score(&self, document: &Document) -> Result<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let (score, include) = self
            .table
            .get(document.path.as_str())
            .copied()
            .unwrap_or((0, false));
        Ok(json!({
            "path": document.path,
            "score": score,
            "include": include,
            "summary": format!("summary of {}", document.path),
            "rationale": "table lookup",
        }))
    }
}

/// Answers with stringly-typed fields, which must be rejected.
struct SloppyScorer;

#[async_trait]
impl RelevanceScorer for SloppyScorer {
    fn name(&self) -> &str {
        "sloppy"
    }

    async fn score(&self, _document: &Document) -> Result<Value> {
        Ok(json!({ "score": "5", "include": "yes" }))
    }
}

/// Fails for one path, hangs for another, rates the rest 4.
struct FlakyScorer;

#[async_trait]
impl RelevanceScorer for FlakyScorer {
    fn name(&self) -> &str {
        "flaky"
    }

    async fn score(&self, document: &Document) -> Result<Value> {
        match document.path.as_str() {
            "broken.py" => bail!("429 Too Many Requests"),
            "slow.py" => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(json!({ "score": 5, "include": true }))
            }
            _ => Ok(json!({ "score": 4, "include": true })),
        }
    }
}

/// Finishes documents in reverse order of their path length.
struct JitterScorer;

#[async_trait]
impl RelevanceScorer for JitterScorer {
    fn name(&self) -> &str {
        "jitter"
    }

    async fn score(&self, document: &Document) -> Result<Value> {
        let delay = 200u64.saturating_sub(document.path.len() as u64 * 10);
        tokio::time::sleep(Duration::from_millis(delay)).await;
        let score = (document.path.len() % 6) as u8;
        Ok(json!({ "score": score, "include": score % 2 == 0 }))
    }
}

// ─── Fixtures ───────────────────────────────────────────────────────

/// `a.py` (50 bytes), `b.lock` (300 lines), and `.env` with one secret.
fn scenario_project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();

    let mut a = String::from("def main():\n    print('hello from a')\n");
    while a.len() < 50 {
        a.push('#');
    }
    fs::write(root.join("a.py"), a).unwrap();

    let lock: String = (0..300).map(|i| format!("pkg-{} 1.0.{}\n", i, i)).collect();
    fs::write(root.join("b.lock"), lock).unwrap();

    fs::write(root.join(".env"), "SECRET=topsecret\n").unwrap();
    tmp
}

fn default_collector() -> Collector {
    Collector::new(TraversalRules::default(), SizeLimits::default())
}

fn scenario_scorer() -> Arc<TableScorer> {
    Arc::new(TableScorer::new(&[
        ("a.py", 4, true),
        ("b.lock", 1, false),
        (".env", 2, false),
    ]))
}

fn request(tmp: &TempDir) -> PipelineRequest {
    PipelineRequest::new(tmp.path().to_str().unwrap())
}

// ─── Scenarios ──────────────────────────────────────────────────────

#[tokio::test]
async fn threshold_three_selects_the_relevant_file() {
    let tmp = scenario_project();
    let pipeline = Pipeline::new(default_collector(), scenario_scorer());

    let output = pipeline
        .run(&request(&tmp).with_threshold("3"), &NoProgress)
        .await
        .unwrap();

    assert_eq!(output.report.selected_paths, vec!["a.py"]);
    assert!(!output.report.used_fallback);
    assert_eq!(output.report.count_collected, 3);
    assert_eq!(output.report.count_selected, 1);

    let docs = &output.collection.documents;
    let env = docs.iter().find(|d| d.path == ".env").unwrap();
    assert_eq!(env.content, "SECRET=<YOUR_VALUE>\n");

    let lock = docs.iter().find(|d| d.path == "b.lock").unwrap();
    assert_eq!(lock.content.lines().count(), 200);
    assert!(lock.truncated);
    assert!(output
        .report
        .logs
        .contains(&"truncated: b.lock to 200 lines".to_string()));

    let a = docs.iter().find(|d| d.path == "a.py").unwrap();
    assert_eq!(a.byte_size, 50);
}

#[tokio::test]
async fn threshold_five_falls_back_to_everything() {
    let tmp = scenario_project();
    let pipeline = Pipeline::new(default_collector(), scenario_scorer());

    let output = pipeline
        .run(&request(&tmp).with_threshold("5"), &NoProgress)
        .await
        .unwrap();

    assert!(output.report.used_fallback);
    assert_eq!(output.report.selected_paths, vec![".env", "a.py", "b.lock"]);
    assert!(output
        .report
        .logs
        .iter()
        .any(|l| l.starts_with("fallback: no document met threshold 5")));
}

#[tokio::test]
async fn file_root_is_rejected_before_scoring() {
    let tmp = scenario_project();
    let scorer = scenario_scorer();
    let pipeline = Pipeline::new(default_collector(), scorer.clone());

    let file = tmp.path().join("a.py");
    let err = pipeline
        .run(&PipelineRequest::new(file.to_str().unwrap()), &NoProgress)
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::InvalidPath { .. }));
    assert!(err.to_string().contains("not a directory"));
    assert_eq!(scorer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn missing_root_is_rejected() {
    let pipeline = Pipeline::new(default_collector(), scenario_scorer());
    let err = pipeline
        .run(&PipelineRequest::new("/definitely/not/here"), &NoProgress)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::InvalidPath { .. }));
}

// ─── Invariants ─────────────────────────────────────────────────────

#[test]
fn collection_is_deterministic() {
    let tmp = scenario_project();
    fs::create_dir_all(tmp.path().join("src/nested")).unwrap();
    fs::write(tmp.path().join("src/nested/z.rs"), "fn z() {}\n").unwrap();
    fs::write(tmp.path().join("src/lib.rs"), "pub mod nested;\n").unwrap();

    let collector = default_collector();
    let first = collector.collect(tmp.path());
    let second = collector.collect(tmp.path());

    assert_eq!(first.documents, second.documents);
    assert_eq!(first.log, second.log);
}

#[test]
fn size_caps_hold_for_every_document_and_the_total() {
    let tmp = TempDir::new().unwrap();
    for i in 0..20 {
        fs::write(
            tmp.path().join(format!("f{:02}.py", i)),
            "x = 1\n".repeat(10 + i * 3),
        )
        .unwrap();
    }
    let limits = SizeLimits {
        max_file_bytes: 64,
        max_total_bytes: 300,
        ..SizeLimits::default()
    };
    let collection = Collector::new(TraversalRules::default(), limits).collect(tmp.path());

    assert!(collection.total_bytes <= limits.max_total_bytes);
    assert_eq!(
        collection.total_bytes,
        collection.documents.iter().map(|d| d.byte_size).sum::<usize>()
    );
    for doc in &collection.documents {
        assert!(doc.byte_size <= limits.max_file_bytes, "{} too large", doc.path);
    }
    assert!(collection
        .log
        .iter()
        .any(|l| l.starts_with("stopped: total size limit reached")));
}

#[tokio::test]
async fn malformed_responses_are_rejected_not_coerced() {
    let tmp = scenario_project();
    let pipeline = Pipeline::new(default_collector(), Arc::new(SloppyScorer));

    let output = pipeline.run(&request(&tmp), &NoProgress).await.unwrap();

    assert!(output.scored.iter().all(|s| s.score == 0 && !s.include));
    assert!(output.report.used_fallback);
    assert_eq!(output.report.count_selected, 3);
    let failures = output
        .report
        .logs
        .iter()
        .filter(|l| l.starts_with("assessment failed:"))
        .count();
    assert_eq!(failures, 3);
}

#[tokio::test(start_paused = true)]
async fn scorer_errors_and_timeouts_only_affect_their_document() {
    let tmp = TempDir::new().unwrap();
    for name in ["broken.py", "good.py", "slow.py"] {
        fs::write(tmp.path().join(name), "pass\n").unwrap();
    }
    let pipeline = Pipeline::new(default_collector(), Arc::new(FlakyScorer)).with_options(
        AssessOptions {
            max_concurrency: 4,
            timeout: Some(Duration::from_secs(5)),
        },
    );

    let output = pipeline.run(&request(&tmp), &NoProgress).await.unwrap();

    assert_eq!(output.report.selected_paths, vec!["good.py"]);
    let logs = output.report.logs.join("\n");
    assert!(logs.contains("assessment failed: broken.py"));
    assert!(logs.contains("429 Too Many Requests"));
    assert!(logs.contains("assessment failed: slow.py"));
    assert!(logs.contains("timed out"));
}

#[tokio::test(start_paused = true)]
async fn concurrency_does_not_change_selection() {
    let tmp = TempDir::new().unwrap();
    for name in ["a.py", "bb.py", "ccc.py", "dddd.py", "eeeee.py", "ffffff.py"] {
        fs::write(tmp.path().join(name), "pass\n").unwrap();
    }

    let run = |n: usize| {
        let pipeline = Pipeline::new(default_collector(), Arc::new(JitterScorer)).with_options(
            AssessOptions {
                max_concurrency: n,
                timeout: None,
            },
        );
        let req = request(&tmp).with_threshold("2");
        async move { pipeline.run(&req, &NoProgress).await.unwrap() }
    };

    let serial = run(1).await;
    let parallel = run(6).await;

    assert_eq!(serial.report.selected_paths, parallel.report.selected_paths);
    let order: Vec<&str> = parallel.scored.iter().map(|s| s.path()).collect();
    assert_eq!(
        order,
        vec!["a.py", "bb.py", "ccc.py", "dddd.py", "eeeee.py", "ffffff.py"]
    );
}

#[tokio::test]
async fn selected_paths_keep_collection_order() {
    let tmp = TempDir::new().unwrap();
    for name in ["a.py", "b.py", "c.py", "d.py"] {
        fs::write(tmp.path().join(name), "pass\n").unwrap();
    }
    let scorer = Arc::new(TableScorer::new(&[
        ("d.py", 5, true),
        ("b.py", 4, true),
        ("a.py", 3, false),
    ]));
    let output = Pipeline::new(default_collector(), scorer)
        .run(&request(&tmp), &NoProgress)
        .await
        .unwrap();

    assert_eq!(output.report.selected_paths, vec!["b.py", "d.py"]);
}

#[tokio::test]
async fn context_block_carries_sanitized_content() {
    let tmp = scenario_project();
    let pipeline = Pipeline::from_config(&Config::default(), scenario_scorer()).unwrap();

    let output = pipeline
        .run(&request(&tmp).with_threshold("0"), &NoProgress)
        .await
        .unwrap();
    let context = format_context(&output.selection.selected);

    assert!(context.starts_with("---\nSource: a.py\n\nContent:\n"));
    assert!(!context.contains("topsecret"));
}
