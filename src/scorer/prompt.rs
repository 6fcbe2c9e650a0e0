//! Prompt text for the model-backed scorers.

use readmegen_core::assess::clip_sample;
use readmegen_core::models::Document;

pub const SYSTEM_PROMPT: &str = "\
You rate repository files for a technical writer who is about to write the project's README.
Judge how much a file helps a newcomer run, build, configure, deploy, or understand the project.

Scoring rubric (integer 0-5):
5 = critical: main entrypoint, app factory or routing, container files (Dockerfile, compose), \
package manifest and scripts (package.json, pyproject.toml, Cargo.toml), environment schema
4 = important integration: database models, API handlers and routers, main pages, providers, \
CI that builds or tests
3 = helpful: lint or format config, Makefile targets, test config, utilities shared across the app
2 = minor helpers or generic UI pieces; worth a summary at most
0-1 = not useful for onboarding

Set include to true only when the file should shape the README.
Keep the summary to 1-3 sentences about purpose and how the file affects running, configuring, \
or deploying the project. Never paste code.

Respond with a single JSON object with exactly these keys:
{\"path\": string, \"score\": integer, \"include\": boolean, \"reason\": string, \"summary\": string}";

/// Per-document user message: path, extension, size, and a clipped sample.
pub fn user_prompt(document: &Document, sample_chars: usize) -> String {
    format!(
        "Assess this repository file for README relevance.\n\
         Path: {}\n\
         Ext: {}\n\
         Size: {} bytes\n\n\
         Sample:\n---\n{}\n---",
        document.path,
        document.extension(),
        document.byte_size,
        clip_sample(&document.content, sample_chars)
    )
}
