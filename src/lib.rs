//! # readmegen
//!
//! File collection and relevance selection for README generation.
//!
//! readmegen walks a local project directory, turns the files worth
//! reading into sanitized, size-bounded documents, asks a relevance scorer
//! how useful each one is for onboarding, and hands the selected subset to
//! a generation step as a single context block.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   ┌────────────┐   ┌────────────┐   ┌───────────┐
//! │ Validate  │──▶│ Collector  │──▶│  Assess    │──▶│  Select   │──▶ context
//! │ root path │   │ filter +   │   │ scorer x N │   │ threshold │
//! └───────────┘   │ sanitize + │   │ (ordered)  │   │ / fallback│
//!                 │ size caps  │   └────────────┘   └───────────┘
//!                 └────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! readmegen collect ./my-project
//! readmegen select ./my-project --relevance 4 --json
//! readmegen context ./my-project --config ./config/readmegen.toml
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`validate`] | Root path validation |
//! | [`collector`] | Deterministic filesystem collection |
//! | [`scorer`] | Heuristic, OpenAI, and Ollama relevance scorers |
//! | [`assess`] | Concurrent, order-preserving scoring |
//! | [`pipeline`] | Validate, collect, assess, select |
//! | [`context`] | Context block for the generation step |
//! | [`progress`] | Progress reporting on stderr |

pub mod assess;
pub mod collector;
pub mod config;
pub mod context;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod scorer;
pub mod validate;
