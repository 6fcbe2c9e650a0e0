//! Request-level errors.
//!
//! Only an unusable root path rejects a request. Scorer failures,
//! truncation, and empty selections are recorded in the log and never
//! surface here.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid project path {}: {reason}", .path.display())]
    InvalidPath { path: PathBuf, reason: String },
}
