//! # readmegen core
//!
//! Pure logic for readmegen: the document model, traversal rule sets,
//! dotenv sanitization, size limits, the relevance-scorer contract, and
//! the selection policy.
//!
//! This crate contains no tokio, HTTP, or filesystem I/O. The collector,
//! the concrete scorers, and the CLI live in the `readmegen` app crate.

pub mod assess;
pub mod limits;
pub mod models;
pub mod rules;
pub mod sanitize;
pub mod select;
