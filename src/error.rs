//! Error type shared by every fallible operation of the crate.
//!
//! Content and classification anomalies never surface here: malformed text is
//! replaced by a dash, unresolved images by a marker, and out-of-domain marks
//! are dropped from the section tree. What remains are configuration mistakes
//! and failures of the rendering backend.

use thiserror::Error;

/// Errors produced while configuring, assembling or rendering an exam paper.
#[derive(Debug, Error)]
pub enum PaperError {
    /// A page budget of zero questions was requested.
    #[error("page budget must allow at least one question per page")]
    InvalidBudget,

    /// The injected mark table cannot classify anything.
    #[error("invalid mark table: {0}")]
    InvalidMarkTable(String),

    /// The question selection could not be parsed.
    #[error("failed to parse question selection: {0}")]
    Selection(#[from] serde_json::Error),

    /// The PDF backend failed while laying out or writing the document.
    #[error("PDF rendering failed: {0}")]
    Render(#[from] genpdf::error::Error),

    /// Reading input or writing output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A custom rendering backend reported a failure.
    #[error("rendering backend failed: {0}")]
    Backend(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PaperError>;
