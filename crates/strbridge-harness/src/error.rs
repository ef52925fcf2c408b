//! Harness error type.

use std::path::PathBuf;

/// Everything that can go wrong while loading, running or reporting fixtures.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid fixture json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported function `{0}`")]
    UnsupportedFunction(String),
    #[error("fixture input `{field}`: {message}")]
    BadInput { field: &'static str, message: String },
    #[error("{failed} of {total} fixture cases failed")]
    VerificationFailed { failed: usize, total: usize },
}

impl HarnessError {
    /// Attach a path to an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
