// src/error.rs

use thiserror::Error;

/// Failures surfaced by the recommend operation. Upstream, rate-limit, and
/// cache failures never appear here: fetchers degrade those to fewer
/// results internally.
#[derive(Debug, Error)]
pub enum RecommendError {
    /// Bad caller input; surfaced with detail as a 4xx.
    #[error("{0}")]
    Validation(String),
    /// Unexpected failure during ranking/scoring; surfaced as a generic 5xx
    /// without detail.
    #[error("processing error")]
    Internal(#[from] anyhow::Error),
}
