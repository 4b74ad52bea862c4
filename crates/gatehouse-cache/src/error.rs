//! Error types for the cache layer.

use std::time::Duration;

/// Errors a cache backend can report.
///
/// A missing key is not an error. These variants cover the store itself
/// being unreachable, which callers treat as a transient failure.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CacheError {
    /// The backend is gone (its owner task stopped or the link dropped).
    #[error("cache unavailable")]
    Unavailable,

    /// The backend did not answer within the allowed time.
    #[error("cache request timed out after {0:?}")]
    Timeout(Duration),
}
