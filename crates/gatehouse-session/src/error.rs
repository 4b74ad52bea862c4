//! Error types for the session layer.

use gatehouse_account::{AccountError, AccountField};
use gatehouse_cache::CacheError;

/// Errors produced by [`SessionAuthenticator`](crate::SessionAuthenticator).
///
/// Each variant maps to exactly one transport status; nothing here is
/// retried by the session layer.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Sign-up collided with an existing account on this field.
    #[error("an account with the same {0} already exists")]
    Conflict(AccountField),

    /// Sign-in failed. Deliberately doesn't say whether the name or the
    /// password was wrong.
    #[error("incorrect name or password")]
    Unauthorized,

    /// The session id is missing, unknown, or expired.
    #[error("not authenticated")]
    Unauthenticated,

    /// Bad sign-up input, or the post-sign-in account update was rejected.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The account store failed.
    #[error(transparent)]
    Account(#[from] AccountError),

    /// The session store failed.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The hashing task died before returning.
    #[error("password hashing failed: {0}")]
    Hashing(String),
}
