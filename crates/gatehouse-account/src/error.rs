//! Error types for account storage.

use crate::{AccountField, AccountId};

/// Errors reported by an [`AccountStore`](crate::AccountStore).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccountError {
    /// Another account already uses this name or email.
    #[error("an account with the same {0} already exists")]
    Duplicate(AccountField),

    /// No account has this id.
    #[error("account {0} not found")]
    NotFound(AccountId),

    /// The new last-login time is earlier than the stored one.
    #[error("login time for account {0} would move backwards")]
    LoginRegression(AccountId),

    /// The backing store could not be reached.
    #[error("account store unavailable: {0}")]
    Unavailable(String),
}
