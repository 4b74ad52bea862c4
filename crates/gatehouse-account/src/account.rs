//! Account types.

use std::fmt;

use chrono::{DateTime, Utc};

/// Identifier of a stored account.
///
/// Newtype over `u64` so an account id can't be mixed up with any other
/// number. This is the value a session resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountId(pub u64);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "A-{}", self.0)
    }
}

/// A persisted identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: AccountId,

    /// Unique across all accounts.
    pub name: String,

    /// Unique across all accounts.
    pub email: String,

    /// Output of [`PasswordHasher::hash`](crate::PasswordHasher::hash).
    /// Never the plaintext.
    pub password_digest: String,

    pub created_at: DateTime<Utc>,

    /// Last successful sign-in. Only ever moves forward.
    pub login_at: Option<DateTime<Utc>>,
}

/// Input for [`AccountStore::create`](crate::AccountStore::create).
///
/// The password must already be hashed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password_digest: String,
}

/// The unique fields of an account. Used to report which one collided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountField {
    Name,
    Email,
}

impl fmt::Display for AccountField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name => write!(f, "name"),
            Self::Email => write!(f, "email"),
        }
    }
}
