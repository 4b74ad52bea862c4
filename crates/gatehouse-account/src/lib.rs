//! Account records and the collaborators that manage them.
//!
//! The session layer doesn't own accounts or passwords. It talks to two
//! contracts defined here:
//!
//! - [`AccountStore`]: create accounts, look them up by name, email, or
//!   id, and record logins. [`MemoryAccountStore`] is the in-process
//!   implementation.
//! - [`PasswordHasher`]: one-way `hash` and `verify`. [`Pbkdf2Hasher`]
//!   implements PBKDF2-HMAC-SHA256 with a random salt per digest.
//!
//! # Uniqueness
//!
//! Names and emails are unique. The session layer checks both before
//! creating an account, but two concurrent sign-ups can pass those checks
//! together. The store is the real guard: [`AccountStore::create`] must
//! reject a duplicate with [`AccountError::Duplicate`].

mod account;
mod error;
mod hasher;
mod store;

pub use account::{Account, AccountField, AccountId, NewAccount};
pub use error::AccountError;
pub use hasher::{PasswordHasher, Pbkdf2Hasher};
pub use store::{AccountStore, MemoryAccountStore};
