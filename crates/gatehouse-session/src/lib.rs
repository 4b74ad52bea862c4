//! Credential verification and session lifecycle for Gatehouse.
//!
//! This crate turns a name and password into a session id, and a session
//! id back into an account id:
//!
//! 1. **Sign-up**: uniqueness checks, password hashing, account creation
//! 2. **Sign-in**: credential check, last-login update, session issue
//! 3. **Validation**: session id → account id, the gate for every
//!    protected operation
//! 4. **Sign-out**: session removal
//!
//! Account storage, password hashing, and the session store are injected
//! ([`AccountStore`], [`PasswordHasher`], [`CacheStorage`]), so the same
//! [`SessionAuthenticator`] runs against in-memory stores in tests and
//! real backends in production.
//!
//! # Session lifecycle
//!
//! ```text
//!   absent ──(sign_in)──→ active ──(sign_out | ttl elapsed)──→ absent
//! ```
//!
//! [`AccountStore`]: gatehouse_account::AccountStore
//! [`PasswordHasher`]: gatehouse_account::PasswordHasher
//! [`CacheStorage`]: gatehouse_cache::CacheStorage

mod authenticator;
mod error;
mod session;

pub use authenticator::{SessionAuthenticator, SignIn};
pub use error::AuthError;
pub use session::{SessionConfig, SessionEntry, SessionId};
