//! # Gatehouse
//!
//! Session-cookie authentication over HTTP.
//!
//! Gatehouse exposes three endpoints on top of a
//! [`SessionAuthenticator`](gatehouse_session::SessionAuthenticator):
//!
//! | Route | Success | Failure |
//! |---|---|---|
//! | `POST /auth/sign-up` | 204 | 409 name/email taken, 400 bad input |
//! | `POST /auth/sign-in` | 200 + `session` cookie | 401 bad credentials, 400 login update rejected |
//! | `POST /auth/sign-out` | 200, cookie cleared | 401 no valid session |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gatehouse::prelude::*;
//!
//! # async fn start() -> Result<(), GatehouseError> {
//! let config = ServerConfig::from_env()?;
//! let auth = SessionAuthenticator::new(
//!     MemoryAccountStore::new(),
//!     Pbkdf2Hasher::new(),
//!     MemoryCache::<SessionEntry>::new(),
//!     config.session.clone(),
//! );
//! let server = GatehouseServer::builder().config(&config).build(auth).await?;
//! server.run().await
//! # }
//! ```

mod config;
mod cookie;
mod error;
mod handler;
mod logging;
mod server;

pub use config::{
    ConfigError, DEFAULT_BIND_ADDR, ENV_BIND, ENV_HTTPS, ENV_SESSION_TTL, MAX_SESSION_TTL_SECS,
    ServerConfig,
};
pub use cookie::{
    SESSION_COOKIE, clear_session_cookie, read_session_cookie, session_cookie,
};
pub use error::GatehouseError;
pub use handler::{CurrentSession, DetailResponse, SignInRequest, SignUpRequest};
pub use logging::init_tracing;
pub use server::{GatehouseServer, GatehouseServerBuilder, router};

/// Everything needed to wire up a server with the in-memory backends.
pub mod prelude {
    pub use crate::{
        ConfigError, CurrentSession, GatehouseError, GatehouseServer,
        GatehouseServerBuilder, ServerConfig, init_tracing, router,
    };
    pub use gatehouse_account::{
        Account, AccountId, AccountStore, MemoryAccountStore, PasswordHasher,
        Pbkdf2Hasher,
    };
    pub use gatehouse_cache::{
        ActorCache, ActorCacheConfig, CacheStorage, MemoryCache,
    };
    pub use gatehouse_session::{
        AuthError, SessionAuthenticator, SessionConfig, SessionEntry,
        SessionId,
    };
}
