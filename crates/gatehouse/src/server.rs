//! Router assembly and the server lifecycle.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::middleware;
use axum::routing::post;
use gatehouse_account::{AccountStore, PasswordHasher};
use gatehouse_cache::CacheStorage;
use gatehouse_session::{SessionAuthenticator, SessionEntry};
use tokio::net::TcpListener;

use crate::config::{DEFAULT_BIND_ADDR, ServerConfig};
use crate::error::GatehouseError;
use crate::handler::{ServerState, require_session, sign_in, sign_out, sign_up};

/// Builds the `/auth/*` router around an authenticator.
///
/// Sign-out sits behind the session gate, so it only
/// runs for requests carrying a live session cookie.
pub fn router<S, H, C>(auth: SessionAuthenticator<S, H, C>) -> Router
where
    S: AccountStore,
    H: PasswordHasher,
    C: CacheStorage<Value = SessionEntry>,
{
    let state = ServerState {
        auth: Arc::new(auth),
    };

    let gated = Router::new()
        .route("/auth/sign-out", post(sign_out::<S, H, C>))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session::<S, H, C>,
        ));

    Router::new()
        .route("/auth/sign-up", post(sign_up::<S, H, C>))
        .route("/auth/sign-in", post(sign_in::<S, H, C>))
        .merge(gated)
        .with_state(state)
}

/// Builder for configuring and starting a [`GatehouseServer`].
///
/// # Example
///
/// ```rust,no_run
/// use gatehouse::prelude::*;
///
/// # async fn example() -> Result<(), GatehouseError> {
/// let auth = SessionAuthenticator::new(
///     MemoryAccountStore::new(),
///     Pbkdf2Hasher::new(),
///     MemoryCache::<SessionEntry>::new(),
///     SessionConfig::default(),
/// );
/// let server = GatehouseServer::builder()
///     .bind("0.0.0.0:8080")
///     .build(auth)
///     .await?;
/// server.run().await
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct GatehouseServerBuilder {
    bind_addr: String,
}

impl GatehouseServerBuilder {
    /// Creates a new builder listening on [`DEFAULT_BIND_ADDR`].
    pub fn new() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        }
    }

    /// Sets the address to bind to (e.g. `"0.0.0.0:8080"`).
    pub fn bind(mut self, addr: impl Into<String>) -> Self {
        self.bind_addr = addr.into();
        self
    }

    /// Takes the bind address from a loaded [`ServerConfig`].
    ///
    /// Session settings are carried by the authenticator, not the builder.
    pub fn config(self, config: &ServerConfig) -> Self {
        self.bind(config.bind_addr.clone())
    }

    /// Binds the listener and assembles the router.
    ///
    /// # Errors
    /// [`GatehouseError::Io`] if the address can't be bound.
    pub async fn build<S, H, C>(
        self,
        auth: SessionAuthenticator<S, H, C>,
    ) -> Result<GatehouseServer, GatehouseError>
    where
        S: AccountStore,
        H: PasswordHasher,
        C: CacheStorage<Value = SessionEntry>,
    {
        let listener = TcpListener::bind(&self.bind_addr).await?;
        tracing::info!(
            addr = %listener.local_addr()?,
            ttl_secs = ?auth.config().ttl_secs,
            secure_cookies = auth.config().secure_cookies,
            "gatehouse listening"
        );

        Ok(GatehouseServer {
            listener,
            router: router(auth),
        })
    }
}

impl Default for GatehouseServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound server, ready to accept connections.
pub struct GatehouseServer {
    listener: TcpListener,
    router: Router,
}

impl GatehouseServer {
    /// Creates a new [`GatehouseServerBuilder`].
    pub fn builder() -> GatehouseServerBuilder {
        GatehouseServerBuilder::new()
    }

    /// The address actually bound, useful after binding port 0.
    pub fn local_addr(&self) -> Result<SocketAddr, GatehouseError> {
        Ok(self.listener.local_addr()?)
    }

    /// Serves requests until the process is stopped or the listener fails.
    pub async fn run(self) -> Result<(), GatehouseError> {
        axum::serve(self.listener, self.router).await?;
        Ok(())
    }
}
