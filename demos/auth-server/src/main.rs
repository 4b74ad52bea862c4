use gatehouse::prelude::*;

type MemoryAuthenticator =
    SessionAuthenticator<MemoryAccountStore, Pbkdf2Hasher, MemoryCache<SessionEntry>>;

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

/// In-memory accounts and sessions; everything is lost on restart.
fn build_authenticator(config: &ServerConfig) -> MemoryAuthenticator {
    SessionAuthenticator::new(
        MemoryAccountStore::new(),
        Pbkdf2Hasher::new(),
        MemoryCache::new(),
        config.session.clone(),
    )
}

// ---------------------------------------------------------------------------
// Server bootstrap
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), GatehouseError> {
    init_tracing("info");

    let config = ServerConfig::from_env()?;
    tracing::info!(bind = %config.bind_addr, "starting auth server");

    let server = GatehouseServer::builder()
        .config(&config)
        .build(build_authenticator(&config))
        .await?;
    server.run().await
}
