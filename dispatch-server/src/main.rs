use dispatch_server::{Server, ServerState, setup_environment};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. .env, configuration, logging
    let config = setup_environment();
    if config.is_production() && config.jwt.ephemeral {
        anyhow::bail!("JWT_SECRET (at least 32 characters) is required in production");
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        port = config.http_port,
        "Dispatch server starting"
    );

    // 2. Database, migrations and components
    let state = ServerState::initialize(&config).await?;

    // 3. HTTP server (starts the background tasks itself)
    let server = Server::with_state(config, state);
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
