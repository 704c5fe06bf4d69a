use clap::Args;

use crate::app::app;
use crate::config::{AppConfig, StoreBackend};
use crate::state::AppState;

#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    #[arg(long, help = "Interface to bind (overrides COGNOMA_API_HOST)")]
    pub host: Option<String>,
    #[arg(long, help = "Port to bind (overrides COGNOMA_API_PORT / PORT)")]
    pub port: Option<u16>,
    #[arg(long, help = "Use the in-memory store instead of Postgres")]
    pub memory: bool,
}

impl ServeArgs {
    fn apply(self, mut config: AppConfig) -> AppConfig {
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if self.memory {
            config.server.store = StoreBackend::Memory;
        }
        config
    }
}

pub async fn handle(args: ServeArgs) -> anyhow::Result<()> {
    let config = args.apply(crate::config::config().clone());
    run(config).await
}

/// Connect the store, bind the listener and serve until the process stops
pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    tracing::info!("Starting Cognoma API in {:?} mode", config.environment);

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::from_config(config).await?;

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {}", bind_addr, e))?;

    tracing::info!("Cognoma API listening on http://{}", bind_addr);

    axum::serve(listener, app(state)).await?;
    Ok(())
}
