use cognoma_api::{cli::commands::serve, config, is_development};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, COGNOMA_STORE, etc.
    let _ = dotenvy::dotenv();

    let default_filter = if is_development!() {
        "cognoma_api=debug,tower_http=debug,info"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    serve::run(config::config().clone()).await
}
