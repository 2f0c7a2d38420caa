//! ChatterieSync server: load settings, open the database, apply the schema, serve.

use chatterie_sync::{apply_migrations, build_router, catalog, AppState, Gateway, Settings};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("chatterie_sync=info".parse()?))
        .init();

    let settings = Settings::from_env()?;
    let gateway = Gateway::connect(&settings).await?;
    apply_migrations(gateway.pool(), catalog()).await?;

    let app = build_router(AppState::new(gateway), settings.body_limit_bytes);

    let listener = TcpListener::bind(settings.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("shutting down");
}
