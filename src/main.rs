use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use warden::{config::Config, db, router, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    tracing::info!("✅ Configuration loaded successfully");

    let (state, pool) = AppState::new(&config).await?;
    tracing::info!("✅ AppState initialized");

    if let Err(e) = db::ensure_schema(&pool).await {
        tracing::error!("❌ Failed to apply database schema: {}", e);
        return Err(e.into());
    }

    let app = router::build(state);

    tracing::info!("🚀 Server listening on http://{}", config.listen_addr);
    tracing::info!("✅ All systems operational");

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
