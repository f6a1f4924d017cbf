//! Donut Shop Backend - HTTP/JSON server

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use donut_shop::config::Config;
use donut_shop::messaging::EventPublisher;
use donut_shop::services::auth::AuthService;
use donut_shop::{router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::debug!(?config, "Configuration loaded");

    let db = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .context("connecting to database")?;
    sqlx::migrate!("./migrations").run(&db).await.context("running migrations")?;

    let events = match &config.nats_url {
        Some(url) => match async_nats::connect(url.as_str()).await {
            Ok(client) => EventPublisher::nats(client),
            Err(e) => {
                tracing::warn!(error = %e, "NATS unavailable, domain events disabled");
                EventPublisher::disabled()
            }
        },
        None => EventPublisher::disabled(),
    };

    let auth = AuthService::new(&config.jwt_secret, chrono::Duration::hours(config.token_ttl_hours));
    let app = router(AppState::postgres(db, auth, events));

    let addr = config.socket_addr();
    tracing::info!("🍩 Donut Shop listening on {}", addr);
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;
    Ok(())
}
