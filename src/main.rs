use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod auth;
mod config;
mod db;
mod domain;
mod errors;
mod messaging;
mod metrics;
mod models;
mod state;
mod utils;

use auth::{RedisTokenStore, TokenStore};
use config::Config;
use messaging::BroadcastClient;
use state::AppState;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Structured logging, INFO by default, overridable with RUST_LOG
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,zaika_backend=debug")),
        )
        .init();

    let config = Config::from_env()?;
    tracing::info!("🚀 Starting zaika order backend");

    tracing::info!("Connecting to Postgres...");
    let pool = db::connect(&config.database_url).await?;

    tracing::info!("Connecting to token store...");
    let tokens: Arc<dyn TokenStore> = Arc::new(RedisTokenStore::connect(&config.redis_url).await?);

    let broadcast = Arc::new(BroadcastClient::new(&config.kafka_brokers)?);
    let metrics = Arc::new(metrics::Metrics::new()?);

    let state = web::Data::new(AppState {
        db: pool,
        broadcast,
        tokens,
        metrics,
        broadcast_on_create: config.broadcast_on_create,
    });

    tracing::info!(addr = %config.bind_addr, port = config.port, "Listening");

    HttpServer::new(move || App::new().app_data(state.clone()).configure(api::routes))
        .bind((config.bind_addr.as_str(), config.port))?
        .run()
        .await?;

    Ok(())
}
