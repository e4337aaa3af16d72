//! Main entry point: initializes logging, loads configuration, prepares
//! the database, starts the distribution scheduler, and runs the Telegram
//! bot next to the health server.

use anyhow::Result;
use std::sync::Arc;
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::prelude::*;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod bot;
mod config;
mod database;
mod error;
mod quiz;
mod services;
mod utils;

use crate::bot::handlers::BotHandler;
use crate::bot::state::State;
use crate::config::Config;
use crate::database::connection::DatabaseManager;
use crate::services::distribution::DistributionService;
use crate::services::health::HealthService;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "classwork_bot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    info!("Starting Classwork Bot v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration loaded - Database: {}, HTTP Port: {}",
        config.database_url, config.http_port
    );

    info!("Initializing database connection...");
    let db_manager = DatabaseManager::new(&config.database_url).await?;
    info!("Running database migrations...");
    db_manager.run_migrations().await?;
    info!("Database initialized successfully");

    info!("Initializing Telegram bot...");
    let telegram_bot = Bot::new(&config.telegram_bot_token);

    info!("Initializing distribution service...");
    let mut distribution = DistributionService::new(telegram_bot.clone(), db_manager.clone()).await?;
    distribution.start().await?;

    let health_service = HealthService::new(Arc::new(db_manager.clone()));
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.http_port))
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to port {}: {}", config.http_port, e))?;
    info!("Health check server starting on port {}", config.http_port);

    let config = Arc::new(config);
    let dispatcher_bot = telegram_bot.clone();
    let dispatcher_db = db_manager.clone();
    let dispatcher_config = config.clone();
    let dispatcher_distribution = distribution.clone();

    let bot_task = tokio::spawn(async move {
        Dispatcher::builder(dispatcher_bot, BotHandler::schema())
            .dependencies(dptree::deps![
                InMemStorage::<State>::new(),
                dispatcher_db,
                dispatcher_config,
                dispatcher_distribution
            ])
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
    });

    let health_task = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, health_service.router).await {
            tracing::error!("Health server error: {}", e);
        }
    });

    tokio::select! {
        result = bot_task => {
            if let Err(e) = result {
                tracing::error!("Bot task error: {}", e);
            }
        }
        result = health_task => {
            if let Err(e) = result {
                tracing::error!("Health task error: {}", e);
            }
        }
    }

    if let Err(e) = distribution.shutdown().await {
        tracing::warn!("Error stopping distribution service: {}", e);
    }

    info!("Application stopped");
    Ok(())
}
