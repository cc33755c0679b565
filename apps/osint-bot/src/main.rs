use std::sync::Arc;

use teloxide::prelude::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod bot;
mod config;
mod errors;
mod lookup_client;
mod models;
mod services;
mod state;
mod utils;

use crate::bot::utils::prompts::PromptRegistry;
use crate::config::Config;
use crate::lookup_client::LookupClient;
use crate::services::account_service::AccountService;
use crate::services::search_service::SearchService;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "osint_bot=info,osint_db=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting OSINT bot...");

    let config = Config::load()?;
    tracing::info!("Database: {}", config.database_url);
    tracing::info!("Lookup endpoint: {}", config.lookup_endpoint);
    if config.required_channel_id.is_none() {
        tracing::warn!("REQUIRED_CHANNEL_ID not set, membership gate is open");
    }

    let db = osint_db::connect(&config.database_url).await?;
    let lookup = LookupClient::new(
        config.lookup_endpoint.clone(),
        config.lookup_api_key.clone(),
        config.lookup_timeout(),
    )?;

    let bot = Bot::new(config.bot_token.clone());
    let bot_username = bot::resolve_username(&bot, config.bot_username.as_deref()).await?;

    let state = AppState {
        accounts: AccountService::new(db.clone(), config.admin_user_id),
        search: SearchService::new(db, lookup),
        prompts: PromptRegistry::new(),
        bot_username: bot_username.into(),
        config: Arc::new(config),
    };

    let (shutdown_tx, shutdown_rx) = tokio::sync::broadcast::channel(1);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Ctrl-C received");
            let _ = shutdown_tx.send(());
        }
    });

    bot::run_bot(bot, shutdown_rx, state).await;
    tracing::info!("OSINT bot stopped");
    Ok(())
}
