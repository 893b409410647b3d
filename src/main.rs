//! Process entry point: configuration, collaborator construction, serving.

use anyhow::Context as _;
use std::sync::Arc;
use tokio::net::TcpListener;

use trendforge::api::{self, ApiState};
use trendforge::config::Config;
use trendforge::engine::ConversationEngine;
use trendforge::llm::OpenAiGenerator;
use trendforge::store::InMemoryUserStore;
use trendforge::telegram::TelegramClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Config::from_env().context("configuration error")?;

    let telegram = TelegramClient::new(&config.bot_token)?;
    // Identity check is advisory: a transient network failure here should
    // not keep the bot down when the token itself is fine.
    match telegram.get_me().await {
        Ok(identity) => {
            tracing::info!(id = identity.id, username = %identity.username, "bot identity verified");
        }
        Err(error) => {
            tracing::warn!(%error, "getMe failed; check BOT_TOKEN and network reachability");
        }
    }

    let store = Arc::new(InMemoryUserStore::new());
    let generator = Arc::new(OpenAiGenerator::new(config.openai_api_key.clone())?);
    let engine = ConversationEngine::new(store, generator);

    let state = Arc::new(ApiState {
        engine,
        telegram,
        admin_token: config.admin_token.clone(),
    });

    let listener = TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("failed to bind port {}", config.port))?;
    tracing::info!(port = config.port, "webhook server listening");

    axum::serve(listener, api::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(filter).compact().init();
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "failed to listen for shutdown signal");
        return;
    }
    tracing::info!("shutdown signal received, stopping");
}
