//! Webhook mode implementation for the bot.
//!
//! Uses teloxide's axum webhook support to:
//! - Automatically call `setWebhook` on Telegram
//! - Mount the update route next to the web panel routes
//! - Stop the HTTP server when the dispatcher shuts down

use std::net::SocketAddr;

use anyhow::Context;
use axum::Router;
use teloxide::prelude::*;
use teloxide::update_listeners::webhooks::{self, Options};
use tokio::net::TcpListener;
use tracing::{error, info};
use url::Url;

use super::dispatcher::{BotDispatcher, ThrottledBot};
use crate::config::Config;

/// Start the bot in webhook mode.
///
/// Telegram updates and the web panel share one listener on `address`.
pub async fn start_webhook(
    config: &Config,
    mut dispatcher: BotDispatcher,
    bot: ThrottledBot,
    web: Router,
    address: SocketAddr,
) -> anyhow::Result<()> {
    let webhook_url = config
        .webhook_url
        .as_ref()
        .context("WEBHOOK_URL must be set when using webhook mode")?;
    let url = Url::parse(webhook_url).context("Invalid WEBHOOK_URL format")?;

    let mut options = Options::new(address, url.clone());
    if let Some(ref secret) = config.webhook_secret {
        options = options.secret_token(secret.clone());
        info!("Webhook secret token configured");
    }

    info!("🔗 Setting webhook URL: {}", url);
    info!("📡 Listening on: {}", address);

    // bot.inner(): webhook setup only needs plain API access
    let (listener, stop_flag, updates) = webhooks::axum_to_router(bot.inner().clone(), options)
        .await
        .context("Failed to setup webhook")?;
    let app = updates.merge(web);

    let tcp = TcpListener::bind(address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(tcp, app).with_graceful_shutdown(stop_flag).await {
            error!("Web server stopped: {}", e);
        }
    });

    info!("✅ Webhook setup complete, waiting for updates...");

    let error_handler = LoggingErrorHandler::with_custom_text("Error from update listener");
    dispatcher
        .dispatch_with_listener(listener, error_handler)
        .await;

    Ok(())
}
