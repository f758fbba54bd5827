//! Bot runtime - Polling and Webhook runners.
//!
//! The web panel (watch page, reward callback, admin) is served next to
//! the bot in both modes.

use std::net::SocketAddr;

use tracing::{error, info};

use super::dispatcher::{build_dispatcher, AppState, ThrottledBot};
use super::webhook::start_webhook;
use crate::config::{BotMode, Config};
use crate::web::{self, WebState};

/// Run the bot and the web server with the configured mode.
pub async fn run(config: &Config, bot: ThrottledBot, state: AppState) -> anyhow::Result<()> {
    let router = web::router(WebState {
        app: state.clone(),
        bot: bot.clone(),
    });
    let address = SocketAddr::from(([0, 0, 0, 0], config.port));
    let mut dispatcher = build_dispatcher(bot.clone(), state);

    match config.bot_mode {
        BotMode::Polling => {
            info!("Starting bot in polling mode...");
            tokio::spawn(async move {
                if let Err(e) = web::serve(address, router).await {
                    error!("Web server stopped: {}", e);
                }
            });
            dispatcher.dispatch().await;
        }
        BotMode::Webhook => {
            info!("Starting bot in webhook mode...");
            start_webhook(config, dispatcher, bot, router, address).await?;
        }
    }

    Ok(())
}
