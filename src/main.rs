//! Poinbot - Telegram ad rewards bot.
//!
//! Users earn points by watching ads, claiming a daily bonus, spinning a
//! Lucky Spin, answering quizzes and inviting friends, then cash them out
//! through withdrawals approved by the owners.
//!
//! ## Architecture
//!
//! - `config` - Environment configuration
//! - `database` - MongoDB models and repositories
//! - `cache` - TTL caches with Moka
//! - `rewards` - Claim windows, spin rolls, withdraw rules, ad sessions
//! - `ledger` - Point operations spanning several repositories
//! - `bot` - Dispatcher, runtime and notifications (with Throttle)
//! - `plugins` - Command, menu and callback handlers
//! - `web` - Ad watch page, reward callback and admin panel
//! - `i18n` - Indonesian and English texts
//! - `utils` - Formatting helpers

mod bot;
mod cache;
mod config;
mod database;
mod i18n;
mod ledger;
mod plugins;
mod rewards;
mod utils;
mod web;

use std::sync::Arc;
use std::time::{Duration, Instant};

use teloxide::adaptors::throttle::Limits;
use teloxide::prelude::*;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use bot::AppState;
use config::Config;
use database::Database;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

/// How often expired ad sessions are dropped.
const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file first (before anything else)
    dotenvy::dotenv().ok();

    // If RUST_LOG is not set, default to "info" level for our crate
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("poinbot=info,teloxide=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .init();

    info!("Starting Poinbot...");

    let config = Arc::new(Config::from_env()?);
    info!("Configuration loaded successfully");
    info!("Bot mode: {:?}", config.bot_mode);

    i18n::init();

    info!("Connecting to MongoDB...");
    let db = Database::connect(&config.mongodb_uri, &config.mongodb_database).await?;
    info!("Database connected");

    // Initialize bot with Throttle for automatic rate limiting
    let bot = Bot::new(&config.bot_token).throttle(Limits::default());
    info!("Bot initialized with rate limiting (Throttle)");

    // Get bot username from config or fallback to get_me()
    let bot_username = match config.bot_username.clone() {
        Some(username) => username,
        None => bot.get_me().await?.username().to_string(),
    };
    info!("Using bot username: @{}", bot_username);

    if config.owner_ids.is_empty() {
        warn!("No owner IDs configured (OWNER_IDS is empty)");
    } else {
        info!("Bot owners: {:?}", config.owner_ids);
    }

    let state = AppState::new(&db, config.clone(), bot_username);

    let seeded = state.quizzes.seed_defaults(config.rewards.quiz).await?;
    if seeded > 0 {
        info!("Seeded {} quizzes into an empty collection", seeded);
    }

    spawn_session_purge(&state);

    bot::run(&config, bot, state).await?;

    info!("Poinbot stopped");
    Ok(())
}

/// Periodically drop ad sessions nobody redeemed.
fn spawn_session_purge(state: &AppState) {
    let sessions = state.ledger.sessions.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            let purged = sessions.purge_expired(Instant::now());
            if purged > 0 {
                debug!("Purged {} expired ad sessions ({} open)", purged, sessions.len());
            }
        }
    });
}
