//! Message dispatcher setup.
//!
//! Builds the dispatcher with all command, menu and callback handlers.

use std::sync::Arc;

use teloxide::adaptors::Throttle;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::User;

use crate::cache::{CacheConfig, TypedCache};
use crate::config::{Config, RewardConfig};
use crate::database::{
    AdRepository, Database, QuizRepository, UserAccount, UserRepository, WithdrawRepository,
};
use crate::i18n::resolve_locale;
use crate::ledger::Ledger;
use crate::plugins;
use crate::rewards::AdSessionTracker;

/// Bot type with Throttle adaptor for automatic rate limiting.
pub type ThrottledBot = Throttle<Bot>;

/// Dispatcher type produced by `build_dispatcher`.
pub type BotDispatcher = Dispatcher<ThrottledBot, anyhow::Error, teloxide::dispatching::DefaultKey>;

/// Shared application state (Telegram handlers and web panel).
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,

    /// Cross-repository point operations.
    pub ledger: Ledger,

    pub users: Arc<UserRepository>,
    pub withdrawals: Arc<WithdrawRepository>,
    pub ads: Arc<AdRepository>,
    pub quizzes: Arc<QuizRepository>,

    /// Users who pressed Withdraw and owe us an amount.
    pub pending_withdraws: TypedCache<i64, ()>,

    /// Bot username (without @) for referral links.
    pub bot_username: String,
}

impl AppState {
    /// Create a new application state.
    pub fn new(db: &Database, config: Arc<Config>, bot_username: String) -> Self {
        let users = Arc::new(UserRepository::new(db));
        let withdrawals = Arc::new(WithdrawRepository::new(db));
        let ads = Arc::new(AdRepository::new(db));
        let quizzes = Arc::new(QuizRepository::new(db));

        let sessions = AdSessionTracker::new(config.ads.min_watch, config.ads.session_ttl);
        let ledger = Ledger {
            users: users.clone(),
            withdrawals: withdrawals.clone(),
            ads: ads.clone(),
            sessions,
            rewards: config.rewards.clone(),
        };

        Self {
            config,
            ledger,
            users,
            withdrawals,
            ads,
            quizzes,
            pending_withdraws: TypedCache::new("pending_withdraws", CacheConfig::conversation()),
            bot_username,
        }
    }

    pub fn rewards(&self) -> &RewardConfig {
        &self.config.rewards
    }

    /// Check if a user is a bot owner.
    pub fn is_owner(&self, user_id: u64) -> bool {
        self.config.owner_ids.contains(&user_id)
    }

    /// Locale for a user, preferring the stored choice.
    pub fn locale(&self, account: Option<&UserAccount>, user: Option<&User>) -> &'static str {
        resolve_locale(
            account.and_then(|a| a.lang.as_deref()),
            user.and_then(|u| u.language_code.as_deref()),
        )
    }

    /// Public watch link for a user.
    pub fn watch_url(&self, user_id: i64) -> String {
        format!("{}/watch?user_id={}", self.config.domain, user_id)
    }
}

/// Build the dispatcher with all handlers.
pub fn build_dispatcher(bot: ThrottledBot, state: AppState) -> BotDispatcher {
    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
}

/// Build the handler schema.
fn schema() -> UpdateHandler<anyhow::Error> {
    // Profile refresh first, then commands, menu buttons, withdraw replies
    let message_handler = Update::filter_message()
        .inspect_async(track_user)
        .branch(plugins::command_handler())
        .branch(plugins::menu_handler())
        .branch(plugins::withdraw_input_handler());

    dptree::entry()
        .branch(message_handler)
        .branch(plugins::callback_handler())
}

/// Refresh the stored profile of the sender (runs before all handlers).
async fn track_user(msg: Message, state: AppState) {
    if let Some(user) = msg.from.as_ref() {
        state.users.clone().touch_background(user.clone());
    }
}
