//! Plugin system for command handlers.
//!
//! Add new plugins by:
//! 1. Creating a new file in this directory
//! 2. Adding `pub mod your_plugin;` below
//! 3. Adding the handler to `command_handler()` (and `MenuAction` if it
//!    has a keyboard button)

pub mod balance;
pub mod bonus;
pub mod help;
pub mod leaderboard;
pub mod menu;
pub mod owner;
pub mod quiz;
pub mod referral;
pub mod start;
pub mod watch;
pub mod withdraw;

use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use teloxide::utils::command::BotCommands;
use tracing::error;

use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::database::UserAccount;
use crate::i18n::{format_text, get_text};
use crate::rewards::RewardError;
use crate::utils::format_points;

/// All bot commands.
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Perintah yang tersedia:")]
pub enum Command {
    #[command(description = "Daftar dan tampilkan menu")]
    Start(String),

    #[command(description = "Bantuan")]
    Help,

    #[command(description = "Cek poin")]
    Balance,

    #[command(description = "Riwayat poin")]
    History,

    #[command(description = "Link nonton iklan")]
    Watch,

    #[command(description = "Klaim bonus harian")]
    Daily,

    #[command(description = "Lucky Spin harian")]
    Spin,

    #[command(description = "Kuis harian")]
    Quiz,

    #[command(description = "Link referral")]
    Ref,

    #[command(description = "Top 10 poin")]
    Leaderboard,

    #[command(description = "Tarik poin")]
    Withdraw(String),

    #[command(description = "Riwayat withdraw")]
    Withdrawals,

    #[command(description = "Ganti bahasa (id/en)")]
    Lang(String),

    // Owner commands
    #[command(description = "Withdraw yang menunggu")]
    Pending,

    #[command(description = "Setujui withdraw")]
    Approve(String),

    #[command(description = "Tolak withdraw")]
    Reject(String),

    #[command(description = "Tambah/kurangi poin user")]
    Addpoints(String),

    #[command(description = "Statistik bot")]
    Stats,
}

/// Build the combined command handler.
pub fn command_handler() -> UpdateHandler<anyhow::Error> {
    use dptree::case;

    teloxide::filter_command::<Command, _>()
        .branch(case![Command::Start(args)].endpoint(start::start_command))
        .branch(case![Command::Help].endpoint(help::help_command))
        .branch(case![Command::Lang(args)].endpoint(help::lang_command))
        // Points
        .branch(case![Command::Balance].endpoint(balance::balance_command))
        .branch(case![Command::History].endpoint(balance::history_command))
        .branch(case![Command::Watch].endpoint(watch::watch_command))
        .branch(case![Command::Daily].endpoint(bonus::daily_command))
        .branch(case![Command::Spin].endpoint(bonus::spin_command))
        .branch(case![Command::Quiz].endpoint(quiz::quiz_command))
        .branch(case![Command::Ref].endpoint(referral::ref_command))
        .branch(case![Command::Leaderboard].endpoint(leaderboard::leaderboard_command))
        // Withdraw
        .branch(case![Command::Withdraw(args)].endpoint(withdraw::withdraw_command))
        .branch(case![Command::Withdrawals].endpoint(withdraw::withdrawals_command))
        // Owner
        .branch(case![Command::Pending].endpoint(owner::pending_command))
        .branch(case![Command::Approve(args)].endpoint(owner::approve_command))
        .branch(case![Command::Reject(args)].endpoint(owner::reject_command))
        .branch(case![Command::Addpoints(args)].endpoint(owner::addpoints_command))
        .branch(case![Command::Stats].endpoint(owner::stats_command))
}

/// Build the reply-keyboard button handler.
pub fn menu_handler() -> UpdateHandler<anyhow::Error> {
    dptree::filter_map(|msg: Message| msg.text().and_then(menu::MenuAction::from_text))
        .endpoint(menu::menu_dispatch)
}

/// Build the handler for replies to the withdraw prompt.
pub fn withdraw_input_handler() -> UpdateHandler<anyhow::Error> {
    dptree::filter(|msg: Message, state: AppState| {
        msg.text().is_some()
            && msg
                .from
                .as_ref()
                .map(|u| state.pending_withdraws.contains(&(u.id.0 as i64)))
                .unwrap_or(false)
    })
    .endpoint(withdraw::withdraw_input)
}

/// Build the callback query handler.
pub fn callback_handler() -> UpdateHandler<anyhow::Error> {
    Update::filter_callback_query().branch(
        dptree::filter(|q: CallbackQuery| {
            q.data
                .as_ref()
                .map(|d| d.starts_with(quiz::CALLBACK_PREFIX))
                .unwrap_or(false)
        })
        .endpoint(quiz::quiz_callback),
    )
}

/// Send an HTML reply in the message's chat.
pub(crate) async fn reply_html(bot: &ThrottledBot, msg: &Message, text: String) -> anyhow::Result<()> {
    bot.send_message(msg.chat.id, text)
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

/// Load the sender's account, or tell them to /start first.
///
/// Returns the account with its effective locale.
pub(crate) async fn require_account(
    bot: &ThrottledBot,
    msg: &Message,
    state: &AppState,
) -> anyhow::Result<Option<(UserAccount, &'static str)>> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(None);
    };

    match state.users.get(user.id.0 as i64).await? {
        Some(account) => {
            let lang = state.locale(Some(&account), Some(user));
            Ok(Some((account, lang)))
        }
        None => {
            let lang = state.locale(None, Some(user));
            reply_html(bot, msg, get_text(lang, "common.not_registered")).await?;
            Ok(None)
        }
    }
}

/// User-facing text for errors shared by several commands.
///
/// Cooldowns are worded per command and are handled by the callers.
pub(crate) fn reward_error_text(lang: &str, err: &RewardError) -> String {
    match err {
        RewardError::NotRegistered => get_text(lang, "common.not_registered"),
        RewardError::BelowMinimum { minimum } => format_text(
            lang,
            "withdraw.below_minimum",
            &[("min", &format_points(*minimum, lang))],
        ),
        RewardError::InvalidAmount => get_text(lang, "withdraw.invalid_amount"),
        RewardError::InsufficientPoints { balance, .. } => format_text(
            lang,
            "withdraw.insufficient",
            &[("balance", &format_points(*balance, lang))],
        ),
        RewardError::Database(e) => {
            error!("Database error: {}", e);
            get_text(lang, "common.error")
        }
        other => {
            error!("Unexpected reward error: {}", other);
            get_text(lang, "common.error")
        }
    }
}
