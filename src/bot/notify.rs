//! Outgoing notifications that are not replies to an incoming update.

use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tracing::warn;

use super::dispatcher::{AppState, ThrottledBot};
use crate::database::{UserAccount, WithdrawRequest, WithdrawStatus};
use crate::i18n::format_text;
use crate::utils::{format_points, html_escape};

/// Send an HTML message to a user's private chat, logging failures.
///
/// Users may have blocked the bot; that must not fail the caller.
async fn send_private(bot: &ThrottledBot, user_id: i64, text: String) {
    if let Err(e) = bot
        .send_message(ChatId(user_id), text)
        .parse_mode(ParseMode::Html)
        .await
    {
        warn!("Failed to notify user {}: {}", user_id, e);
    }
}

/// Tell a user their withdrawal was approved or rejected.
pub async fn withdraw_resolved(bot: &ThrottledBot, state: &AppState, request: &WithdrawRequest) {
    let account = state.users.get(request.user_id).await.ok().flatten();
    let lang = state.locale(account.as_ref(), None);

    let id = request.request_id.to_string();
    let amount = format_points(request.amount, lang);
    let text = match request.status {
        WithdrawStatus::Approved => format_text(
            lang,
            "withdraw.approved_notice",
            &[("id", &id), ("amount", &amount)],
        ),
        WithdrawStatus::Rejected => {
            let reason = request
                .note
                .as_deref()
                .map(|r| format!(" ({})", html_escape(r)))
                .unwrap_or_default();
            format_text(
                lang,
                "withdraw.rejected_notice",
                &[("id", &id), ("amount", &amount), ("reason", &reason)],
            )
        }
        WithdrawStatus::Pending => return,
    };

    send_private(bot, request.user_id, text).await;
}

/// Confirm an ad reward in the user's chat.
pub async fn ad_rewarded(bot: &ThrottledBot, account: &UserAccount, points: i64) {
    let lang = crate::i18n::resolve_locale(account.lang.as_deref(), None);
    let text = format_text(
        lang,
        "watch.rewarded",
        &[
            ("points", &format_points(points, lang)),
            ("balance", &format_points(account.points, lang)),
        ],
    );
    send_private(bot, account.user_id, text).await;
}

/// Tell a referrer that someone joined through their link.
pub async fn referral_credited(bot: &ThrottledBot, referrer: &UserAccount, new_user: &str, points: i64) {
    let lang = crate::i18n::resolve_locale(referrer.lang.as_deref(), None);
    let text = format_text(
        lang,
        "referral.credited",
        &[
            ("name", &html_escape(new_user)),
            ("points", &format_points(points, lang)),
        ],
    );
    send_private(bot, referrer.user_id, text).await;
}
