//! Withdrawals: request, history and the amount prompt.

use teloxide::prelude::*;
use teloxide::types::{ForceReply, ParseMode};

use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::database::WithdrawRequest;
use crate::i18n::{format_text, get_text};
use crate::rewards::parse_withdraw_input;
use crate::utils::format_points;

use super::{reply_html, require_account, reward_error_text};

/// Requests listed by /withdrawals.
const HISTORY_SHOWN: i64 = 10;

/// Handle /withdraw and the withdraw button.
///
/// With arguments (`/withdraw 150 DANA 0812...`) the request is filed
/// directly; without, the user is asked for the amount.
pub async fn withdraw_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    args: String,
) -> anyhow::Result<()> {
    let Some((account, lang)) = require_account(&bot, &msg, &state).await? else {
        return Ok(());
    };

    if !args.trim().is_empty() {
        state.pending_withdraws.invalidate(&account.user_id);
        return submit(&bot, &msg, &state, account.user_id, lang, &args).await;
    }

    state.pending_withdraws.insert(account.user_id, ());
    let text = format_text(
        lang,
        "withdraw.prompt",
        &[("min", &format_points(state.rewards().min_withdraw, lang))],
    );
    bot.send_message(msg.chat.id, text)
        .parse_mode(ParseMode::Html)
        .reply_markup(ForceReply::new().selective())
        .await?;

    Ok(())
}

/// Handle the text sent after the withdraw prompt.
pub async fn withdraw_input(bot: ThrottledBot, msg: Message, state: AppState) -> anyhow::Result<()> {
    let (Some(user), Some(text)) = (msg.from.as_ref(), msg.text()) else {
        return Ok(());
    };
    let user_id = user.id.0 as i64;
    if state.pending_withdraws.take(&user_id).is_none() {
        return Ok(());
    }

    let account = state.users.get(user_id).await?;
    let lang = state.locale(account.as_ref(), Some(user));
    submit(&bot, &msg, &state, user_id, lang, text).await
}

async fn submit(
    bot: &ThrottledBot,
    msg: &Message,
    state: &AppState,
    user_id: i64,
    lang: &str,
    input: &str,
) -> anyhow::Result<()> {
    let text = match parse_withdraw_input(input) {
        Err(e) => reward_error_text(lang, &e),
        Ok((amount, destination)) => match state.ledger.submit_withdraw(user_id, amount, destination).await {
            Ok((request, _)) => format_text(
                lang,
                "withdraw.submitted",
                &[
                    ("id", &request.request_id.to_string()),
                    ("amount", &format_points(request.amount, lang)),
                ],
            ),
            Err(e) => reward_error_text(lang, &e),
        },
    };

    reply_html(bot, msg, text).await
}

/// Handle /withdrawals and the withdraw history button.
pub async fn withdrawals_command(bot: ThrottledBot, msg: Message, state: AppState) -> anyhow::Result<()> {
    let Some((account, lang)) = require_account(&bot, &msg, &state).await? else {
        return Ok(());
    };

    let requests = state
        .withdrawals
        .list_for_user(account.user_id, HISTORY_SHOWN)
        .await?;
    reply_html(&bot, &msg, render_withdrawals(&requests, lang)).await
}

pub fn render_withdrawals(requests: &[WithdrawRequest], lang: &str) -> String {
    if requests.is_empty() {
        return get_text(lang, "withdraw.history_empty");
    }

    let mut text = get_text(lang, "withdraw.history_header");
    for request in requests {
        let status = get_text(lang, &format!("withdraw.status.{}", request.status.as_str()));
        text.push('\n');
        text.push_str(&format_text(
            lang,
            "withdraw.history_item",
            &[
                ("id", &request.request_id.to_string()),
                ("amount", &format_points(request.amount, lang)),
                ("status", &status),
            ],
        ));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::WithdrawStatus;

    #[test]
    fn test_render_withdrawals() {
        let mut approved = WithdrawRequest::new(2, 1, 2500, None, 0);
        approved.status = WithdrawStatus::Approved;
        let pending = WithdrawRequest::new(1, 1, 150, Some("DANA".into()), 0);

        let text = render_withdrawals(&[approved, pending], "en");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "#2 • 2,500 points [approved]");
        assert_eq!(lines[2], "#1 • 150 points [pending]");
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render_withdrawals(&[], "id"), get_text("id", "withdraw.history_empty"));
    }
}
