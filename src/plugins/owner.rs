//! Owner-only commands: withdrawal approval, point adjustment and stats.

use teloxide::prelude::*;

use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::bot::notify;
use crate::database::{PointKind, WithdrawListing, WithdrawRequest};
use crate::i18n::{format_text, get_text};
use crate::rewards::RewardError;
use crate::utils::{format_points, html_escape, mention_html};

use super::{reply_html, reward_error_text};

/// Pending requests listed by /pending.
const PENDING_SHOWN: i64 = 20;

/// Check the sender is registered and an owner; replies and returns `None` otherwise.
async fn owner_locale(bot: &ThrottledBot, msg: &Message, state: &AppState) -> anyhow::Result<Option<&'static str>> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(None);
    };

    let account = state.users.get(user.id.0 as i64).await?;
    let lang = state.locale(account.as_ref(), Some(user));
    if let Err(key) = owner_gate(account.is_some(), state.is_owner(user.id.0)) {
        reply_html(bot, msg, get_text(lang, key)).await?;
        return Ok(None);
    }
    Ok(Some(lang))
}

/// Registration is checked before ownership. `Err` holds the reply key.
fn owner_gate(registered: bool, owner: bool) -> Result<(), &'static str> {
    if !registered {
        Err("common.not_registered")
    } else if !owner {
        Err("common.owner_only")
    } else {
        Ok(())
    }
}

/// Handle /pending.
pub async fn pending_command(bot: ThrottledBot, msg: Message, state: AppState) -> anyhow::Result<()> {
    let Some(lang) = owner_locale(&bot, &msg, &state).await? else {
        return Ok(());
    };

    let requests = state
        .withdrawals
        .list(WithdrawListing::Pending, Some(PENDING_SHOWN))
        .await?;
    reply_html(&bot, &msg, render_pending(&requests, lang)).await
}

pub fn render_pending(requests: &[WithdrawRequest], lang: &str) -> String {
    if requests.is_empty() {
        return get_text(lang, "owner.pending_empty");
    }

    let mut text = get_text(lang, "owner.pending_header");
    for request in requests {
        let destination = request
            .destination
            .as_deref()
            .map(html_escape)
            .unwrap_or_else(|| "-".to_string());
        text.push('\n');
        text.push_str(&format_text(
            lang,
            "owner.pending_item",
            &[
                ("id", &request.request_id.to_string()),
                ("user", &mention_html(request.user_id, &request.user_id.to_string())),
                ("amount", &format_points(request.amount, lang)),
                ("destination", &destination),
            ],
        ));
    }
    text
}

/// Handle /approve <id>.
pub async fn approve_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    args: String,
) -> anyhow::Result<()> {
    let Some(lang) = owner_locale(&bot, &msg, &state).await? else {
        return Ok(());
    };
    let Some((id, _)) = parse_request_args(&args) else {
        return reply_html(&bot, &msg, get_text(lang, "owner.usage_approve")).await;
    };

    let text = match state.ledger.approve(id).await {
        Ok(Some(request)) => {
            notify::withdraw_resolved(&bot, &state, &request).await;
            format_text(lang, "owner.approved", &[("id", &id.to_string())])
        }
        Ok(None) => format_text(lang, "owner.not_found", &[("id", &id.to_string())]),
        Err(e) => reward_error_text(lang, &e),
    };
    reply_html(&bot, &msg, text).await
}

/// Handle /reject <id> [reason].
pub async fn reject_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    args: String,
) -> anyhow::Result<()> {
    let Some(lang) = owner_locale(&bot, &msg, &state).await? else {
        return Ok(());
    };
    let Some((id, reason)) = parse_request_args(&args) else {
        return reply_html(&bot, &msg, get_text(lang, "owner.usage_reject")).await;
    };

    let text = match state.ledger.reject(id, reason).await {
        Ok(Some(request)) => {
            notify::withdraw_resolved(&bot, &state, &request).await;
            format_text(lang, "owner.rejected", &[("id", &id.to_string())])
        }
        Ok(None) => format_text(lang, "owner.not_found", &[("id", &id.to_string())]),
        Err(e) => reward_error_text(lang, &e),
    };
    reply_html(&bot, &msg, text).await
}

/// Handle /addpoints <user_id> <amount>. Negative amounts remove points.
pub async fn addpoints_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    args: String,
) -> anyhow::Result<()> {
    let Some(lang) = owner_locale(&bot, &msg, &state).await? else {
        return Ok(());
    };
    let Some((user_id, amount)) = parse_addpoints_args(&args) else {
        return reply_html(&bot, &msg, get_text(lang, "owner.usage_addpoints")).await;
    };

    let text = match state
        .users
        .credit(user_id, PointKind::Adjust, amount, Some("owner".to_string()))
        .await
    {
        Ok(account) => format_text(
            lang,
            "owner.points_added",
            &[
                ("amount", &format_points(amount, lang)),
                ("user", &mention_html(account.user_id, &account.display_name())),
                ("balance", &format_points(account.points, lang)),
            ],
        ),
        Err(RewardError::NotRegistered) => get_text(lang, "owner.user_not_found"),
        Err(e) => reward_error_text(lang, &e),
    };
    reply_html(&bot, &msg, text).await
}

/// Handle /stats.
pub async fn stats_command(bot: ThrottledBot, msg: Message, state: AppState) -> anyhow::Result<()> {
    let Some(lang) = owner_locale(&bot, &msg, &state).await? else {
        return Ok(());
    };

    let users = state.users.count().await?;
    let points = state.users.total_points().await?;
    let pending = state.withdrawals.count_pending().await?;

    let text = format_text(
        lang,
        "owner.stats",
        &[
            ("users", &users.to_string()),
            ("points", &format_points(points, lang)),
            ("pending", &pending.to_string()),
        ],
    );
    reply_html(&bot, &msg, text).await
}

/// Parse `"<id> [note...]"`.
pub fn parse_request_args(args: &str) -> Option<(i64, Option<String>)> {
    let args = args.trim();
    let (id, rest) = args.split_once(char::is_whitespace).unwrap_or((args, ""));
    let id = id.trim_start_matches('#').parse::<i64>().ok()?;
    let rest = rest.trim();
    Some((id, (!rest.is_empty()).then(|| rest.to_string())))
}

/// Parse `"<user_id> <amount>"`; the amount may be negative, never zero.
pub fn parse_addpoints_args(args: &str) -> Option<(i64, i64)> {
    let mut parts = args.split_whitespace();
    let user_id = parts.next()?.parse::<i64>().ok()?;
    let amount = parts.next()?.parse::<i64>().ok()?;
    if parts.next().is_some() || amount == 0 {
        return None;
    }
    Some((user_id, amount))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_gate_checks_registration_first() {
        assert_eq!(owner_gate(false, false), Err("common.not_registered"));
        assert_eq!(owner_gate(false, true), Err("common.not_registered"));
        assert_eq!(owner_gate(true, false), Err("common.owner_only"));
        assert_eq!(owner_gate(true, true), Ok(()));
    }

    #[test]
    fn test_parse_request_args() {
        assert_eq!(parse_request_args("12"), Some((12, None)));
        assert_eq!(parse_request_args("#12"), Some((12, None)));
        assert_eq!(
            parse_request_args(" 7  wrong number "),
            Some((7, Some("wrong number".to_string())))
        );
        assert_eq!(parse_request_args(""), None);
        assert_eq!(parse_request_args("abc"), None);
    }

    #[test]
    fn test_parse_addpoints_args() {
        assert_eq!(parse_addpoints_args("100 50"), Some((100, 50)));
        assert_eq!(parse_addpoints_args("100 -20"), Some((100, -20)));
        assert_eq!(parse_addpoints_args("100 0"), None);
        assert_eq!(parse_addpoints_args("100"), None);
        assert_eq!(parse_addpoints_args("100 5 extra"), None);
    }

    #[test]
    fn test_render_pending() {
        let request = WithdrawRequest::new(3, 42, 1200, Some("<DANA>".into()), 0);
        let text = render_pending(&[request], "en");
        assert!(text.contains("#3"));
        assert!(text.contains("tg://user?id=42"));
        assert!(text.contains("1,200"));
        assert!(text.contains("&lt;DANA&gt;"));
    }
}
