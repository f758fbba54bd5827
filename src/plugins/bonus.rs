//! Daily bonus and Lucky Spin.
//!
//! Both are once per 24 hours; the window is enforced by the atomic claim
//! in the user repository, not by the pre-checks here.

use std::time::Duration;

use teloxide::prelude::*;

use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::i18n::format_text;
use crate::rewards::{roll_spin, ClaimKind, RewardError};
use crate::utils::{format_points, format_remaining};

use super::{reply_html, require_account, reward_error_text};

/// Handle /daily and the daily bonus button.
pub async fn daily_command(bot: ThrottledBot, msg: Message, state: AppState) -> anyhow::Result<()> {
    let amount = state.rewards().daily;
    claim_and_reply(&bot, &msg, &state, ClaimKind::Daily, amount).await
}

/// Handle /spin and the Lucky Spin button.
pub async fn spin_command(bot: ThrottledBot, msg: Message, state: AppState) -> anyhow::Result<()> {
    let amount = roll_spin(&mut rand::thread_rng(), state.rewards().spin_max);
    claim_and_reply(&bot, &msg, &state, ClaimKind::Spin, amount).await
}

async fn claim_and_reply(
    bot: &ThrottledBot,
    msg: &Message,
    state: &AppState,
    kind: ClaimKind,
    amount: i64,
) -> anyhow::Result<()> {
    let Some((account, lang)) = require_account(bot, msg, state).await? else {
        return Ok(());
    };

    let now = chrono::Utc::now().timestamp();
    let text = match state
        .users
        .claim(account.user_id, kind, amount, None, now)
        .await
    {
        Ok(_) => format_text(
            lang,
            success_key(kind),
            &[("points", &format_points(amount, lang))],
        ),
        Err(RewardError::Cooldown { remaining }) => cooldown_text(lang, kind, remaining),
        Err(e) => reward_error_text(lang, &e),
    };

    reply_html(bot, msg, text).await
}

fn success_key(kind: ClaimKind) -> &'static str {
    match kind {
        ClaimKind::Daily => "daily.claimed",
        ClaimKind::Spin => "spin.result",
        ClaimKind::Quiz => "quiz.correct",
    }
}

/// Localized "come back later" text for a claim kind.
pub fn cooldown_text(lang: &str, kind: ClaimKind, remaining: Duration) -> String {
    let key = match kind {
        ClaimKind::Daily => "daily.cooldown",
        ClaimKind::Spin => "spin.cooldown",
        ClaimKind::Quiz => "quiz.cooldown",
    };
    format_text(lang, key, &[("remaining", &format_remaining(remaining, lang))])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cooldown_text() {
        let text = cooldown_text("en", ClaimKind::Daily, Duration::from_secs(2 * 3600 + 5 * 60));
        assert!(text.contains("2h 5m"), "{text}");
        assert!(cooldown_text("en", ClaimKind::Spin, Duration::from_secs(30)).contains("30s"));
    }
}
