//! Balance and point history.

use teloxide::prelude::*;

use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::database::{PointEntry, UserAccount};
use crate::i18n::{format_text, get_text};
use crate::utils::{format_points, format_timestamp, html_escape};

use super::{reply_html, require_account};

/// Entries shown under the balance.
const BALANCE_HISTORY: usize = 10;
/// Entries shown by /history.
const HISTORY_SHOWN: usize = 25;

/// Handle /balance and the balance button.
pub async fn balance_command(bot: ThrottledBot, msg: Message, state: AppState) -> anyhow::Result<()> {
    let Some((account, lang)) = require_account(&bot, &msg, &state).await? else {
        return Ok(());
    };

    let mut text = format_text(
        lang,
        "balance.summary",
        &[
            ("points", &format_points(account.points, lang)),
            ("referrals", &account.referral_count.to_string()),
        ],
    );
    text.push_str("\n\n");
    text.push_str(&render_history(&account, lang, BALANCE_HISTORY));
    reply_html(&bot, &msg, text).await
}

/// Handle /history.
pub async fn history_command(bot: ThrottledBot, msg: Message, state: AppState) -> anyhow::Result<()> {
    let Some((account, lang)) = require_account(&bot, &msg, &state).await? else {
        return Ok(());
    };
    reply_html(&bot, &msg, render_history(&account, lang, HISTORY_SHOWN)).await
}

/// Newest-first history block.
pub fn render_history(account: &UserAccount, lang: &str, limit: usize) -> String {
    let lines: Vec<String> = account
        .recent_history(limit)
        .map(|entry| render_entry(entry, lang))
        .collect();

    if lines.is_empty() {
        return get_text(lang, "balance.history_empty");
    }
    format!("{}\n{}", get_text(lang, "balance.history_header"), lines.join("\n"))
}

fn render_entry(entry: &PointEntry, lang: &str) -> String {
    let sign = if entry.amount >= 0 { "+" } else { "" };
    let note = entry
        .note
        .as_deref()
        .map(|n| format!(" ({})", html_escape(n)))
        .unwrap_or_default();

    format!(
        "<code>{}</code> {}{} {}{}",
        format_timestamp(entry.at),
        sign,
        format_points(entry.amount, lang),
        get_text(lang, &format!("history.{}", entry.kind.as_str())),
        note,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::PointKind;

    fn account(history: Vec<PointEntry>) -> UserAccount {
        UserAccount {
            user_id: 1,
            username: None,
            first_name: "Ana".to_string(),
            lang: None,
            points: 30,
            history,
            referred_by: None,
            referral_count: 0,
            last_daily: None,
            last_spin: None,
            last_quiz: None,
            created_at: 0,
        }
    }

    #[test]
    fn test_empty_history() {
        assert_eq!(
            render_history(&account(vec![]), "en", 5),
            get_text("en", "balance.history_empty")
        );
    }

    #[test]
    fn test_history_newest_first() {
        let history = vec![
            PointEntry::new(PointKind::Daily, 20, None, 0),
            PointEntry::new(PointKind::Withdraw, -1500, Some("<x>".to_string()), 60),
        ];
        let text = render_history(&account(history), "en", 5);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("-1,500 Withdraw (&lt;x&gt;)"));
        assert!(lines[2].contains("+20 Daily bonus"));
    }
}
