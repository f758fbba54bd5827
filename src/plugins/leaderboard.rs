//! Top users by points.

use teloxide::prelude::*;

use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::database::UserAccount;
use crate::i18n::{format_text, get_text};
use crate::utils::{format_points, html_escape};

use super::{reply_html, require_account};

/// Entries shown on the leaderboard.
pub const LEADERBOARD_SIZE: usize = 10;

/// Handle /leaderboard and the leaderboard button.
pub async fn leaderboard_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
) -> anyhow::Result<()> {
    let Some((_, lang)) = require_account(&bot, &msg, &state).await? else {
        return Ok(());
    };

    let top = state.users.top(LEADERBOARD_SIZE).await?;
    reply_html(&bot, &msg, render_leaderboard(&top, lang)).await
}

pub fn render_leaderboard(users: &[UserAccount], lang: &str) -> String {
    if users.is_empty() {
        return get_text(lang, "leaderboard.empty");
    }

    let mut text = get_text(lang, "leaderboard.header");
    for (i, user) in users.iter().enumerate() {
        let rank = match i {
            0 => "🥇".to_string(),
            1 => "🥈".to_string(),
            2 => "🥉".to_string(),
            _ => format!("{}.", i + 1),
        };
        text.push('\n');
        text.push_str(&format_text(
            lang,
            "leaderboard.item",
            &[
                ("rank", &rank),
                ("name", &html_escape(&user.display_name())),
                ("points", &format_points(user.points, lang)),
            ],
        ));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i64, name: &str, points: i64) -> UserAccount {
        UserAccount {
            user_id: id,
            username: None,
            first_name: name.to_string(),
            lang: None,
            points,
            history: Vec::new(),
            referred_by: None,
            referral_count: 0,
            last_daily: None,
            last_spin: None,
            last_quiz: None,
            created_at: 0,
        }
    }

    #[test]
    fn test_render() {
        let users = vec![user(1, "A&B", 3000), user(2, "Budi", 20), user(3, "Cici", 10), user(4, "Dodi", 5)];
        let text = render_leaderboard(&users, "en");
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 5);
        assert!(lines[1].starts_with("🥇"));
        assert!(lines[1].contains("A&amp;B"));
        assert!(lines[1].contains("3,000"));
        assert!(lines[4].starts_with("4."));
    }

    #[test]
    fn test_empty() {
        assert_eq!(render_leaderboard(&[], "id"), get_text("id", "leaderboard.empty"));
    }
}
