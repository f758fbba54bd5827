//! Referral link.

use teloxide::prelude::*;

use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::i18n::format_text;
use crate::utils::format_points;

use super::{reply_html, require_account};

/// Handle /ref and the referral button.
pub async fn ref_command(bot: ThrottledBot, msg: Message, state: AppState) -> anyhow::Result<()> {
    let Some((account, lang)) = require_account(&bot, &msg, &state).await? else {
        return Ok(());
    };

    let text = format_text(
        lang,
        "referral.link",
        &[
            ("link", &referral_link(&state.bot_username, account.user_id)),
            ("points", &format_points(state.rewards().referral, lang)),
            ("count", &account.referral_count.to_string()),
        ],
    );
    reply_html(&bot, &msg, text).await
}

/// Deep link that registers the opener as referred by `user_id`.
pub fn referral_link(bot_username: &str, user_id: i64) -> String {
    format!("https://t.me/{bot_username}?start={user_id}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewards::parse_referrer;

    #[test]
    fn test_link_payload_parses_back() {
        let link = referral_link("poin_bot", 4242);
        assert_eq!(link, "https://t.me/poin_bot?start=4242");

        let payload = link.split("start=").nth(1).unwrap();
        assert_eq!(parse_referrer(payload, 1), Some(4242));
    }
}
