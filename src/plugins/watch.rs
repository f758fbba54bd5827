//! Watch-ads link.

use teloxide::prelude::*;

use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::i18n::format_text;
use crate::utils::html_escape;

use super::{reply_html, require_account};

/// Handle /watch and the watch-ads button.
pub async fn watch_command(bot: ThrottledBot, msg: Message, state: AppState) -> anyhow::Result<()> {
    let Some((account, lang)) = require_account(&bot, &msg, &state).await? else {
        return Ok(());
    };

    let url = state.watch_url(account.user_id);
    let text = format_text(lang, "watch.link", &[("url", &html_escape(&url))]);
    reply_html(&bot, &msg, text).await
}
