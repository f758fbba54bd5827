//! /help and /lang.

use teloxide::prelude::*;
use teloxide::types::ParseMode;

use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::i18n::{get_text, known_lang};

use super::start::main_menu;
use super::{reply_html, require_account};

/// Handle /help. Owners also see the owner commands.
pub async fn help_command(bot: ThrottledBot, msg: Message, state: AppState) -> anyhow::Result<()> {
    let Some((account, lang)) = require_account(&bot, &msg, &state).await? else {
        return Ok(());
    };

    let is_owner = state.is_owner(account.user_id as u64);
    reply_html(&bot, &msg, help_text(lang, is_owner)).await
}

pub fn help_text(lang: &str, is_owner: bool) -> String {
    let mut text = get_text(lang, "help.text");
    if is_owner {
        text.push_str(&get_text(lang, "help.owner"));
    }
    text
}

/// Handle /lang <id|en>.
pub async fn lang_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    args: String,
) -> anyhow::Result<()> {
    let Some((account, lang)) = require_account(&bot, &msg, &state).await? else {
        return Ok(());
    };

    let Some(new_lang) = known_lang(args.trim()) else {
        return reply_html(&bot, &msg, get_text(lang, "lang.usage")).await;
    };

    state.users.set_lang(account.user_id, new_lang).await?;

    // Resend the keyboard so the button labels follow the new language
    bot.send_message(msg.chat.id, get_text(new_lang, "lang.saved"))
        .parse_mode(ParseMode::Html)
        .reply_markup(main_menu(new_lang))
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_section_only_for_owners() {
        let owner = get_text("en", "help.owner");
        assert!(!help_text("en", false).contains(&owner));
        assert!(help_text("en", true).ends_with(&owner));
    }
}
