//! /start command plugin.
//!
//! Registers the user (crediting a referrer from the deep-link payload)
//! and shows the main menu keyboard.

use teloxide::prelude::*;
use teloxide::types::{KeyboardButton, KeyboardMarkup, ParseMode};
use tracing::error;

use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::bot::notify;
use crate::i18n::{format_text, get_text};
use crate::rewards::parse_referrer;
use crate::utils::{format_points, html_escape};

use super::reward_error_text;

/// Handle the /start command, with an optional referral payload.
pub async fn start_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    args: String,
) -> anyhow::Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    let user_id = user.id.0 as i64;
    let referrer = parse_referrer(&args, user_id);
    let reward = state.rewards().referral;

    let registration = match state.users.register(user, referrer, reward).await {
        Ok(registration) => registration,
        Err(e) => {
            let lang = state.locale(None, Some(user));
            bot.send_message(msg.chat.id, reward_error_text(lang, &e)).await?;
            return Ok(());
        }
    };

    if let Some(referrer) = registration.referrer.as_ref() {
        notify::referral_credited(&bot, referrer, &user.first_name, reward).await;
    }

    let account = &registration.account;
    let lang = state.locale(Some(account), Some(user));
    let name = html_escape(&user.first_name);

    let text = if registration.created {
        let mut text = format_text(
            lang,
            "start.welcome",
            &[
                ("name", &name),
                ("min", &format_points(state.rewards().min_withdraw, lang)),
            ],
        );
        if account.referred_by.is_some() {
            text.push_str("\n\n");
            text.push_str(&get_text(lang, "start.referred"));
        }
        text
    } else {
        format_text(
            lang,
            "start.welcome_back",
            &[("name", &name), ("points", &format_points(account.points, lang))],
        )
    };

    if let Err(e) = bot
        .send_message(msg.chat.id, text)
        .parse_mode(ParseMode::Html)
        .reply_markup(main_menu(lang))
        .await
    {
        error!("Failed to send welcome to {}: {}", user_id, e);
    }

    Ok(())
}

/// Main menu reply keyboard in the given language.
pub fn main_menu(lang: &str) -> KeyboardMarkup {
    let button = |key: &str| KeyboardButton::new(get_text(lang, &format!("menu.{key}")));

    KeyboardMarkup::new(vec![
        vec![button("watch")],
        vec![button("balance"), button("withdraw")],
        vec![button("withdrawals"), button("daily")],
        vec![button("spin"), button("quiz")],
        vec![button("referral"), button("leaderboard")],
    ])
    .resize_keyboard()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_main_menu_layout() {
        let menu = main_menu("en");
        assert_eq!(menu.keyboard.len(), 5);
        assert_eq!(menu.keyboard[0].len(), 1);
        assert_eq!(menu.keyboard[0][0].text, get_text("en", "menu.watch"));
        assert!(menu.keyboard.iter().skip(1).all(|row| row.len() == 2));
    }
}
