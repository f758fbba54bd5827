//! Daily quiz.
//!
//! `/quiz` sends a random active question with one inline button per
//! option. The answer consumes the day's quiz window whether or not it is
//! correct; only a correct answer pays.

use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, ParseMode};
use tracing::warn;

use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::database::Quiz;
use crate::i18n::{format_text, get_text};
use crate::rewards::{cooldown_remaining, ClaimKind, RewardError};
use crate::utils::{format_points, html_escape};

use super::bonus::cooldown_text;
use super::{reply_html, require_account, reward_error_text};

/// Callback data prefix: `quiz:<quiz_id>:<option>`.
pub const CALLBACK_PREFIX: &str = "quiz:";

/// Handle /quiz and the quiz button.
pub async fn quiz_command(bot: ThrottledBot, msg: Message, state: AppState) -> anyhow::Result<()> {
    let Some((account, lang)) = require_account(&bot, &msg, &state).await? else {
        return Ok(());
    };

    let now = chrono::Utc::now().timestamp();
    if let Some(remaining) = cooldown_remaining(account.last_quiz, now) {
        return reply_html(&bot, &msg, cooldown_text(lang, ClaimKind::Quiz, remaining)).await;
    }

    let Some(quiz) = state.quizzes.random_active().await? else {
        return reply_html(&bot, &msg, get_text(lang, "quiz.empty")).await;
    };

    bot.send_message(msg.chat.id, question_text(&quiz, lang))
        .parse_mode(ParseMode::Html)
        .reply_markup(answer_keyboard(&quiz))
        .await?;

    Ok(())
}

/// Handle a press on one of the answer buttons.
pub async fn quiz_callback(bot: ThrottledBot, q: CallbackQuery, state: AppState) -> anyhow::Result<()> {
    let Some((quiz_id, option)) = q.data.as_deref().and_then(parse_callback) else {
        bot.answer_callback_query(&q.id).await?;
        return Ok(());
    };

    let user_id = q.from.id.0 as i64;
    let account = state.users.get(user_id).await?;
    let lang = state.locale(account.as_ref(), Some(&q.from));

    let quiz = state.quizzes.get(quiz_id).await?.filter(|quiz| quiz.active);
    let Some(quiz) = quiz else {
        bot.answer_callback_query(&q.id)
            .text(get_text(lang, "quiz.expired"))
            .await?;
        return Ok(());
    };

    let correct = quiz.is_correct(option);
    let amount = if correct { quiz.reward } else { 0 };
    let now = chrono::Utc::now().timestamp();

    let result = match state
        .users
        .claim(user_id, ClaimKind::Quiz, amount, Some(format!("#{quiz_id}")), now)
        .await
    {
        Ok(_) if correct => format_text(lang, "quiz.correct", &[("points", &format_points(amount, lang))]),
        Ok(_) => format_text(
            lang,
            "quiz.wrong",
            &[("answer", &html_escape(quiz.correct_option().unwrap_or("-")))],
        ),
        Err(RewardError::Cooldown { remaining }) => {
            bot.answer_callback_query(&q.id)
                .text(cooldown_text(lang, ClaimKind::Quiz, remaining))
                .show_alert(true)
                .await?;
            return Ok(());
        }
        Err(e) => {
            bot.answer_callback_query(&q.id)
                .text(reward_error_text(lang, &e))
                .await?;
            return Ok(());
        }
    };

    bot.answer_callback_query(&q.id).await?;

    let text = format!("{}\n\n{}", question_text(&quiz, lang), result);
    match q.message.as_ref() {
        Some(message) => {
            if let Err(e) = bot
                .edit_message_text(message.chat().id, message.id(), text)
                .parse_mode(ParseMode::Html)
                .await
            {
                warn!("Failed to edit quiz message for {}: {}", user_id, e);
            }
        }
        None => {
            bot.send_message(ChatId(user_id), text)
                .parse_mode(ParseMode::Html)
                .await?;
        }
    }

    Ok(())
}

fn question_text(quiz: &Quiz, lang: &str) -> String {
    format_text(
        lang,
        "quiz.question",
        &[
            ("question", &html_escape(&quiz.question)),
            ("points", &format_points(quiz.reward, lang)),
        ],
    )
}

/// One button per option, each on its own row.
fn answer_keyboard(quiz: &Quiz) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(quiz.options.iter().enumerate().map(|(i, option)| {
        vec![InlineKeyboardButton::callback(
            option.clone(),
            format!("{}{}:{}", CALLBACK_PREFIX, quiz.quiz_id, i),
        )]
    }))
}

/// Parse `quiz:<quiz_id>:<option>`.
pub fn parse_callback(data: &str) -> Option<(i64, usize)> {
    let rest = data.strip_prefix(CALLBACK_PREFIX)?;
    let (quiz_id, option) = rest.split_once(':')?;
    Some((quiz_id.parse().ok()?, option.parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use teloxide::types::InlineKeyboardButtonKind;

    #[test]
    fn test_parse_callback() {
        assert_eq!(parse_callback("quiz:12:3"), Some((12, 3)));
        assert_eq!(parse_callback("quiz:12"), None);
        assert_eq!(parse_callback("quiz:x:1"), None);
        assert_eq!(parse_callback("quiz:1:-1"), None);
        assert_eq!(parse_callback("other:1:1"), None);
    }

    #[test]
    fn test_keyboard_round_trips_through_parser() {
        let quiz = Quiz::new(7, "Q?".into(), vec!["a".into(), "b".into(), "c".into()], 1, 15).unwrap();
        let keyboard = answer_keyboard(&quiz);
        assert_eq!(keyboard.inline_keyboard.len(), 3);

        let InlineKeyboardButtonKind::CallbackData(data) = &keyboard.inline_keyboard[2][0].kind else {
            panic!("expected callback button");
        };
        assert_eq!(parse_callback(data), Some((7, 2)));
    }
}
