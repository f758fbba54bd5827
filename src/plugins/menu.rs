//! Main menu buttons.
//!
//! The reply keyboard sends its label as plain text; labels are matched
//! in every language so a button keeps working after /lang.

use teloxide::prelude::*;

use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::i18n::{get_text, LANGS};

use super::{balance, bonus, leaderboard, quiz, referral, watch, withdraw};

/// Action behind a main menu button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Watch,
    Balance,
    Withdraw,
    Withdrawals,
    Daily,
    Spin,
    Quiz,
    Referral,
    Leaderboard,
}

impl MenuAction {
    pub const ALL: [MenuAction; 9] = [
        Self::Watch,
        Self::Balance,
        Self::Withdraw,
        Self::Withdrawals,
        Self::Daily,
        Self::Spin,
        Self::Quiz,
        Self::Referral,
        Self::Leaderboard,
    ];

    /// Translation key of the button label.
    pub fn key(self) -> &'static str {
        match self {
            Self::Watch => "menu.watch",
            Self::Balance => "menu.balance",
            Self::Withdraw => "menu.withdraw",
            Self::Withdrawals => "menu.withdrawals",
            Self::Daily => "menu.daily",
            Self::Spin => "menu.spin",
            Self::Quiz => "menu.quiz",
            Self::Referral => "menu.referral",
            Self::Leaderboard => "menu.leaderboard",
        }
    }

    /// Match a button label in any language.
    pub fn from_text(text: &str) -> Option<Self> {
        let text = text.trim();
        Self::ALL
            .into_iter()
            .find(|action| LANGS.iter().any(|lang| get_text(lang, action.key()) == text))
    }
}

/// Route a menu button to its command handler.
pub async fn menu_dispatch(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    action: MenuAction,
) -> anyhow::Result<()> {
    match action {
        MenuAction::Watch => watch::watch_command(bot, msg, state).await,
        MenuAction::Balance => balance::balance_command(bot, msg, state).await,
        MenuAction::Withdraw => withdraw::withdraw_command(bot, msg, state, String::new()).await,
        MenuAction::Withdrawals => withdraw::withdrawals_command(bot, msg, state).await,
        MenuAction::Daily => bonus::daily_command(bot, msg, state).await,
        MenuAction::Spin => bonus::spin_command(bot, msg, state).await,
        MenuAction::Quiz => quiz::quiz_command(bot, msg, state).await,
        MenuAction::Referral => referral::ref_command(bot, msg, state).await,
        MenuAction::Leaderboard => leaderboard::leaderboard_command(bot, msg, state).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_in_both_languages() {
        for action in MenuAction::ALL {
            for lang in LANGS {
                let label = get_text(lang, action.key());
                assert_eq!(MenuAction::from_text(&label), Some(action), "{lang}: {label}");
            }
        }
    }

    #[test]
    fn test_unknown_text() {
        assert_eq!(MenuAction::from_text("hello"), None);
        assert_eq!(MenuAction::from_text(""), None);
    }
}
