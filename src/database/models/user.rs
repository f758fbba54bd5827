//! User account model.
//!
//! One document per Telegram user: balance, capped point history,
//! referral link and the timestamps of the last claims.

use mongodb::bson::{doc, Document};
use serde::{Deserialize, Serialize};
use teloxide::types::User;

use crate::rewards::ClaimKind;

/// Number of history entries kept per user (newest win).
pub const HISTORY_LIMIT: i32 = 50;

/// Where a balance change came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointKind {
    Ad,
    Daily,
    Spin,
    Quiz,
    Referral,
    Withdraw,
    Refund,
    Adjust,
}

impl PointKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ad => "ad",
            Self::Daily => "daily",
            Self::Spin => "spin",
            Self::Quiz => "quiz",
            Self::Referral => "referral",
            Self::Withdraw => "withdraw",
            Self::Refund => "refund",
            Self::Adjust => "adjust",
        }
    }
}

/// One balance change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointEntry {
    pub kind: PointKind,
    /// Signed change (withdrawals are negative).
    pub amount: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Unix timestamp.
    pub at: i64,
}

impl PointEntry {
    pub fn new(kind: PointKind, amount: i64, note: Option<String>, at: i64) -> Self {
        Self {
            kind,
            amount,
            note,
            at,
        }
    }

    /// BSON form used inside `$push` updates.
    pub fn to_document(&self) -> Document {
        let mut entry = doc! {
            "kind": self.kind.as_str(),
            "amount": self.amount,
            "at": self.at,
        };
        if let Some(note) = &self.note {
            entry.insert("note", note.as_str());
        }
        entry
    }
}

/// Persisted user account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    /// Telegram user ID (also the private chat ID).
    pub user_id: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: String,
    /// Preferred language (`id` / `en`), if the user picked one.
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub points: i64,
    #[serde(default)]
    pub history: Vec<PointEntry>,
    #[serde(default)]
    pub referred_by: Option<i64>,
    #[serde(default)]
    pub referral_count: i64,
    #[serde(default)]
    pub last_daily: Option<i64>,
    #[serde(default)]
    pub last_spin: Option<i64>,
    #[serde(default)]
    pub last_quiz: Option<i64>,
    #[serde(default)]
    pub created_at: i64,
}

impl UserAccount {
    /// Fresh account for a Telegram user.
    pub fn new(user: &User, referred_by: Option<i64>, now: i64) -> Self {
        Self {
            user_id: user.id.0 as i64,
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            lang: None,
            points: 0,
            history: Vec::new(),
            referred_by,
            referral_count: 0,
            last_daily: None,
            last_spin: None,
            last_quiz: None,
            created_at: now,
        }
    }

    /// Timestamp of the last claim of the given kind.
    pub fn last_claim(&self, kind: ClaimKind) -> Option<i64> {
        match kind {
            ClaimKind::Daily => self.last_daily,
            ClaimKind::Spin => self.last_spin,
            ClaimKind::Quiz => self.last_quiz,
        }
    }

    /// `@username` if known, otherwise the first name.
    pub fn display_name(&self) -> String {
        match &self.username {
            Some(username) => format!("@{}", username),
            None if !self.first_name.is_empty() => self.first_name.clone(),
            None => format!("user {}", self.user_id),
        }
    }

    /// The last `n` history entries, newest first.
    pub fn recent_history(&self, n: usize) -> impl Iterator<Item = &PointEntry> {
        self.history.iter().rev().take(n)
    }

    /// Fields written only when the account is first created.
    pub fn insert_document(&self) -> Document {
        doc! {
            "lang": mongodb::bson::Bson::Null,
            "points": self.points,
            "history": [],
            "referred_by": self.referred_by,
            "referral_count": self.referral_count,
            "last_daily": mongodb::bson::Bson::Null,
            "last_spin": mongodb::bson::Bson::Null,
            "last_quiz": mongodb::bson::Bson::Null,
            "created_at": self.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> UserAccount {
        UserAccount {
            user_id: 5,
            username: None,
            first_name: "Budi".to_string(),
            lang: None,
            points: 0,
            history: Vec::new(),
            referred_by: None,
            referral_count: 0,
            last_daily: Some(100),
            last_spin: None,
            last_quiz: Some(300),
            created_at: 0,
        }
    }

    #[test]
    fn test_display_name() {
        let mut acc = account();
        assert_eq!(acc.display_name(), "Budi");
        acc.username = Some("budi_99".to_string());
        assert_eq!(acc.display_name(), "@budi_99");
        acc.username = None;
        acc.first_name.clear();
        assert_eq!(acc.display_name(), "user 5");
    }

    #[test]
    fn test_last_claim() {
        let acc = account();
        assert_eq!(acc.last_claim(ClaimKind::Daily), Some(100));
        assert_eq!(acc.last_claim(ClaimKind::Spin), None);
        assert_eq!(acc.last_claim(ClaimKind::Quiz), Some(300));
    }

    #[test]
    fn test_recent_history_newest_first() {
        let mut acc = account();
        for i in 0..5 {
            acc.history.push(PointEntry::new(PointKind::Ad, 10, None, i));
        }
        let ats: Vec<i64> = acc.recent_history(3).map(|e| e.at).collect();
        assert_eq!(ats, vec![4, 3, 2]);
    }

    #[test]
    fn test_entry_document() {
        let entry = PointEntry::new(PointKind::Withdraw, -150, Some("#3".to_string()), 42);
        let doc = entry.to_document();
        assert_eq!(doc.get_str("kind").unwrap(), "withdraw");
        assert_eq!(doc.get_i64("amount").unwrap(), -150);
        assert_eq!(doc.get_str("note").unwrap(), "#3");

        let back: PointEntry = mongodb::bson::from_document(doc).unwrap();
        assert_eq!(back.kind, PointKind::Withdraw);
    }
}
