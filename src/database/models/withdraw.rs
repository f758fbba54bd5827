//! Withdrawal request model.

use serde::{Deserialize, Serialize};

/// Lifecycle of a withdrawal request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WithdrawStatus {
    Pending,
    Approved,
    Rejected,
}

impl WithdrawStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

/// A user's request to cash out points. Points are deducted on creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawRequest {
    pub request_id: i64,
    pub user_id: i64,
    pub amount: i64,
    /// Free-text payout destination (e-wallet, bank account, ...).
    #[serde(default)]
    pub destination: Option<String>,
    pub status: WithdrawStatus,
    /// Admin note (e.g. rejection reason).
    #[serde(default)]
    pub note: Option<String>,
    pub created_at: i64,
    #[serde(default)]
    pub processed_at: Option<i64>,
}

impl WithdrawRequest {
    pub fn new(request_id: i64, user_id: i64, amount: i64, destination: Option<String>, now: i64) -> Self {
        Self {
            request_id,
            user_id,
            amount,
            destination,
            status: WithdrawStatus::Pending,
            note: None,
            created_at: now,
            processed_at: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == WithdrawStatus::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_names_match_serde() {
        for status in [WithdrawStatus::Pending, WithdrawStatus::Approved, WithdrawStatus::Rejected] {
            let bson = mongodb::bson::to_bson(&status).unwrap();
            assert_eq!(bson.as_str(), Some(status.as_str()));
        }
    }

    #[test]
    fn test_new_request_is_pending() {
        let req = WithdrawRequest::new(1, 2, 150, None, 0);
        assert!(req.is_pending());
        assert!(req.processed_at.is_none());
    }
}
