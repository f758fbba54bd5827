//! Domain errors for point bookkeeping.

use std::time::Duration;

use thiserror::Error;

/// Why a claim, credit or withdrawal could not go through.
#[derive(Debug, Error)]
pub enum RewardError {
    #[error("user is not registered")]
    NotRegistered,

    #[error("claim is on cooldown for another {}s", .remaining.as_secs())]
    Cooldown { remaining: Duration },

    #[error("amount is below the minimum of {minimum}")]
    BelowMinimum { minimum: i64 },

    #[error("amount is not a valid positive number")]
    InvalidAmount,

    #[error("insufficient points: balance {balance}, requested {requested}")]
    InsufficientPoints { balance: i64, requested: i64 },

    #[error("ad session is unknown or expired")]
    SessionExpired,

    #[error("ad session redeemed too early, wait {}s", .wait.as_secs())]
    SessionTooEarly { wait: Duration },

    #[error(transparent)]
    Database(#[from] mongodb::error::Error),
}
