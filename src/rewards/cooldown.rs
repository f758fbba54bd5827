//! Claim windows for daily, spin and quiz rewards.

use std::time::Duration;

use crate::database::PointKind;

/// Length of every claim window (24 hours), in seconds.
pub const CLAIM_WINDOW_SECS: i64 = 24 * 60 * 60;

/// Rewards that can be claimed once per window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimKind {
    Daily,
    Spin,
    Quiz,
}

impl ClaimKind {
    /// Document field holding the unix timestamp of the last claim.
    pub fn field(self) -> &'static str {
        match self {
            Self::Daily => "last_daily",
            Self::Spin => "last_spin",
            Self::Quiz => "last_quiz",
        }
    }

    pub fn point_kind(self) -> PointKind {
        match self {
            Self::Daily => PointKind::Daily,
            Self::Spin => PointKind::Spin,
            Self::Quiz => PointKind::Quiz,
        }
    }
}

/// Latest timestamp a previous claim may have to allow a new one at `now`.
pub fn window_start(now: i64) -> i64 {
    now - CLAIM_WINDOW_SECS
}

/// Time left until the next claim, or `None` if claiming is allowed now.
///
/// A claim exactly 24 hours after the previous one is allowed.
pub fn cooldown_remaining(last: Option<i64>, now: i64) -> Option<Duration> {
    let last = last?;
    let elapsed = (now - last).max(0);
    if elapsed >= CLAIM_WINDOW_SECS {
        None
    } else {
        Some(Duration::from_secs((CLAIM_WINDOW_SECS - elapsed) as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_never_claimed() {
        assert_eq!(cooldown_remaining(None, 1_000), None);
    }

    #[test]
    fn test_within_window() {
        let now = 1_700_000_000;
        let remaining = cooldown_remaining(Some(now - 3600), now);
        assert_eq!(remaining, Some(Duration::from_secs(23 * 3600)));
    }

    #[test]
    fn test_window_boundary_is_inclusive() {
        let now = 1_700_000_000;
        assert_eq!(cooldown_remaining(Some(now - CLAIM_WINDOW_SECS), now), None);
        assert_eq!(
            cooldown_remaining(Some(now - CLAIM_WINDOW_SECS + 1), now),
            Some(Duration::from_secs(1))
        );
    }

    #[test]
    fn test_future_timestamp_counts_as_fresh_claim() {
        let now = 1_700_000_000;
        assert_eq!(
            cooldown_remaining(Some(now + 60), now),
            Some(Duration::from_secs(CLAIM_WINDOW_SECS as u64))
        );
    }

    #[test]
    fn test_claim_fields() {
        assert_eq!(ClaimKind::Daily.field(), "last_daily");
        assert_eq!(ClaimKind::Spin.point_kind(), PointKind::Spin);
        assert_eq!(window_start(CLAIM_WINDOW_SECS), 0);
    }
}
