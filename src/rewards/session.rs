//! Ad watch sessions.
//!
//! `/watch` issues a one-time token; the page redeems it through `/reward`
//! once the ad SDK reports completion. Tokens live in memory only, a restart
//! simply invalidates the open ones.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use rand::Rng;
use tracing::debug;

use super::RewardError;

/// An issued, not yet redeemed ad view.
#[derive(Debug, Clone)]
pub struct AdSession {
    pub user_id: i64,
    /// `None` when the fallback SDK was served.
    pub ad_id: Option<i64>,
    pub reward: i64,
    pub issued_at: Instant,
}

/// In-memory tracker of open ad sessions (one per user).
#[derive(Clone)]
pub struct AdSessionTracker {
    sessions: Arc<DashMap<String, AdSession>>,
    by_user: Arc<DashMap<i64, String>>,
    min_watch: Duration,
    ttl: Duration,
}

impl AdSessionTracker {
    pub fn new(min_watch: Duration, ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            by_user: Arc::new(DashMap::new()),
            min_watch,
            ttl,
        }
    }

    /// Open a session and return its token.
    ///
    /// A user has at most one open session; issuing a new one drops the old.
    pub fn issue(&self, user_id: i64, ad_id: Option<i64>, reward: i64, now: Instant) -> String {
        let token = format!("{:032x}", rand::thread_rng().r#gen::<u128>());

        if let Some(previous) = self.by_user.insert(user_id, token.clone()) {
            self.sessions.remove(&previous);
        }
        self.sessions.insert(
            token.clone(),
            AdSession {
                user_id,
                ad_id,
                reward,
                issued_at: now,
            },
        );

        debug!("Issued ad session for user {}", user_id);
        token
    }

    /// Consume a session.
    ///
    /// A too-early attempt leaves the session in place so the page can retry.
    pub fn redeem(&self, token: &str, now: Instant) -> Result<AdSession, RewardError> {
        let session = self
            .sessions
            .get(token)
            .map(|s| s.clone())
            .ok_or(RewardError::SessionExpired)?;

        let age = now.saturating_duration_since(session.issued_at);
        if age > self.ttl {
            self.remove(token, session.user_id);
            return Err(RewardError::SessionExpired);
        }
        if age < self.min_watch {
            return Err(RewardError::SessionTooEarly {
                wait: self.min_watch - age,
            });
        }

        // Only one concurrent redeem may win the token.
        match self.sessions.remove(token) {
            Some((_, session)) => {
                self.by_user
                    .remove_if(&session.user_id, |_, current| current == token);
                Ok(session)
            }
            None => Err(RewardError::SessionExpired),
        }
    }

    /// Drop sessions older than the TTL. Returns how many were removed.
    pub fn purge_expired(&self, now: Instant) -> usize {
        let before = self.sessions.len();
        let ttl = self.ttl;
        self.sessions
            .retain(|_, s| now.saturating_duration_since(s.issued_at) <= ttl);
        let sessions = &self.sessions;
        self.by_user.retain(|_, token| sessions.contains_key(token));
        before - self.sessions.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    fn remove(&self, token: &str, user_id: i64) {
        self.sessions.remove(token);
        self.by_user.remove_if(&user_id, |_, current| current == token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> AdSessionTracker {
        AdSessionTracker::new(Duration::from_secs(5), Duration::from_secs(60))
    }

    #[test]
    fn test_redeem_once() {
        let tracker = tracker();
        let start = Instant::now();
        let token = tracker.issue(42, Some(1), 10, start);

        let session = tracker.redeem(&token, start + Duration::from_secs(6)).unwrap();
        assert_eq!(session.user_id, 42);
        assert_eq!(session.reward, 10);

        let again = tracker.redeem(&token, start + Duration::from_secs(7));
        assert!(matches!(again, Err(RewardError::SessionExpired)));
    }

    #[test]
    fn test_too_early_keeps_session() {
        let tracker = tracker();
        let start = Instant::now();
        let token = tracker.issue(1, None, 10, start);

        match tracker.redeem(&token, start + Duration::from_secs(2)) {
            Err(RewardError::SessionTooEarly { wait }) => assert_eq!(wait, Duration::from_secs(3)),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(tracker.redeem(&token, start + Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn test_expired_session() {
        let tracker = tracker();
        let start = Instant::now();
        let token = tracker.issue(1, None, 10, start);

        let result = tracker.redeem(&token, start + Duration::from_secs(61));
        assert!(matches!(result, Err(RewardError::SessionExpired)));
        assert_eq!(tracker.len(), 0);
    }

    #[test]
    fn test_unknown_token() {
        let result = tracker().redeem("nope", Instant::now());
        assert!(matches!(result, Err(RewardError::SessionExpired)));
    }

    #[test]
    fn test_new_session_replaces_old() {
        let tracker = tracker();
        let start = Instant::now();
        let first = tracker.issue(7, None, 10, start);
        let second = tracker.issue(7, None, 10, start);

        assert_ne!(first, second);
        assert_eq!(tracker.len(), 1);
        let later = start + Duration::from_secs(10);
        assert!(tracker.redeem(&first, later).is_err());
        assert!(tracker.redeem(&second, later).is_ok());
    }

    #[test]
    fn test_purge_expired() {
        let tracker = tracker();
        let start = Instant::now();
        tracker.issue(1, None, 10, start);
        tracker.issue(2, None, 10, start + Duration::from_secs(30));

        assert_eq!(tracker.purge_expired(start + Duration::from_secs(70)), 1);
        assert_eq!(tracker.len(), 1);
    }
}
