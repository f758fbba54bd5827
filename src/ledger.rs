//! Point operations that span several repositories.
//!
//! Used by both the Telegram handlers and the web panel, so approving a
//! withdrawal behaves the same from either side.

use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info};

use crate::config::RewardConfig;
use crate::database::{
    AdRepository, PointKind, UserAccount, UserRepository, WithdrawRepository, WithdrawRequest,
    WithdrawStatus,
};
use crate::rewards::{validate_withdraw, AdSessionTracker, RewardError};

/// Result of redeeming an ad session.
#[derive(Debug, Clone)]
pub struct AdReward {
    pub account: UserAccount,
    pub points: i64,
}

/// Cross-repository point operations.
#[derive(Clone)]
pub struct Ledger {
    pub users: Arc<UserRepository>,
    pub withdrawals: Arc<WithdrawRepository>,
    pub ads: Arc<AdRepository>,
    pub sessions: AdSessionTracker,
    pub rewards: RewardConfig,
}

impl Ledger {
    /// Deduct points and file a pending withdrawal.
    ///
    /// If storing the request fails after the deduction, the points are
    /// returned before the error is propagated.
    pub async fn submit_withdraw(
        &self,
        user_id: i64,
        amount: i64,
        destination: Option<String>,
    ) -> Result<(WithdrawRequest, UserAccount), RewardError> {
        let account = self
            .users
            .get(user_id)
            .await?
            .ok_or(RewardError::NotRegistered)?;
        validate_withdraw(amount, account.points, self.rewards.min_withdraw)?;

        let account = self.users.debit(user_id, amount, None).await?;

        match self.withdrawals.create(user_id, amount, destination).await {
            Ok(request) => {
                info!(
                    "User {} requested withdraw #{} of {} points",
                    user_id, request.request_id, amount
                );
                Ok((request, account))
            }
            Err(e) => {
                error!("Failed to store withdraw of user {}, refunding: {}", user_id, e);
                if let Err(refund_err) = self
                    .users
                    .credit(user_id, PointKind::Refund, amount, Some("withdraw failed".to_string()))
                    .await
                {
                    error!("{}: {}", unrefunded(user_id, amount, None), refund_err);
                    return Err(refund_err.into());
                }
                Err(e.into())
            }
        }
    }

    /// Approve a pending request. `None` if missing or already processed.
    pub async fn approve(&self, request_id: i64) -> Result<Option<WithdrawRequest>, RewardError> {
        let resolved = self
            .withdrawals
            .resolve(request_id, WithdrawStatus::Approved, None)
            .await?;
        if let Some(request) = &resolved {
            info!("Withdraw #{} approved ({} points)", request.request_id, request.amount);
        }
        Ok(resolved)
    }

    /// Reject a pending request and refund its points.
    ///
    /// If the refund fails the request is put back to pending, so the
    /// rejection can be retried.
    pub async fn reject(
        &self,
        request_id: i64,
        reason: Option<String>,
    ) -> Result<Option<WithdrawRequest>, RewardError> {
        let Some(request) = self
            .withdrawals
            .resolve(request_id, WithdrawStatus::Rejected, reason)
            .await?
        else {
            return Ok(None);
        };

        if let Err(e) = self
            .users
            .credit(
                request.user_id,
                PointKind::Refund,
                request.amount,
                Some(format!("#{}", request.request_id)),
            )
            .await
        {
            let lost = unrefunded(request.user_id, request.amount, Some(request.request_id));
            match self
                .withdrawals
                .reopen(request.request_id, WithdrawStatus::Rejected)
                .await
            {
                Ok(true) => error!(
                    "Refund for withdraw #{} failed, request is pending again: {}",
                    request.request_id, e
                ),
                Ok(false) => error!("{}: {} (request no longer rejected)", lost, e),
                Err(reopen_err) => error!("{}: {} (reopen failed: {})", lost, e, reopen_err),
            }
            return Err(e.into());
        }
        info!(
            "Withdraw #{} rejected, {} points refunded to {}",
            request.request_id, request.amount, request.user_id
        );
        Ok(Some(request))
    }

    /// Redeem an ad session token and credit its reward.
    pub async fn redeem_ad(&self, token: &str) -> Result<AdReward, RewardError> {
        let session = self.sessions.redeem(token, Instant::now())?;

        let note = session.ad_id.map(|id| format!("ad #{id}"));
        let account = self
            .users
            .credit(session.user_id, PointKind::Ad, session.reward, note)
            .await?;

        if let Some(ad_id) = session.ad_id
            && let Err(e) = self.ads.record_view(ad_id).await
        {
            error!("Failed to record view of ad {}: {}", ad_id, e);
        }

        info!("User {} earned {} points from an ad", session.user_id, session.reward);
        Ok(AdReward {
            account,
            points: session.reward,
        })
    }
}

/// Log line for points that were taken but could not be given back.
fn unrefunded(user_id: i64, amount: i64, request_id: Option<i64>) -> String {
    match request_id {
        Some(id) => format!(
            "Manual refund needed: {} points for user {} (withdraw #{})",
            amount, user_id, id
        ),
        None => format!("Manual refund needed: {} points for user {}", amount, user_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unrefunded_names_user_and_amount() {
        let line = unrefunded(42, 1500, Some(7));
        assert!(line.contains("user 42"));
        assert!(line.contains("1500 points"));
        assert!(line.contains("#7"));

        let line = unrefunded(42, 1500, None);
        assert_eq!(line, "Manual refund needed: 1500 points for user 42");
    }
}
