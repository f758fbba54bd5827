//! User account repository.
//!
//! Every balance change is a single atomic `find_one_and_update`, so the
//! claim windows and the balance check for withdrawals hold under
//! concurrent updates without any locking on our side.

use std::sync::Arc;

use futures::TryStreamExt;
use mongodb::bson::{doc, Bson, Document};
use mongodb::options::ReturnDocument;
use mongodb::Collection;
use teloxide::types::User;
use tokio::spawn;
use tracing::{debug, info, warn};

use crate::cache::{CacheConfig, TypedCache};
use crate::database::models::{PointEntry, PointKind, UserAccount, HISTORY_LIMIT};
use crate::database::Database;
use crate::rewards::{cooldown_remaining, window_start, ClaimKind, RewardError};

/// Outcome of `/start`.
#[derive(Debug, Clone)]
pub struct Registration {
    pub account: UserAccount,
    /// True if the account did not exist before.
    pub created: bool,
    /// Referrer account after the referral payout, if one happened.
    pub referrer: Option<UserAccount>,
}

/// Snapshot of the Telegram profile fields we mirror.
type ProfileKey = (Option<String>, String);

/// Repository for user accounts.
pub struct UserRepository {
    collection: Collection<UserAccount>,
    profiles: TypedCache<i64, ProfileKey>,
    leaderboard: TypedCache<usize, Vec<UserAccount>>,
}

impl UserRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("users"),
            profiles: TypedCache::new("user_profiles", CacheConfig::profiles()),
            leaderboard: TypedCache::new("leaderboard", CacheConfig::snapshot()),
        }
    }

    /// Register a user if absent (insert-if-absent upsert).
    ///
    /// The referral payout only happens for a newly created account and a
    /// referrer that already exists.
    pub async fn register(
        &self,
        user: &User,
        referrer: Option<i64>,
        referral_reward: i64,
    ) -> Result<Registration, RewardError> {
        let now = chrono::Utc::now().timestamp();
        let user_id = user.id.0 as i64;

        let referrer = match referrer {
            Some(id) => self.get(id).await?.map(|r| r.user_id),
            None => None,
        };

        let fresh = UserAccount::new(user, referrer, now);
        let result = self
            .collection
            .update_one(
                doc! { "user_id": user_id },
                doc! {
                    "$set": { "username": user.username.clone(), "first_name": user.first_name.as_str() },
                    "$setOnInsert": fresh.insert_document(),
                },
            )
            .upsert(true)
            .await?;
        let created = result.upserted_id.is_some();
        self.remember_profile(user);

        let mut referrer_account = None;
        if created {
            info!("Registered user {} (referrer: {:?})", user_id, referrer);
            if let Some(referrer_id) = referrer {
                referrer_account = self
                    .credit_referral(referrer_id, user_id, referral_reward, now)
                    .await?;
            }
        }

        let account = self.get(user_id).await?.ok_or(RewardError::NotRegistered)?;
        Ok(Registration {
            account,
            created,
            referrer: referrer_account,
        })
    }

    async fn credit_referral(
        &self,
        referrer_id: i64,
        new_user_id: i64,
        reward: i64,
        now: i64,
    ) -> Result<Option<UserAccount>, RewardError> {
        let entry = PointEntry::new(PointKind::Referral, reward, Some(new_user_id.to_string()), now);
        let account = self
            .apply(
                doc! { "user_id": referrer_id },
                doc! {
                    "$inc": { "points": reward, "referral_count": 1_i64 },
                    "$push": push_history(&entry),
                },
            )
            .await?;
        debug!("Referral payout {} -> {}", new_user_id, referrer_id);
        Ok(account)
    }

    /// Get a user account by Telegram ID.
    pub async fn get(&self, user_id: i64) -> mongodb::error::Result<Option<UserAccount>> {
        self.collection.find_one(doc! { "user_id": user_id }).await
    }

    /// Claim a once-per-window reward atomically.
    ///
    /// `amount` may be zero (e.g. a wrong quiz answer still uses the window).
    pub async fn claim(
        &self,
        user_id: i64,
        kind: ClaimKind,
        amount: i64,
        note: Option<String>,
        now: i64,
    ) -> Result<UserAccount, RewardError> {
        let field = kind.field();
        let entry = PointEntry::new(kind.point_kind(), amount, note, now);

        let filter = doc! {
            "user_id": user_id,
            "$or": [
                { field: Bson::Null },
                { field: { "$lte": window_start(now) } },
            ],
        };
        let update = doc! {
            "$inc": { "points": amount },
            "$set": { field: now },
            "$push": push_history(&entry),
        };

        if let Some(account) = self.apply(filter, update).await? {
            self.leaderboard.invalidate_all();
            return Ok(account);
        }

        match self.get(user_id).await? {
            None => Err(RewardError::NotRegistered),
            Some(account) => Err(RewardError::Cooldown {
                remaining: cooldown_remaining(account.last_claim(kind), now).unwrap_or_default(),
            }),
        }
    }

    /// Unconditionally add (or, with a negative amount, remove) points.
    pub async fn credit(
        &self,
        user_id: i64,
        kind: PointKind,
        amount: i64,
        note: Option<String>,
    ) -> Result<UserAccount, RewardError> {
        let entry = PointEntry::new(kind, amount, note, chrono::Utc::now().timestamp());
        let account = self
            .apply(
                doc! { "user_id": user_id },
                doc! { "$inc": { "points": amount }, "$push": push_history(&entry) },
            )
            .await?
            .ok_or(RewardError::NotRegistered)?;

        self.leaderboard.invalidate_all();
        Ok(account)
    }

    /// Remove points only if the balance covers them.
    pub async fn debit(
        &self,
        user_id: i64,
        amount: i64,
        note: Option<String>,
    ) -> Result<UserAccount, RewardError> {
        if amount <= 0 {
            return Err(RewardError::InvalidAmount);
        }
        let entry = PointEntry::new(PointKind::Withdraw, -amount, note, chrono::Utc::now().timestamp());

        let updated = self
            .apply(
                doc! { "user_id": user_id, "points": { "$gte": amount } },
                doc! { "$inc": { "points": -amount }, "$push": push_history(&entry) },
            )
            .await?;

        match updated {
            Some(account) => {
                self.leaderboard.invalidate_all();
                Ok(account)
            }
            None => match self.get(user_id).await? {
                None => Err(RewardError::NotRegistered),
                Some(account) => Err(RewardError::InsufficientPoints {
                    balance: account.points,
                    requested: amount,
                }),
            },
        }
    }

    /// Top users by points, served from a short-lived snapshot.
    pub async fn top(&self, limit: usize) -> mongodb::error::Result<Vec<UserAccount>> {
        if let Some(users) = self.leaderboard.get(&limit) {
            return Ok(users);
        }

        let users: Vec<UserAccount> = self
            .collection
            .find(doc! {})
            .sort(doc! { "points": -1, "created_at": 1 })
            .limit(limit as i64)
            .await?
            .try_collect()
            .await?;

        self.leaderboard.insert(limit, users.clone());
        Ok(users)
    }

    /// Users for the admin panel and exports (`None` = everyone).
    pub async fn list(&self, limit: Option<i64>) -> mongodb::error::Result<Vec<UserAccount>> {
        let find = self
            .collection
            .find(doc! {})
            .sort(doc! { "points": -1, "created_at": 1 });
        let cursor = match limit {
            Some(limit) => find.limit(limit).await?,
            None => find.await?,
        };
        cursor.try_collect().await
    }

    pub async fn count(&self) -> mongodb::error::Result<u64> {
        self.collection.count_documents(doc! {}).await
    }

    /// Sum of all balances.
    pub async fn total_points(&self) -> mongodb::error::Result<i64> {
        let mut cursor = self
            .collection
            .aggregate(vec![doc! { "$group": { "_id": Bson::Null, "total": { "$sum": "$points" } } }])
            .await?;

        let total = match cursor.try_next().await? {
            Some(row) => match row.get("total") {
                Some(Bson::Int64(v)) => *v,
                Some(Bson::Int32(v)) => i64::from(*v),
                _ => 0,
            },
            None => 0,
        };
        Ok(total)
    }

    /// Store the preferred language.
    pub async fn set_lang(&self, user_id: i64, lang: &str) -> mongodb::error::Result<bool> {
        let result = self
            .collection
            .update_one(doc! { "user_id": user_id }, doc! { "$set": { "lang": lang } })
            .await?;
        Ok(result.matched_count > 0)
    }

    /// Refresh the mirrored profile of a registered user in the background.
    ///
    /// Never creates accounts; skips the write when nothing changed.
    pub fn touch_background(self: Arc<Self>, user: User) {
        let user_id = user.id.0 as i64;
        if self.profiles.get(&user_id) == Some(profile_key(&user)) {
            return;
        }

        spawn(async move {
            let update = doc! {
                "$set": { "username": user.username.clone(), "first_name": user.first_name.as_str() },
            };
            match self.collection.update_one(doc! { "user_id": user_id }, update).await {
                Ok(_) => self.remember_profile(&user),
                Err(e) => warn!("Failed to refresh profile of user {}: {}", user_id, e),
            }
        });
    }

    fn remember_profile(&self, user: &User) {
        self.profiles.insert(user.id.0 as i64, profile_key(user));
    }

    async fn apply(
        &self,
        filter: Document,
        update: Document,
    ) -> mongodb::error::Result<Option<UserAccount>> {
        self.collection
            .find_one_and_update(filter, update)
            .return_document(ReturnDocument::After)
            .await
    }
}

fn profile_key(user: &User) -> ProfileKey {
    (user.username.clone(), user.first_name.clone())
}

/// `$push` clause appending one entry and keeping the newest `HISTORY_LIMIT`.
fn push_history(entry: &PointEntry) -> Document {
    doc! {
        "history": {
            "$each": [entry.to_document()],
            "$slice": -HISTORY_LIMIT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_history_caps_length() {
        let entry = PointEntry::new(PointKind::Daily, 20, None, 1);
        let clause = push_history(&entry);
        let history = clause.get_document("history").unwrap();

        assert_eq!(history.get_i32("$slice").unwrap(), -HISTORY_LIMIT);
        assert_eq!(history.get_array("$each").unwrap().len(), 1);
    }
}
