//! Withdrawal request repository.

use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::options::ReturnDocument;
use mongodb::Collection;
use tracing::debug;

use crate::database::models::{WithdrawRequest, WithdrawStatus};
use crate::database::Database;

/// Which requests a listing returns, and in what order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WithdrawListing {
    /// Every request, newest first.
    All,
    /// Waiting requests, oldest first so the longest-waiting come up first.
    Pending,
    /// Approved or rejected requests, newest first.
    Processed,
}

impl WithdrawListing {
    fn filter(self) -> Document {
        let pending = WithdrawStatus::Pending.as_str();
        match self {
            Self::All => Document::new(),
            Self::Pending => doc! { "status": pending },
            Self::Processed => doc! { "status": { "$ne": pending } },
        }
    }

    fn sort(self) -> Document {
        match self {
            Self::Pending => doc! { "created_at": 1, "request_id": 1 },
            Self::All | Self::Processed => doc! { "created_at": -1, "request_id": -1 },
        }
    }
}

/// Repository for withdrawal requests.
pub struct WithdrawRepository {
    db: Database,
    collection: Collection<WithdrawRequest>,
}

impl WithdrawRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            db: db.clone(),
            collection: db.collection("withdraw_requests"),
        }
    }

    /// Insert a new pending request with the next sequential ID.
    pub async fn create(
        &self,
        user_id: i64,
        amount: i64,
        destination: Option<String>,
    ) -> mongodb::error::Result<WithdrawRequest> {
        let request_id = self.db.next_sequence("withdraw_requests").await?;
        let request = WithdrawRequest::new(
            request_id,
            user_id,
            amount,
            destination,
            chrono::Utc::now().timestamp(),
        );
        self.collection.insert_one(&request).await?;

        debug!("Created withdraw request #{} for user {}", request_id, user_id);
        Ok(request)
    }

    pub async fn get(&self, request_id: i64) -> mongodb::error::Result<Option<WithdrawRequest>> {
        self.collection.find_one(doc! { "request_id": request_id }).await
    }

    /// A user's requests, newest first.
    pub async fn list_for_user(
        &self,
        user_id: i64,
        limit: i64,
    ) -> mongodb::error::Result<Vec<WithdrawRequest>> {
        self.collection
            .find(doc! { "user_id": user_id })
            .sort(doc! { "created_at": -1 })
            .limit(limit)
            .await?
            .try_collect()
            .await
    }

    /// Requests for a listing (`None` limit = all).
    pub async fn list(
        &self,
        listing: WithdrawListing,
        limit: Option<i64>,
    ) -> mongodb::error::Result<Vec<WithdrawRequest>> {
        let find = self.collection.find(listing.filter()).sort(listing.sort());
        let cursor = match limit {
            Some(limit) => find.limit(limit).await?,
            None => find.await?,
        };
        cursor.try_collect().await
    }

    pub async fn count_pending(&self) -> mongodb::error::Result<u64> {
        self.collection
            .count_documents(doc! { "status": WithdrawStatus::Pending.as_str() })
            .await
    }

    /// Move a pending request to its final status.
    ///
    /// Returns `None` if the request does not exist or was already processed,
    /// so a request can only be approved or rejected once.
    pub async fn resolve(
        &self,
        request_id: i64,
        status: WithdrawStatus,
        note: Option<String>,
    ) -> mongodb::error::Result<Option<WithdrawRequest>> {
        let resolved = self
            .collection
            .find_one_and_update(
                doc! { "request_id": request_id, "status": WithdrawStatus::Pending.as_str() },
                doc! {
                    "$set": {
                        "status": status.as_str(),
                        "note": note,
                        "processed_at": chrono::Utc::now().timestamp(),
                    }
                },
            )
            .return_document(ReturnDocument::After)
            .await?;

        if resolved.is_some() {
            debug!("Withdraw request #{} -> {}", request_id, status.as_str());
        }
        Ok(resolved)
    }

    /// Put a request back to pending if it still has `status`.
    ///
    /// Used to undo a resolution whose follow-up failed, so it can be retried.
    pub async fn reopen(
        &self,
        request_id: i64,
        status: WithdrawStatus,
    ) -> mongodb::error::Result<bool> {
        let result = self
            .collection
            .update_one(
                doc! { "request_id": request_id, "status": status.as_str() },
                doc! {
                    "$set": { "status": WithdrawStatus::Pending.as_str() },
                    "$unset": { "note": "", "processed_at": "" },
                },
            )
            .await?;

        if result.modified_count > 0 {
            debug!("Withdraw request #{} reopened from {}", request_id, status.as_str());
        }
        Ok(result.modified_count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_listing_is_oldest_first() {
        assert_eq!(
            WithdrawListing::Pending.filter(),
            doc! { "status": "pending" }
        );
        assert_eq!(
            WithdrawListing::Pending.sort().get_i32("created_at").ok(),
            Some(1)
        );
    }

    #[test]
    fn test_processed_listing_excludes_pending() {
        assert_eq!(
            WithdrawListing::Processed.filter(),
            doc! { "status": { "$ne": "pending" } }
        );
        assert_eq!(
            WithdrawListing::Processed.sort().get_i32("created_at").ok(),
            Some(-1)
        );
        assert!(WithdrawListing::All.filter().is_empty());
    }
}
