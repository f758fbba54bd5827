//! Ad placement repository.
//!
//! The active set is read on every `/watch` hit, so it is served from a
//! short snapshot cache that admin edits invalidate.

use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::Collection;
use rand::seq::SliceRandom;
use tracing::debug;

use crate::cache::{CacheConfig, TypedCache};
use crate::database::models::Ad;
use crate::database::Database;

/// Repository for ads.
pub struct AdRepository {
    db: Database,
    collection: Collection<Ad>,
    active: TypedCache<(), Vec<Ad>>,
}

impl AdRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            db: db.clone(),
            collection: db.collection("ads"),
            active: TypedCache::new("active_ads", CacheConfig::snapshot()),
        }
    }

    /// Pick one active ad uniformly at random.
    pub async fn random_active(&self) -> mongodb::error::Result<Option<Ad>> {
        let ads = self.active().await?;
        Ok(ads.choose(&mut rand::thread_rng()).cloned())
    }

    async fn active(&self) -> mongodb::error::Result<Vec<Ad>> {
        if let Some(ads) = self.active.get(&()) {
            return Ok(ads);
        }

        let ads: Vec<Ad> = self
            .collection
            .find(doc! { "active": true })
            .await?
            .try_collect()
            .await?;
        debug!("Loaded {} active ads into {}", ads.len(), self.active.name());

        self.active.insert((), ads.clone());
        Ok(ads)
    }

    pub async fn create(
        &self,
        title: String,
        script_url: String,
        show_fn: String,
        reward: i64,
    ) -> mongodb::error::Result<Ad> {
        let ad_id = self.db.next_sequence("ads").await?;
        let ad = Ad::new(ad_id, title, script_url, show_fn, reward, chrono::Utc::now().timestamp());
        self.collection.insert_one(&ad).await?;
        self.active.invalidate_all();
        Ok(ad)
    }

    pub async fn list(&self) -> mongodb::error::Result<Vec<Ad>> {
        self.collection
            .find(doc! {})
            .sort(doc! { "ad_id": 1 })
            .await?
            .try_collect()
            .await
    }

    /// Flip the active flag. Returns the new state, or `None` if missing.
    pub async fn toggle(&self, ad_id: i64) -> mongodb::error::Result<Option<bool>> {
        let Some(ad) = self.collection.find_one(doc! { "ad_id": ad_id }).await? else {
            return Ok(None);
        };

        let active = !ad.active;
        self.collection
            .update_one(doc! { "ad_id": ad_id }, doc! { "$set": { "active": active } })
            .await?;
        self.active.invalidate_all();
        Ok(Some(active))
    }

    pub async fn delete(&self, ad_id: i64) -> mongodb::error::Result<bool> {
        let result = self.collection.delete_one(doc! { "ad_id": ad_id }).await?;
        self.active.invalidate_all();
        Ok(result.deleted_count > 0)
    }

    /// Count a completed view.
    pub async fn record_view(&self, ad_id: i64) -> mongodb::error::Result<()> {
        self.collection
            .update_one(doc! { "ad_id": ad_id }, doc! { "$inc": { "views": 1_i64 } })
            .await?;
        Ok(())
    }
}
