//! Quiz repository.

use futures::TryStreamExt;
use mongodb::bson::{doc, from_document};
use mongodb::Collection;
use tracing::{info, warn};

use crate::database::models::quiz::default_quizzes;
use crate::database::models::Quiz;
use crate::database::Database;

/// Repository for quiz questions.
pub struct QuizRepository {
    db: Database,
    collection: Collection<Quiz>,
}

impl QuizRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            db: db.clone(),
            collection: db.collection("quizzes"),
        }
    }

    /// Pick one active quiz at random (server-side `$sample`).
    pub async fn random_active(&self) -> mongodb::error::Result<Option<Quiz>> {
        let mut cursor = self
            .collection
            .aggregate(vec![
                doc! { "$match": { "active": true } },
                doc! { "$sample": { "size": 1 } },
            ])
            .await?;

        match cursor.try_next().await? {
            Some(document) => match from_document::<Quiz>(document) {
                Ok(quiz) => Ok(Some(quiz)),
                Err(e) => {
                    warn!("Skipping malformed quiz document: {}", e);
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    pub async fn get(&self, quiz_id: i64) -> mongodb::error::Result<Option<Quiz>> {
        self.collection.find_one(doc! { "quiz_id": quiz_id }).await
    }

    /// Validate and store a new quiz. Returns `None` if the input is malformed.
    pub async fn create(
        &self,
        question: String,
        options: Vec<String>,
        answer: i32,
        reward: i64,
    ) -> mongodb::error::Result<Option<Quiz>> {
        // Validate before consuming a sequence number.
        if Quiz::new(0, question.clone(), options.clone(), answer, reward).is_none() {
            return Ok(None);
        }

        let quiz_id = self.db.next_sequence("quizzes").await?;
        let Some(quiz) = Quiz::new(quiz_id, question, options, answer, reward) else {
            return Ok(None);
        };
        self.collection.insert_one(&quiz).await?;
        Ok(Some(quiz))
    }

    pub async fn list(&self) -> mongodb::error::Result<Vec<Quiz>> {
        self.collection
            .find(doc! {})
            .sort(doc! { "quiz_id": 1 })
            .await?
            .try_collect()
            .await
    }

    pub async fn delete(&self, quiz_id: i64) -> mongodb::error::Result<bool> {
        let result = self.collection.delete_one(doc! { "quiz_id": quiz_id }).await?;
        Ok(result.deleted_count > 0)
    }

    /// Insert the built-in questions if the collection is empty.
    pub async fn seed_defaults(&self, reward: i64) -> mongodb::error::Result<usize> {
        if self.collection.count_documents(doc! {}).await? > 0 {
            return Ok(0);
        }

        let mut seeded = 0;
        for (question, options, answer) in default_quizzes() {
            let options = options.into_iter().map(String::from).collect();
            if self.create(question.to_string(), options, answer, reward).await?.is_some() {
                seeded += 1;
            }
        }

        info!("Seeded {} default quizzes", seeded);
        Ok(seeded)
    }
}
