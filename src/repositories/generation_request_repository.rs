use async_trait::async_trait;
use chrono::Utc;
use mongodb::{
    bson::{doc, to_bson},
    options::IndexOptions,
    Collection, IndexModel,
};

use crate::{
    db::{find_unique, Database},
    errors::AppResult,
    models::domain::{GenerationOutcome, GenerationRequest, GenerationStatus},
};

#[async_trait]
pub trait GenerationRequestRepository: Send + Sync {
    async fn create(&self, request: GenerationRequest) -> AppResult<GenerationRequest>;
    async fn find_by_id(&self, id: &str) -> AppResult<Option<GenerationRequest>>;

    /// Moves a `processing` request to its terminal status. Returns `false` if
    /// the request was missing or already terminal; nothing is written then.
    async fn complete(&self, id: &str, outcome: GenerationOutcome) -> AppResult<bool>;
}

pub struct MongoGenerationRequestRepository {
    collection: Collection<GenerationRequest>,
}

impl MongoGenerationRequestRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.collection("article_generation_requests");
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for article_generation_requests collection");

        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();
        self.collection.create_index(id_index).await?;

        let user_index = IndexModel::builder()
            .keys(doc! { "user_id": 1, "created_at": -1 })
            .build();
        self.collection.create_index(user_index).await?;

        log::info!("Successfully created indexes for article_generation_requests collection");
        Ok(())
    }
}

#[async_trait]
impl GenerationRequestRepository for MongoGenerationRequestRepository {
    async fn create(&self, request: GenerationRequest) -> AppResult<GenerationRequest> {
        self.collection.insert_one(&request).await?;
        Ok(request)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<GenerationRequest>> {
        find_unique(&self.collection, doc! { "id": id }, "generation request").await
    }

    async fn complete(&self, id: &str, outcome: GenerationOutcome) -> AppResult<bool> {
        let result = self
            .collection
            .update_one(
                doc! { "id": id, "status": to_bson(&GenerationStatus::Processing)? },
                doc! {
                    "$set": {
                        "status": to_bson(&outcome.status)?,
                        "generated_article_ids": outcome.generated_article_ids,
                        "error_message": outcome.error_message,
                        "completed_at": to_bson(&Utc::now())?,
                    }
                },
            )
            .await?;
        Ok(result.modified_count == 1)
    }
}
