//! Runs against a live MongoDB (`MONGO_CONN_STRING`); `cargo test -- --ignored`.

use lingua_feed_server::{
    config::Config,
    db::Database,
    errors::AppError,
    models::domain::GenerationRequest,
    repositories::{GenerationRequestRepository, MongoGenerationRequestRepository},
};

async fn scratch_database() -> Database {
    let mut config = Config::from_env();
    config.mongo_db_name = format!("lingua-feed-it-{}", uuid::Uuid::new_v4().simple());
    Database::connect(&config)
        .await
        .expect("MongoDB must be reachable for ignored tests")
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn test_find_by_id_rejects_ambiguous_generation_requests() {
    let db = scratch_database().await;
    let collection = db.collection::<GenerationRequest>("article_generation_requests");

    // No indexes yet, so the same id can be written twice.
    let first = GenerationRequest::new("u1", vec!["tech".to_string()], 1);
    let mut second = GenerationRequest::new("u2", vec!["sport".to_string()], 1);
    second.id = first.id.clone();
    collection.insert_many([&first, &second]).await.unwrap();

    let repo = MongoGenerationRequestRepository::new(&db);
    let err = repo.find_by_id(&first.id).await.unwrap_err();
    assert!(matches!(err, AppError::DatabaseError(_)));

    collection.drop().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn test_find_by_id_returns_single_match() {
    let db = scratch_database().await;
    let repo = MongoGenerationRequestRepository::new(&db);
    repo.ensure_indexes().await.unwrap();

    let created = repo
        .create(GenerationRequest::new("u1", vec!["tech".to_string()], 2))
        .await
        .unwrap();
    let found = repo.find_by_id(&created.id).await.unwrap().unwrap();
    assert_eq!(found.user_id, "u1");
    assert!(repo.find_by_id("missing").await.unwrap().is_none());

    db.collection::<GenerationRequest>("article_generation_requests")
        .drop()
        .await
        .unwrap();
}
