use std::sync::Arc;

use crate::{
    config::{Config, StoreBackend},
    db::Database,
    errors::AppResult,
    repositories::{
        ContentStore, GenerationRequestRepository, InMemoryContentStore,
        InMemoryGenerationRequestRepository, MongoContentStore, MongoGenerationRequestRepository,
    },
    services::{
        model_client::{CompletionModel, OpenAiCompletionModel},
        AdaptationService, ArticleGenerator, BackfillService, DialogCoach,
        GenerationRequestService, StructuredOutputPipeline,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ContentStore>,
    pub adaptation_service: Arc<AdaptationService>,
    pub article_generator: Arc<ArticleGenerator>,
    pub backfill_service: Arc<BackfillService>,
    pub dialog_coach: Arc<DialogCoach>,
    pub generation_requests: Arc<GenerationRequestService>,
    pub config: Arc<Config>,
}

impl AppState {
    pub async fn new(config: Config) -> AppResult<Self> {
        let (store, requests): (Arc<dyn ContentStore>, Arc<dyn GenerationRequestRepository>) =
            match config.store_backend {
                StoreBackend::Mongo => {
                    let db = Database::connect(&config).await?;

                    let content_store = Arc::new(MongoContentStore::new(&db));
                    content_store.ensure_indexes().await?;

                    let request_repository = Arc::new(MongoGenerationRequestRepository::new(&db));
                    request_repository.ensure_indexes().await?;

                    let content_store: Arc<dyn ContentStore> = content_store;
                    let request_repository: Arc<dyn GenerationRequestRepository> =
                        request_repository;
                    (content_store, request_repository)
                }
                StoreBackend::Memory => {
                    log::warn!("Using the in-memory store; nothing will be persisted");
                    let content_store: Arc<dyn ContentStore> = Arc::new(InMemoryContentStore::new());
                    let request_repository: Arc<dyn GenerationRequestRepository> =
                        Arc::new(InMemoryGenerationRequestRepository::new());
                    (content_store, request_repository)
                }
            };

        let model = Arc::new(OpenAiCompletionModel::new(
            &config.llm_api_base,
            &config.llm_api_key,
        ));

        Ok(Self::with_components(config, store, requests, model))
    }

    /// Wires services over already-built stores and model client.
    pub fn with_components(
        config: Config,
        store: Arc<dyn ContentStore>,
        requests: Arc<dyn GenerationRequestRepository>,
        model: Arc<dyn CompletionModel>,
    ) -> Self {
        let pipeline = StructuredOutputPipeline::new(model, &config.pipeline_config());

        let adaptation_service = Arc::new(AdaptationService::new(
            store.clone(),
            pipeline.clone(),
            config.standard_profile(),
        ));
        let article_generator = Arc::new(ArticleGenerator::new(
            store.clone(),
            pipeline.clone(),
            config.extended_profile(),
        ));
        let backfill_service = Arc::new(BackfillService::new(
            store.clone(),
            adaptation_service.clone(),
            article_generator.clone(),
            config.fallback_categories.clone(),
        ));
        let dialog_coach = Arc::new(DialogCoach::new(
            store.clone(),
            pipeline,
            config.standard_profile(),
        ));
        let generation_requests = Arc::new(GenerationRequestService::new(
            requests,
            article_generator.clone(),
        ));

        Self {
            store,
            adaptation_service,
            article_generator,
            backfill_service,
            dialog_coach,
            generation_requests,
            config: Arc::new(config),
        }
    }
}
