use chrono::NaiveDate;
use std::sync::Arc;

use crate::{
    constants::prompts::ARTICLE_CREATION_PROMPT,
    errors::AppResult,
    models::{
        domain::{NewRawArticle, RawArticle},
        llm_output::GeneratedArticleOutput,
    },
    repositories::ContentStore,
    services::{
        model_client::ModelProfile, prompt_renderer::PromptSpec,
        structured_output::StructuredOutputPipeline,
    },
};

/// Mints new raw articles with the extended (web-search) model.
pub struct ArticleGenerator {
    store: Arc<dyn ContentStore>,
    pipeline: StructuredOutputPipeline,
    profile: ModelProfile,
}

impl ArticleGenerator {
    pub fn new(
        store: Arc<dyn ContentStore>,
        pipeline: StructuredOutputPipeline,
        profile: ModelProfile,
    ) -> Self {
        Self {
            store,
            pipeline,
            profile,
        }
    }

    pub async fn generate(&self, category: &str, as_of: NaiveDate) -> AppResult<RawArticle> {
        let spec = PromptSpec::new(ARTICLE_CREATION_PROMPT)
            .with_arg("date", as_of.format("%Y-%m-%d").to_string())
            .with_arg("category", category);

        let output: GeneratedArticleOutput = self.pipeline.invoke(spec, &self.profile).await?;

        let category = if output.category.trim().is_empty() {
            category
        } else {
            output.category.trim()
        };

        let article = self
            .store
            .insert_raw_article(NewRawArticle::new(&output.title, category, &output.content))
            .await?;

        log::info!("Generated raw article {} in category '{}'", article.id, article.category);
        Ok(article)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Config,
        errors::AppError,
        repositories::InMemoryContentStore,
        services::model_client::{CompletionError, MockCompletionModel},
    };
    use std::sync::atomic::{AtomicU32, Ordering};

    fn generator(store: Arc<InMemoryContentStore>, mock: MockCompletionModel) -> ArticleGenerator {
        let config = Config::test_config();
        let pipeline = StructuredOutputPipeline::new(Arc::new(mock), &config.pipeline_config());
        ArticleGenerator::new(store, pipeline, config.extended_profile())
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
    }

    #[tokio::test]
    async fn uses_extended_profile_and_date() {
        let mut mock = MockCompletionModel::new();
        mock.expect_complete()
            .withf(|prompt, profile| {
                profile.web_search && prompt.contains("2025-03-14") && prompt.contains("Category: tech")
            })
            .times(1)
            .returning(|_, _| {
                Ok(r#"{"title": "Chips", "content": "Long story.", "category": "tech"}"#.to_string())
            });

        let store = Arc::new(InMemoryContentStore::new());
        let article = generator(store, mock).generate("tech", today()).await.unwrap();

        assert_eq!(article.title, "Chips");
        assert_eq!(article.category, "tech");
    }

    #[tokio::test]
    async fn transient_failures_then_success_persists_article() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let mut mock = MockCompletionModel::new();
        mock.expect_complete().times(3).returning(move |_, _| {
            if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(CompletionError::Server("503 upstream".to_string()))
            } else {
                Ok(r#"{"title": "Chips", "content": "Long story.", "category": "tech"}"#.to_string())
            }
        });

        let store = Arc::new(InMemoryContentStore::new());
        let article = generator(store.clone(), mock)
            .generate("tech", today())
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(store.raw_article_count().await, 1);
        assert_eq!(article.original_text, "Long story.");
    }

    #[tokio::test]
    async fn empty_category_falls_back_to_requested() {
        let mut mock = MockCompletionModel::new();
        mock.expect_complete()
            .times(1)
            .returning(|_, _| Ok(r#"{"title": "Rain", "content": "Wet."}"#.to_string()));

        let store = Arc::new(InMemoryContentStore::new());
        let article = generator(store, mock).generate("weather", today()).await.unwrap();

        assert_eq!(article.category, "weather");
    }

    #[tokio::test]
    async fn exhausted_retries_persist_nothing() {
        let mut mock = MockCompletionModel::new();
        mock.expect_complete()
            .times(3)
            .returning(|_, _| Err(CompletionError::Network("refused".to_string())));

        let store = Arc::new(InMemoryContentStore::new());
        let err = generator(store.clone(), mock)
            .generate("tech", today())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::ModelError(_)));
        assert_eq!(store.raw_article_count().await, 0);
    }
}
