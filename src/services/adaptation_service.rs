use std::sync::Arc;

use crate::{
    constants::prompts::ARTICLE_ADAPTATION_PROMPT,
    errors::{AppError, AppResult},
    models::{
        domain::{AdaptationTarget, AdaptedArticle, NewAdaptedArticle, RawArticle},
        llm_output::AdaptationOutput,
    },
    repositories::ContentStore,
    services::{
        model_client::ModelProfile, prompt_renderer::PromptSpec,
        structured_output::StructuredOutputPipeline,
    },
};

pub struct AdaptationService {
    store: Arc<dyn ContentStore>,
    pipeline: StructuredOutputPipeline,
    profile: ModelProfile,
}

impl AdaptationService {
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

    pub async fn adapt(
        &self,
        raw_article_id: i64,
        main_language: &str,
        learning_language: &str,
        level: &str,
    ) -> AppResult<AdaptedArticle> {
        let raw = self
            .store
            .find_raw_article(raw_article_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Raw article with id '{}' not found", raw_article_id))
            })?;

        let target = AdaptationTarget {
            main_language: main_language.to_string(),
            learning_language: learning_language.to_string(),
            level: level.to_string(),
        };
        self.adapt_article(&raw, &target).await
    }

    /// Adapts an already loaded raw article. Persists only a validated result.
    pub async fn adapt_article(
        &self,
        raw: &RawArticle,
        target: &AdaptationTarget,
    ) -> AppResult<AdaptedArticle> {
        let spec = PromptSpec::new(ARTICLE_ADAPTATION_PROMPT)
            .with_arg("main_language", target.main_language.as_str())
            .with_arg("learning_language", target.learning_language.as_str())
            .with_arg("lang_level", target.level.as_str())
            .with_arg("article", format!("{}\n\n{}", raw.title, raw.original_text));

        let output: AdaptationOutput = self.pipeline.invoke(spec, &self.profile).await?;

        let adapted = self
            .store
            .insert_adapted_article(NewAdaptedArticle {
                original_article_id: raw.id,
                category: raw.category.clone(),
                language: target.learning_language.clone(),
                level: target.level.clone(),
                title: output.title,
                intro: output.intro,
                adapted_text: output.adapted_text,
                dialogue_starter_question: output.dialogue_starter_question,
                metadata: output.metadata,
            })
            .await?;

        log::info!(
            "Adapted raw article {} into {} ({} {})",
            raw.id,
            adapted.id,
            adapted.language,
            adapted.level
        );
        Ok(adapted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Config,
        repositories::InMemoryContentStore,
        services::model_client::MockCompletionModel,
        test_utils::fixtures::{adaptation_json, raw_article},
    };

    fn service(store: Arc<InMemoryContentStore>, mock: MockCompletionModel) -> AdaptationService {
        let config = Config::test_config();
        let pipeline = StructuredOutputPipeline::new(Arc::new(mock), &config.pipeline_config());
        AdaptationService::new(store, pipeline, config.standard_profile())
    }

    #[tokio::test]
    async fn unknown_raw_article_is_not_found() {
        let mut mock = MockCompletionModel::new();
        mock.expect_complete().times(0);

        let store = Arc::new(InMemoryContentStore::new());
        let err = service(store, mock)
            .adapt(42, "English", "German", "B1")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn successful_adaptation_is_persisted() {
        let mut mock = MockCompletionModel::new();
        mock.expect_complete()
            .withf(|prompt, profile| {
                prompt.contains("B1-level German") && profile.name == "test-standard"
            })
            .times(1)
            .returning(|_, _| Ok(adaptation_json("Neue Züge")));

        let store = Arc::new(InMemoryContentStore::new());
        store.seed_raw_article(raw_article(7, "tech")).await;

        let adapted = service(store.clone(), mock)
            .adapt(7, "English", "German", "B1")
            .await
            .unwrap();

        assert_eq!(adapted.original_article_id, 7);
        assert_eq!(adapted.category, "tech");
        assert_eq!(adapted.language, "German");
        assert_eq!(adapted.title, "Neue Züge");
        assert_eq!(store.adapted_article_count().await, 1);
    }

    #[tokio::test]
    async fn failed_adaptation_persists_nothing() {
        let mut mock = MockCompletionModel::new();
        mock.expect_complete()
            .times(2)
            .returning(|_, _| Ok("no json here".to_string()));

        let store = Arc::new(InMemoryContentStore::new());
        store.seed_raw_article(raw_article(7, "tech")).await;

        let err = service(store.clone(), mock)
            .adapt(7, "English", "German", "B1")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::SchemaValidationError(_)));
        assert_eq!(store.adapted_article_count().await, 0);
    }
}
