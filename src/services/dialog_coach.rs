use serde_json::json;
use std::sync::Arc;

use crate::{
    constants::prompts::DIALOG_FOLLOW_UP_PROMPT,
    errors::{AppError, AppResult},
    models::{
        domain::{AdaptedArticle, UserPreferences},
        dto::request::{CoachRequest, DialogTurn},
        llm_output::CoachReply,
    },
    repositories::ContentStore,
    services::{
        model_client::ModelProfile, prompt_renderer::PromptSpec,
        structured_output::StructuredOutputPipeline,
    },
};

/// Reviews a learner's reply about an article and keeps the conversation going.
pub struct DialogCoach {
    store: Arc<dyn ContentStore>,
    pipeline: StructuredOutputPipeline,
    profile: ModelProfile,
}

impl DialogCoach {
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

    pub async fn follow_up(
        &self,
        article: &AdaptedArticle,
        preferences: &UserPreferences,
        history: &[DialogTurn],
        last_user_message: &str,
        vocabulary: &[String],
        grammar_topics: &[String],
    ) -> AppResult<CoachReply> {
        let target = preferences.adaptation_target().ok_or_else(|| {
            AppError::ValidationError(format!(
                "User '{}' has no language pair and level configured",
                preferences.user_id
            ))
        })?;

        let spec = PromptSpec::new(DIALOG_FOLLOW_UP_PROMPT)
            .with_arg("main_language", target.main_language)
            .with_arg("learning_language", target.learning_language)
            .with_arg("lang_level", target.level)
            .with_json_arg(
                "article",
                &json!({ "title": article.title, "text": article.adapted_text }),
            )?
            .with_json_arg("dialog_history", &history)?
            .with_json_arg("last_user_message", &last_user_message)?
            .with_json_arg("vocabulary", &vocabulary)?
            .with_json_arg("grammar_topics", &grammar_topics)?;

        self.pipeline.invoke(spec, &self.profile).await
    }

    /// Loads the article and the user's preferences, then coaches.
    pub async fn coach(&self, adapted_article_id: i64, request: &CoachRequest) -> AppResult<CoachReply> {
        let article = self
            .store
            .find_adapted_article(adapted_article_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Adapted article with id '{}' not found",
                    adapted_article_id
                ))
            })?;
        let preferences = self
            .store
            .get_user_preferences(&request.user_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Settings for user '{}' not found", request.user_id))
            })?;

        self.follow_up(
            &article,
            &preferences,
            &request.history,
            &request.message,
            &request.vocabulary,
            &request.grammar_topics,
        )
        .await
    }
}
