use chrono::Utc;
use std::{sync::Arc, time::Duration};

use crate::{
    errors::{AppError, AppResult},
    models::domain::{GenerationOutcome, GenerationRequest, GenerationStatus},
    repositories::GenerationRequestRepository,
    services::article_generator::ArticleGenerator,
};

const OUTCOME_WRITE_ATTEMPTS: u32 = 5;
const OUTCOME_RETRY_STEP: Duration = Duration::from_millis(100);

/// Bulk raw-article generation that runs after the request has been answered.
pub struct GenerationRequestService {
    repository: Arc<dyn GenerationRequestRepository>,
    generator: Arc<ArticleGenerator>,
}

impl GenerationRequestService {
    pub fn new(
        repository: Arc<dyn GenerationRequestRepository>,
        generator: Arc<ArticleGenerator>,
    ) -> Self {
        Self {
            repository,
            generator,
        }
    }

    /// Records a `processing` request and starts generating in the background.
    pub async fn submit(
        &self,
        user_id: &str,
        categories: Vec<String>,
        articles_per_category: usize,
    ) -> AppResult<GenerationRequest> {
        let categories: Vec<String> = categories
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        if categories.is_empty() {
            return Err(AppError::ValidationError(
                "at least one non-empty category is required".to_string(),
            ));
        }

        let request = self
            .repository
            .create(GenerationRequest::new(
                user_id,
                categories,
                articles_per_category,
            ))
            .await?;
        log::info!(
            "Generation request {} accepted for user '{}'",
            request.id,
            user_id
        );

        let repository = self.repository.clone();
        let generator = self.generator.clone();
        let job = request.clone();
        tokio::spawn(async move {
            let outcome = run_generation(&generator, &job).await;
            record_outcome(repository.as_ref(), &job.id, outcome).await;
        });

        Ok(request)
    }

    pub async fn get(&self, id: &str) -> AppResult<GenerationRequest> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Generation request '{}' not found", id)))
    }
}

/// Writes the terminal status, retrying store failures with a linear backoff
/// so a transient outage does not leave the request `processing`.
async fn record_outcome(
    repository: &dyn GenerationRequestRepository,
    id: &str,
    outcome: GenerationOutcome,
) {
    let status = outcome.status;
    for attempt in 1..=OUTCOME_WRITE_ATTEMPTS {
        match repository.complete(id, outcome.clone()).await {
            Ok(true) => {
                log::info!("Generation request {} finished: {}", id, status);
                return;
            }
            Ok(false) => {
                log::warn!("Generation request {} was already terminal; outcome dropped", id);
                return;
            }
            Err(e) if attempt < OUTCOME_WRITE_ATTEMPTS => {
                log::warn!(
                    "Recording the outcome of generation request {} failed (attempt {}/{}): {}",
                    id,
                    attempt,
                    OUTCOME_WRITE_ATTEMPTS,
                    e
                );
                tokio::time::sleep(OUTCOME_RETRY_STEP * attempt).await;
            }
            Err(e) => log::error!(
                "Giving up on recording the outcome of generation request {}: {}",
                id,
                e
            ),
        }
    }
}

/// Any failed article fails the whole request, keeping the ids made so far.
async fn run_generation(generator: &ArticleGenerator, job: &GenerationRequest) -> GenerationOutcome {
    let today = Utc::now().date_naive();
    let mut generated = Vec::new();

    for category in &job.categories {
        for _ in 0..job.articles_per_category {
            match generator.generate(category, today).await {
                Ok(article) => generated.push(article.id),
                Err(e) => {
                    log::warn!(
                        "Generation request {} failed in category '{}': {}",
                        job.id,
                        category,
                        e
                    );
                    return GenerationOutcome {
                        status: GenerationStatus::Failed,
                        generated_article_ids: generated,
                        error_message: Some(e.to_string()),
                    };
                }
            }
        }
    }

    GenerationOutcome {
        status: GenerationStatus::Completed,
        generated_article_ids: generated,
        error_message: None,
    }
}
