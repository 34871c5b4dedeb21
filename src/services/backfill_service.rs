use chrono::Utc;
use std::sync::Arc;

use crate::{
    errors::{AppError, AppResult},
    models::{
        domain::{
            AdaptationTarget, AdaptedArticle, AssignedArticleRef, AssignmentOutcome,
            AssignmentSource, RawArticle, UserCursor, UserPreferences,
        },
        dto::response::AssignedArticleView,
    },
    repositories::{ArticleFilter, ContentStore},
    services::{adaptation_service::AdaptationService, article_generator::ArticleGenerator},
};

pub const MAX_ASSIGN_COUNT: usize = 20;

/// Hands each user articles they have not seen, in id order: reuse adapted
/// content first, then adapt unseen raw content, then generate new raw content.
pub struct BackfillService {
    store: Arc<dyn ContentStore>,
    adapter: Arc<AdaptationService>,
    generator: Arc<ArticleGenerator>,
    fallback_categories: Vec<String>,
}

impl BackfillService {
    pub fn new(
        store: Arc<dyn ContentStore>,
        adapter: Arc<AdaptationService>,
        generator: Arc<ArticleGenerator>,
        fallback_categories: Vec<String>,
    ) -> Self {
        Self {
            store,
            adapter,
            generator,
            fallback_categories,
        }
    }

    pub async fn assign(&self, user_id: &str, count: usize) -> AppResult<AssignmentOutcome> {
        if count == 0 || count > MAX_ASSIGN_COUNT {
            return Err(AppError::ValidationError(format!(
                "count must be between 1 and {}, got {}",
                MAX_ASSIGN_COUNT, count
            )));
        }

        let preferences = self
            .store
            .get_user_preferences(user_id)
            .await?
            .unwrap_or_else(|| UserPreferences {
                user_id: user_id.to_string(),
                ..Default::default()
            });
        let cursor = self.store.get_user_cursor(user_id).await?;
        let filter = ArticleFilter::for_preferences(&preferences);

        let mut picked: Vec<(AdaptedArticle, AssignmentSource)> = self
            .store
            .query_adapted_articles(&filter, cursor.last_adapted_id, count)
            .await?
            .into_iter()
            .map(|article| (article, AssignmentSource::Reused))
            .collect();
        log::debug!(
            "User '{}': {} reusable adapted article(s) after cursor {}",
            user_id,
            picked.len(),
            cursor.last_adapted_id
        );

        if picked.len() < count {
            match preferences.adaptation_target() {
                Some(target) => {
                    self.backfill(user_id, count, &cursor, &filter, &target, &mut picked)
                        .await?
                }
                None => log::warn!(
                    "User '{}' has no learning language or level; skipping adaptation and generation",
                    user_id
                ),
            }
        }

        picked.truncate(count);
        self.record_assignments(user_id, count, picked).await
    }

    async fn backfill(
        &self,
        user_id: &str,
        count: usize,
        cursor: &UserCursor,
        filter: &ArticleFilter,
        target: &AdaptationTarget,
        picked: &mut Vec<(AdaptedArticle, AssignmentSource)>,
    ) -> AppResult<()> {
        let needed = count - picked.len();
        let raw_cursor = picked
            .last()
            .map(|(article, _)| article.original_article_id)
            .unwrap_or(cursor.last_original_id);

        let mut sources: Vec<(RawArticle, AssignmentSource)> = self
            .store
            .query_raw_articles(filter, raw_cursor, needed)
            .await?
            .into_iter()
            .map(|raw| (raw, AssignmentSource::Adapted))
            .collect();

        if sources.len() < needed {
            let missing = needed - sources.len();
            log::info!(
                "User '{}': generating {} new raw article(s)",
                user_id,
                missing
            );
            let generated = self.generate_raw(missing, &filter.categories).await;
            sources.extend(
                generated
                    .into_iter()
                    .map(|raw| (raw, AssignmentSource::Generated)),
            );
        }

        for (raw, source) in sources {
            if picked.len() >= count {
                break;
            }
            match self.adapter.adapt_article(&raw, target).await {
                Ok(adapted) => picked.push((adapted, source)),
                Err(e) => log::warn!(
                    "Adapting raw article {} for user '{}' failed: {}",
                    raw.id,
                    user_id,
                    e
                ),
            }
        }
        Ok(())
    }

    /// Generates up to `amount` raw articles, round-robin over the categories.
    async fn generate_raw(&self, amount: usize, categories: &[String]) -> Vec<RawArticle> {
        let categories = if categories.is_empty() {
            self.fallback_categories.as_slice()
        } else {
            categories
        };
        if categories.is_empty() {
            log::warn!("No categories available for generation");
            return Vec::new();
        }

        let today = Utc::now().date_naive();
        let mut generated = Vec::with_capacity(amount);
        for category in categories.iter().cycle().take(amount) {
            match self.generator.generate(category, today).await {
                Ok(article) => generated.push(article),
                Err(e) => log::warn!("Generating a '{}' article failed: {}", category, e),
            }
        }
        generated
    }

    async fn record_assignments(
        &self,
        user_id: &str,
        requested: usize,
        picked: Vec<(AdaptedArticle, AssignmentSource)>,
    ) -> AppResult<AssignmentOutcome> {
        let mut assigned = Vec::with_capacity(picked.len());

        for (article, source) in picked {
            match self
                .store
                .insert_assignment(user_id, article.id, article.original_article_id)
                .await
            {
                Ok(_) => assigned.push(AssignedArticleRef {
                    adapted_article_id: article.id,
                    original_article_id: article.original_article_id,
                    title: article.title,
                    source,
                }),
                Err(AppError::AlreadyExists(msg)) => {
                    log::warn!("Skipping duplicate assignment: {}", msg);
                }
                Err(e) if assigned.is_empty() => return Err(e),
                Err(e) => {
                    log::error!(
                        "Recording adapted article {} for user '{}' failed, keeping {} written: {}",
                        article.id,
                        user_id,
                        assigned.len(),
                        e
                    );
                    break;
                }
            }
        }

        let outcome = AssignmentOutcome {
            requested,
            assigned,
        };
        if outcome.is_partial() {
            log::warn!(
                "User '{}': assigned {} of {} requested article(s)",
                user_id,
                outcome.assigned.len(),
                requested
            );
        } else {
            log::info!("User '{}': assigned {} article(s)", user_id, requested);
        }
        Ok(outcome)
    }

    /// The user's feed, newest assignment first.
    pub async fn assigned_articles(
        &self,
        user_id: &str,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<AssignedArticleView>> {
        let records = self.store.list_assignments(user_id, limit, offset).await?;

        let mut views = Vec::with_capacity(records.len());
        for record in &records {
            match self.store.find_adapted_article(record.adapted_article_id).await? {
                Some(article) => views.push(AssignedArticleView::new(record, &article)),
                None => log::warn!(
                    "Assignment of user '{}' points at missing adapted article {}",
                    user_id,
                    record.adapted_article_id
                ),
            }
        }
        Ok(views)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Config,
        repositories::InMemoryContentStore,
        services::{
            model_client::{CompletionError, MockCompletionModel},
            structured_output::StructuredOutputPipeline,
        },
        test_utils::fixtures::{adaptation_json, adapted_article, raw_article},
    };

    fn backfill(store: Arc<InMemoryContentStore>, mock: MockCompletionModel) -> BackfillService {
        let config = Config::test_config();
        let pipeline = StructuredOutputPipeline::new(Arc::new(mock), &config.pipeline_config());
        let adapter = Arc::new(AdaptationService::new(
            store.clone(),
            pipeline.clone(),
            config.standard_profile(),
        ));
        let generator = Arc::new(ArticleGenerator::new(
            store.clone(),
            pipeline,
            config.extended_profile(),
        ));
        BackfillService::new(store, adapter, generator, config.fallback_categories)
    }

    #[tokio::test]
    async fn rejects_out_of_range_count() {
        let store = Arc::new(InMemoryContentStore::new());
        let service = backfill(store, MockCompletionModel::new());

        assert!(matches!(
            service.assign("u1", 0).await,
            Err(AppError::ValidationError(_))
        ));
        assert!(matches!(
            service.assign("u1", MAX_ASSIGN_COUNT + 1).await,
            Err(AppError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn reuses_adapted_articles_without_model_calls() {
        let mut mock = MockCompletionModel::new();
        mock.expect_complete().times(0);

        let store = Arc::new(InMemoryContentStore::new());
        store
            .put_user_preferences(
                UserPreferences::new("u1", "English", "German", "B1").with_categories(&["tech"]),
            )
            .await;
        store.seed_adapted_article(adapted_article(10, 3, "tech", "German", "B1")).await;
        store.seed_adapted_article(adapted_article(11, 4, "sports", "German", "B1")).await;
        store.seed_adapted_article(adapted_article(12, 5, "tech", "German", "B1")).await;

        let outcome = backfill(store, mock).assign("u1", 2).await.unwrap();

        let ids: Vec<i64> = outcome.assigned.iter().map(|a| a.adapted_article_id).collect();
        assert_eq!(ids, vec![10, 12]);
        assert!(outcome
            .assigned
            .iter()
            .all(|a| a.source == AssignmentSource::Reused));
        assert!(!outcome.is_partial());
    }

    #[tokio::test]
    async fn missing_level_skips_adaptation() {
        let mut mock = MockCompletionModel::new();
        mock.expect_complete().times(0);

        let store = Arc::new(InMemoryContentStore::new());
        let mut prefs = UserPreferences::new("u1", "English", "German", "B1");
        prefs.language_level = None;
        store.put_user_preferences(prefs).await;
        store.seed_raw_article(raw_article(7, "tech")).await;

        let outcome = backfill(store, mock).assign("u1", 3).await.unwrap();

        assert!(outcome.assigned.is_empty());
        assert!(outcome.is_partial());
    }

    #[tokio::test]
    async fn failed_adaptation_only_drops_that_item() {
        let mut mock = MockCompletionModel::new();
        mock.expect_complete().returning(|prompt, _| {
            if prompt.contains("first raw") {
                Err(CompletionError::Api("content filtered".to_string()))
            } else {
                Ok(adaptation_json("Zweiter"))
            }
        });

        let store = Arc::new(InMemoryContentStore::new());
        store
            .put_user_preferences(UserPreferences::new("u1", "English", "German", "B1"))
            .await;
        let mut first = raw_article(1, "tech");
        first.original_text = "first raw".to_string();
        store.seed_raw_article(first).await;
        store.seed_raw_article(raw_article(2, "tech")).await;

        let outcome = backfill(store, mock).assign("u1", 2).await.unwrap();

        assert_eq!(outcome.assigned.len(), 1);
        assert_eq!(outcome.assigned[0].original_article_id, 2);
        assert_eq!(outcome.assigned[0].source, AssignmentSource::Adapted);
    }

    #[tokio::test]
    async fn feed_lists_newest_first() {
        let store = Arc::new(InMemoryContentStore::new());
        store
            .put_user_preferences(UserPreferences::new("u1", "English", "German", "B1"))
            .await;
        for id in 1..=3 {
            store
                .seed_adapted_article(adapted_article(id, id, "tech", "German", "B1"))
                .await;
        }
        let service = backfill(store, MockCompletionModel::new());
        service.assign("u1", 3).await.unwrap();

        let feed = service.assigned_articles("u1", 2, 0).await.unwrap();
        let ids: Vec<i64> = feed.iter().map(|v| v.adapted_article_id).collect();
        assert_eq!(ids, vec![3, 2]);

        let rest = service.assigned_articles("u1", 2, 2).await.unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].adapted_article_id, 1);
    }
}
