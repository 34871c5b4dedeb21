//! Process-local stores for the `memory` backend and for tests.

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    errors::{AppError, AppResult},
    models::domain::{
        AdaptedArticle, AssignmentRecord, GenerationOutcome, GenerationRequest, NewAdaptedArticle,
        NewRawArticle, RawArticle, UserCursor, UserPreferences,
    },
    repositories::{ArticleFilter, ContentStore, GenerationRequestRepository},
};

#[derive(Default)]
struct ContentTables {
    raw_articles: BTreeMap<i64, RawArticle>,
    adapted_articles: BTreeMap<i64, AdaptedArticle>,
    assignments: Vec<AssignmentRecord>,
    assigned_pairs: HashSet<(String, i64)>,
    preferences: HashMap<String, UserPreferences>,
    last_raw_id: i64,
    last_adapted_id: i64,
}

#[derive(Default)]
pub struct InMemoryContentStore {
    tables: RwLock<ContentTables>,
}

impl InMemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put_user_preferences(&self, preferences: UserPreferences) {
        let mut tables = self.tables.write().await;
        tables
            .preferences
            .insert(preferences.user_id.clone(), preferences);
    }

    /// Stores a raw article under its own id; later inserts continue after it.
    pub async fn seed_raw_article(&self, article: RawArticle) {
        let mut tables = self.tables.write().await;
        tables.last_raw_id = tables.last_raw_id.max(article.id);
        tables.raw_articles.insert(article.id, article);
    }

    /// Stores an adapted article under its own id; later inserts continue after it.
    pub async fn seed_adapted_article(&self, article: AdaptedArticle) {
        let mut tables = self.tables.write().await;
        tables.last_adapted_id = tables.last_adapted_id.max(article.id);
        tables.adapted_articles.insert(article.id, article);
    }

    pub async fn raw_article_count(&self) -> usize {
        self.tables.read().await.raw_articles.len()
    }

    pub async fn adapted_article_count(&self) -> usize {
        self.tables.read().await.adapted_articles.len()
    }
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    async fn get_user_cursor(&self, user_id: &str) -> AppResult<UserCursor> {
        let tables = self.tables.read().await;
        let cursor = tables
            .assignments
            .iter()
            .filter(|a| a.user_id == user_id)
            .max_by_key(|a| a.adapted_article_id)
            .map(UserCursor::from)
            .unwrap_or_default();
        Ok(cursor)
    }

    async fn get_user_preferences(&self, user_id: &str) -> AppResult<Option<UserPreferences>> {
        let tables = self.tables.read().await;
        Ok(tables.preferences.get(user_id).cloned())
    }

    async fn query_adapted_articles(
        &self,
        filter: &ArticleFilter,
        after_id: i64,
        limit: usize,
    ) -> AppResult<Vec<AdaptedArticle>> {
        let tables = self.tables.read().await;
        let articles = tables
            .adapted_articles
            .range(after_id.saturating_add(1)..)
            .map(|(_, article)| article)
            .filter(|article| filter.matches_adapted(article))
            .take(limit)
            .cloned()
            .collect();
        Ok(articles)
    }

    async fn query_raw_articles(
        &self,
        filter: &ArticleFilter,
        after_id: i64,
        limit: usize,
    ) -> AppResult<Vec<RawArticle>> {
        let tables = self.tables.read().await;

        let already_adapted: HashSet<i64> = match filter.adaptation_pair() {
            Some((language, level)) => tables
                .adapted_articles
                .values()
                .filter(|a| a.language == language && a.level == level)
                .map(|a| a.original_article_id)
                .collect(),
            None => HashSet::new(),
        };

        let articles = tables
            .raw_articles
            .range(after_id.saturating_add(1)..)
            .map(|(_, article)| article)
            .filter(|article| filter.matches_category(&article.category))
            .filter(|article| !already_adapted.contains(&article.id))
            .take(limit)
            .cloned()
            .collect();
        Ok(articles)
    }

    async fn find_raw_article(&self, id: i64) -> AppResult<Option<RawArticle>> {
        let tables = self.tables.read().await;
        Ok(tables.raw_articles.get(&id).cloned())
    }

    async fn find_adapted_article(&self, id: i64) -> AppResult<Option<AdaptedArticle>> {
        let tables = self.tables.read().await;
        Ok(tables.adapted_articles.get(&id).cloned())
    }

    async fn insert_raw_article(&self, article: NewRawArticle) -> AppResult<RawArticle> {
        let mut tables = self.tables.write().await;
        tables.last_raw_id += 1;
        let article = article.into_article(tables.last_raw_id);
        tables.raw_articles.insert(article.id, article.clone());
        Ok(article)
    }

    async fn insert_adapted_article(&self, article: NewAdaptedArticle) -> AppResult<AdaptedArticle> {
        let mut tables = self.tables.write().await;
        tables.last_adapted_id += 1;
        let article = article.into_article(tables.last_adapted_id);
        tables.adapted_articles.insert(article.id, article.clone());
        Ok(article)
    }

    async fn insert_assignment(
        &self,
        user_id: &str,
        adapted_article_id: i64,
        original_article_id: i64,
    ) -> AppResult<AssignmentRecord> {
        let mut tables = self.tables.write().await;
        if !tables
            .assigned_pairs
            .insert((user_id.to_string(), adapted_article_id))
        {
            return Err(AppError::AlreadyExists(format!(
                "Adapted article {} is already assigned to user '{}'",
                adapted_article_id, user_id
            )));
        }

        let record = AssignmentRecord::new(user_id, adapted_article_id, original_article_id);
        tables.assignments.push(record.clone());
        Ok(record)
    }

    async fn list_assignments(
        &self,
        user_id: &str,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<AssignmentRecord>> {
        let tables = self.tables.read().await;
        let mut records: Vec<_> = tables
            .assignments
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.adapted_article_id.cmp(&a.adapted_article_id));

        Ok(records
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn health_check(&self) -> AppResult<()> {
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryGenerationRequestRepository {
    requests: RwLock<HashMap<String, GenerationRequest>>,
}

impl InMemoryGenerationRequestRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GenerationRequestRepository for InMemoryGenerationRequestRepository {
    async fn create(&self, request: GenerationRequest) -> AppResult<GenerationRequest> {
        let mut requests = self.requests.write().await;
        if requests.contains_key(&request.id) {
            return Err(AppError::AlreadyExists(format!(
                "Generation request '{}' already exists",
                request.id
            )));
        }
        requests.insert(request.id.clone(), request.clone());
        Ok(request)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<GenerationRequest>> {
        let requests = self.requests.read().await;
        Ok(requests.get(id).cloned())
    }

    async fn complete(&self, id: &str, outcome: GenerationOutcome) -> AppResult<bool> {
        let mut requests = self.requests.write().await;
        let Some(request) = requests.get_mut(id) else {
            return Ok(false);
        };
        if request.status.is_terminal() {
            return Ok(false);
        }

        request.status = outcome.status;
        request.generated_article_ids = outcome.generated_article_ids;
        request.error_message = outcome.error_message;
        request.completed_at = Some(Utc::now());
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::domain::GenerationStatus;

    #[tokio::test]
    async fn inserts_assign_increasing_ids() {
        let store = InMemoryContentStore::new();
        let first = store
            .insert_raw_article(NewRawArticle::new("a", "tech", "text"))
            .await
            .unwrap();
        let second = store
            .insert_raw_article(NewRawArticle::new("b", "tech", "text"))
            .await
            .unwrap();

        assert!(second.id > first.id);
    }

    #[tokio::test]
    async fn completed_request_is_not_rewritten() {
        let repo = InMemoryGenerationRequestRepository::new();
        let request = repo
            .create(GenerationRequest::new("u1", vec!["tech".to_string()], 1))
            .await
            .unwrap();

        let done = GenerationOutcome {
            status: GenerationStatus::Completed,
            generated_article_ids: vec![1],
            error_message: None,
        };
        assert!(repo.complete(&request.id, done).await.unwrap());

        let failed = GenerationOutcome {
            status: GenerationStatus::Failed,
            generated_article_ids: vec![],
            error_message: Some("late".to_string()),
        };
        assert!(!repo.complete(&request.id, failed).await.unwrap());

        let stored = repo.find_by_id(&request.id).await.unwrap().unwrap();
        assert_eq!(stored.status, GenerationStatus::Completed);
        assert_eq!(stored.generated_article_ids, vec![1]);
    }
}
