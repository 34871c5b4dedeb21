use std::collections::HashSet;

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Document},
    error::{ErrorKind, WriteFailure},
    options::{IndexOptions, ReturnDocument},
    Collection, IndexModel,
};

use crate::{
    db::{find_unique, Database},
    errors::{AppError, AppResult},
    models::domain::{
        AdaptedArticle, AssignmentRecord, NewAdaptedArticle, NewRawArticle, RawArticle,
        UserCursor, UserPreferences,
    },
};

const DUPLICATE_KEY_CODE: i32 = 11000;
const RAW_SCAN_PAGE: i64 = 50;

/// Narrows article queries. `None` and an empty category list mean "no constraint".
///
/// On raw-article queries, `language` and `level` (when both set) exclude raw
/// articles that already have an adaptation for that pair.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ArticleFilter {
    pub language: Option<String>,
    pub level: Option<String>,
    pub categories: Vec<String>,
}

impl ArticleFilter {
    pub fn for_preferences(preferences: &UserPreferences) -> Self {
        Self {
            language: preferences.learning_language.clone(),
            level: preferences.language_level.clone(),
            categories: preferences.preferred_categories.clone(),
        }
    }

    pub fn matches_category(&self, category: &str) -> bool {
        self.categories.is_empty() || self.categories.iter().any(|c| c == category)
    }

    pub fn matches_adapted(&self, article: &AdaptedArticle) -> bool {
        self.language.as_deref().map_or(true, |l| l == article.language)
            && self.level.as_deref().map_or(true, |l| l == article.level)
            && self.matches_category(&article.category)
    }

    pub fn adaptation_pair(&self) -> Option<(&str, &str)> {
        Some((self.language.as_deref()?, self.level.as_deref()?))
    }
}

#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Position after the user's newest assignment; zeroes if they have none.
    async fn get_user_cursor(&self, user_id: &str) -> AppResult<UserCursor>;
    async fn get_user_preferences(&self, user_id: &str) -> AppResult<Option<UserPreferences>>;

    /// Adapted articles with `id > after_id`, ascending by id.
    async fn query_adapted_articles(
        &self,
        filter: &ArticleFilter,
        after_id: i64,
        limit: usize,
    ) -> AppResult<Vec<AdaptedArticle>>;

    /// Raw articles with `id > after_id`, ascending by id.
    async fn query_raw_articles(
        &self,
        filter: &ArticleFilter,
        after_id: i64,
        limit: usize,
    ) -> AppResult<Vec<RawArticle>>;

    async fn find_raw_article(&self, id: i64) -> AppResult<Option<RawArticle>>;
    async fn find_adapted_article(&self, id: i64) -> AppResult<Option<AdaptedArticle>>;
    async fn insert_raw_article(&self, article: NewRawArticle) -> AppResult<RawArticle>;
    async fn insert_adapted_article(&self, article: NewAdaptedArticle) -> AppResult<AdaptedArticle>;

    /// Fails with `AlreadyExists` if the user already has this adapted article.
    async fn insert_assignment(
        &self,
        user_id: &str,
        adapted_article_id: i64,
        original_article_id: i64,
    ) -> AppResult<AssignmentRecord>;

    /// The user's assignments, newest first.
    async fn list_assignments(
        &self,
        user_id: &str,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<AssignmentRecord>>;

    async fn health_check(&self) -> AppResult<()>;
}

pub struct MongoContentStore {
    db: Database,
    raw_articles: Collection<RawArticle>,
    adapted_articles: Collection<AdaptedArticle>,
    assignments: Collection<AssignmentRecord>,
    user_settings: Collection<UserPreferences>,
    counters: Collection<Document>,
}

impl MongoContentStore {
    pub fn new(db: &Database) -> Self {
        Self {
            db: db.clone(),
            raw_articles: db.collection("articles"),
            adapted_articles: db.collection("adapted_articles"),
            assignments: db.collection("user_x_adapted_article"),
            user_settings: db.collection("user_settings"),
            counters: db.collection("counters"),
        }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for content collections");

        self.raw_articles
            .create_index(unique_index(doc! { "id": 1 }, "id_unique"))
            .await?;
        self.raw_articles
            .create_index(plain_index(doc! { "category": 1, "id": 1 }, "category_id"))
            .await?;

        self.adapted_articles
            .create_index(unique_index(doc! { "id": 1 }, "id_unique"))
            .await?;
        self.adapted_articles
            .create_index(plain_index(
                doc! { "language": 1, "level": 1, "category": 1, "id": 1 },
                "feed_lookup",
            ))
            .await?;
        self.adapted_articles
            .create_index(plain_index(
                doc! { "original_article_id": 1, "language": 1, "level": 1 },
                "original_lookup",
            ))
            .await?;

        self.assignments
            .create_index(unique_index(
                doc! { "user_id": 1, "adapted_article_id": 1 },
                "user_article_unique",
            ))
            .await?;

        self.user_settings
            .create_index(unique_index(doc! { "user_id": 1 }, "user_id_unique"))
            .await?;

        log::info!("Successfully created indexes for content collections");
        Ok(())
    }

    async fn next_id(&self, sequence: &str) -> AppResult<i64> {
        let counter = self
            .counters
            .find_one_and_update(doc! { "_id": sequence }, doc! { "$inc": { "value": 1_i64 } })
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await?
            .ok_or_else(|| {
                AppError::DatabaseError(format!("counter '{}' was not returned", sequence))
            })?;

        counter
            .get_i64("value")
            .map_err(|e| AppError::DatabaseError(format!("counter '{}': {}", sequence, e)))
    }

    /// Ids of raw articles in `ids` that already have an adaptation for the pair.
    async fn adapted_originals(
        &self,
        ids: Vec<i64>,
        language: &str,
        level: &str,
    ) -> AppResult<HashSet<i64>> {
        let values = self
            .adapted_articles
            .distinct(
                "original_article_id",
                doc! { "original_article_id": { "$in": ids }, "language": language, "level": level },
            )
            .await?;

        Ok(values.iter().filter_map(|v| v.as_i64()).collect())
    }
}

fn unique_index(keys: Document, name: &str) -> IndexModel {
    IndexModel::builder()
        .keys(keys)
        .options(
            IndexOptions::builder()
                .unique(true)
                .name(name.to_string())
                .build(),
        )
        .build()
}

fn plain_index(keys: Document, name: &str) -> IndexModel {
    IndexModel::builder()
        .keys(keys)
        .options(IndexOptions::builder().name(name.to_string()).build())
        .build()
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(e)) if e.code == DUPLICATE_KEY_CODE
    )
}

fn category_clause(filter: &mut Document, categories: &[String]) {
    if !categories.is_empty() {
        filter.insert("category", doc! { "$in": categories.to_vec() });
    }
}

#[async_trait]
impl ContentStore for MongoContentStore {
    async fn get_user_cursor(&self, user_id: &str) -> AppResult<UserCursor> {
        let newest = self
            .assignments
            .find_one(doc! { "user_id": user_id })
            .sort(doc! { "adapted_article_id": -1 })
            .await?;
        Ok(newest.as_ref().map(UserCursor::from).unwrap_or_default())
    }

    async fn get_user_preferences(&self, user_id: &str) -> AppResult<Option<UserPreferences>> {
        find_unique(&self.user_settings, doc! { "user_id": user_id }, "user settings row").await
    }

    async fn query_adapted_articles(
        &self,
        filter: &ArticleFilter,
        after_id: i64,
        limit: usize,
    ) -> AppResult<Vec<AdaptedArticle>> {
        let mut query = doc! { "id": { "$gt": after_id } };
        if let Some(language) = &filter.language {
            query.insert("language", language.as_str());
        }
        if let Some(level) = &filter.level {
            query.insert("level", level.as_str());
        }
        category_clause(&mut query, &filter.categories);

        let articles = self
            .adapted_articles
            .find(query)
            .sort(doc! { "id": 1 })
            .limit(limit as i64)
            .await?
            .try_collect()
            .await?;
        Ok(articles)
    }

    async fn query_raw_articles(
        &self,
        filter: &ArticleFilter,
        after_id: i64,
        limit: usize,
    ) -> AppResult<Vec<RawArticle>> {
        let mut picked = Vec::new();
        if limit == 0 {
            return Ok(picked);
        }

        let mut scan_from = after_id;
        loop {
            let mut query = doc! { "id": { "$gt": scan_from } };
            category_clause(&mut query, &filter.categories);

            let page: Vec<RawArticle> = self
                .raw_articles
                .find(query)
                .sort(doc! { "id": 1 })
                .limit(RAW_SCAN_PAGE)
                .await?
                .try_collect()
                .await?;

            let Some(last) = page.last() else {
                break;
            };
            scan_from = last.id;
            let exhausted = (page.len() as i64) < RAW_SCAN_PAGE;

            let already_adapted = match filter.adaptation_pair() {
                Some((language, level)) => {
                    let ids = page.iter().map(|a| a.id).collect();
                    self.adapted_originals(ids, language, level).await?
                }
                None => HashSet::new(),
            };

            for article in page {
                if already_adapted.contains(&article.id) {
                    continue;
                }
                picked.push(article);
                if picked.len() == limit {
                    return Ok(picked);
                }
            }

            if exhausted {
                break;
            }
        }

        Ok(picked)
    }

    async fn find_raw_article(&self, id: i64) -> AppResult<Option<RawArticle>> {
        find_unique(&self.raw_articles, doc! { "id": id }, "raw article").await
    }

    async fn find_adapted_article(&self, id: i64) -> AppResult<Option<AdaptedArticle>> {
        find_unique(&self.adapted_articles, doc! { "id": id }, "adapted article").await
    }

    async fn insert_raw_article(&self, article: NewRawArticle) -> AppResult<RawArticle> {
        let id = self.next_id("articles").await?;
        let article = article.into_article(id);
        self.raw_articles.insert_one(&article).await?;
        Ok(article)
    }

    async fn insert_adapted_article(&self, article: NewAdaptedArticle) -> AppResult<AdaptedArticle> {
        let id = self.next_id("adapted_articles").await?;
        let article = article.into_article(id);
        self.adapted_articles.insert_one(&article).await?;
        Ok(article)
    }

    async fn insert_assignment(
        &self,
        user_id: &str,
        adapted_article_id: i64,
        original_article_id: i64,
    ) -> AppResult<AssignmentRecord> {
        let record = AssignmentRecord::new(user_id, adapted_article_id, original_article_id);
        match self.assignments.insert_one(&record).await {
            Ok(_) => Ok(record),
            Err(e) if is_duplicate_key(&e) => Err(AppError::AlreadyExists(format!(
                "Adapted article {} is already assigned to user '{}'",
                adapted_article_id, user_id
            ))),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_assignments(
        &self,
        user_id: &str,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<AssignmentRecord>> {
        let records = self
            .assignments
            .find(doc! { "user_id": user_id })
            .sort(doc! { "adapted_article_id": -1 })
            .skip(offset.max(0) as u64)
            .limit(limit)
            .await?
            .try_collect()
            .await?;
        Ok(records)
    }

    async fn health_check(&self) -> AppResult<()> {
        self.db.health_check().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn adapted(language: &str, level: &str, category: &str) -> AdaptedArticle {
        AdaptedArticle {
            id: 1,
            original_article_id: 1,
            category: category.to_string(),
            language: language.to_string(),
            level: level.to_string(),
            title: "t".to_string(),
            intro: "i".to_string(),
            adapted_text: "x".to_string(),
            dialogue_starter_question: "q".to_string(),
            metadata: serde_json::Value::Null,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        let filter = ArticleFilter::default();
        assert!(filter.matches_adapted(&adapted("German", "B1", "tech")));
        assert!(filter.adaptation_pair().is_none());
    }

    #[test]
    fn filter_follows_preferences() {
        let prefs = UserPreferences::new("u1", "English", "German", "B1").with_categories(&["tech"]);
        let filter = ArticleFilter::for_preferences(&prefs);

        assert!(filter.matches_adapted(&adapted("German", "B1", "tech")));
        assert!(!filter.matches_adapted(&adapted("German", "A2", "tech")));
        assert!(!filter.matches_adapted(&adapted("German", "B1", "sports")));
        assert_eq!(filter.adaptation_pair(), Some(("German", "B1")));
    }

    #[test]
    fn test_mongo_store_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MongoContentStore>();
    }
}
