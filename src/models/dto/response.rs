use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::domain::{AdaptedArticle, AssignedArticleRef, AssignmentOutcome, AssignmentRecord};

#[derive(Debug, Serialize)]
pub struct AssignmentResponse {
    pub requested: usize,
    pub assigned_count: usize,
    pub partial: bool,
    pub articles: Vec<AssignedArticleRef>,
}

impl From<AssignmentOutcome> for AssignmentResponse {
    fn from(outcome: AssignmentOutcome) -> Self {
        Self {
            requested: outcome.requested,
            assigned_count: outcome.assigned.len(),
            partial: outcome.is_partial(),
            articles: outcome.assigned,
        }
    }
}

/// One entry of a user's reading feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssignedArticleView {
    pub adapted_article_id: i64,
    pub title: String,
    pub intro: String,
    pub language: String,
    pub level: String,
    pub assigned_at: DateTime<Utc>,
}

impl AssignedArticleView {
    pub fn new(record: &AssignmentRecord, article: &AdaptedArticle) -> Self {
        Self {
            adapted_article_id: article.id,
            title: article.title.clone(),
            intro: article.intro.clone(),
            language: article.language.clone(),
            level: article.level.clone(),
            assigned_at: record.assigned_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub store: String,
}
