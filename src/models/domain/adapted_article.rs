use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A raw article rewritten for one learning language and level.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct AdaptedArticle {
    pub id: i64,
    pub original_article_id: i64,
    pub category: String, // Copied from the raw article so the feed can filter on it
    pub language: String,
    pub level: String,
    pub title: String,
    pub intro: String,
    pub adapted_text: String,
    pub dialogue_starter_question: String,
    pub metadata: serde_json::Value, // Revision notes, translation, dictionary
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewAdaptedArticle {
    pub original_article_id: i64,
    pub category: String,
    pub language: String,
    pub level: String,
    pub title: String,
    pub intro: String,
    pub adapted_text: String,
    pub dialogue_starter_question: String,
    pub metadata: serde_json::Value,
}

impl NewAdaptedArticle {
    pub fn into_article(self, id: i64) -> AdaptedArticle {
        AdaptedArticle {
            id,
            original_article_id: self.original_article_id,
            category: self.category,
            language: self.language,
            level: self.level,
            title: self.title,
            intro: self.intro,
            adapted_text: self.adapted_text,
            dialogue_starter_question: self.dialogue_starter_question,
            metadata: self.metadata,
            created_at: Utc::now(),
        }
    }
}
