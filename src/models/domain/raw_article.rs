use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A source article in its original language, before any adaptation.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct RawArticle {
    pub id: i64, // Assigned by the store, monotonic
    pub title: String,
    pub category: String,
    pub original_text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewRawArticle {
    pub title: String,
    pub category: String,
    pub original_text: String,
}

impl NewRawArticle {
    pub fn new(title: &str, category: &str, original_text: &str) -> Self {
        Self {
            title: title.to_string(),
            category: category.to_string(),
            original_text: original_text.to_string(),
        }
    }

    pub fn into_article(self, id: i64) -> RawArticle {
        RawArticle {
            id,
            title: self.title,
            category: self.category,
            original_text: self.original_text,
            created_at: Utc::now(),
        }
    }
}
