use crate::models::domain::{AdaptedArticle, RawArticle};

#[cfg(test)]
pub mod fixtures {
    use super::*;
    use chrono::Utc;

    /// A raw article with a fixed id, for seeding the in-memory store.
    pub fn raw_article(id: i64, category: &str) -> RawArticle {
        RawArticle {
            id,
            title: format!("Raw article {}", id),
            category: category.to_string(),
            original_text: format!("Original text of article {} about {}.", id, category),
            created_at: Utc::now(),
        }
    }

    /// An adapted article with fixed ids.
    pub fn adapted_article(
        id: i64,
        original_article_id: i64,
        category: &str,
        language: &str,
        level: &str,
    ) -> AdaptedArticle {
        AdaptedArticle {
            id,
            original_article_id,
            category: category.to_string(),
            language: language.to_string(),
            level: level.to_string(),
            title: format!("Adapted article {}", id),
            intro: "A short intro.".to_string(),
            adapted_text: "A simple text.".to_string(),
            dialogue_starter_question: "What do you think?".to_string(),
            metadata: serde_json::json!({}),
            created_at: Utc::now(),
        }
    }

    /// A model answer that satisfies the adaptation schema.
    pub fn adaptation_json(title: &str) -> String {
        serde_json::json!({
            "title": title,
            "intro": "Eine kurze Einleitung.",
            "adapted_text": "Ein einfacher Text.",
            "dialogue_starter_question": "Was denkst du?",
            "metadata": { "revisionNotes": ["shorter sentences"] }
        })
        .to_string()
    }
}

#[cfg(test)]
pub mod test_helpers {
    use actix_web::http::StatusCode;

    /// Asserts that a status code represents an error (4xx or 5xx)
    pub fn assert_error_status(status: StatusCode) {
        assert!(
            status.is_client_error() || status.is_server_error(),
            "Expected error status, got: {}",
            status
        );
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;

    #[test]
    fn test_fixtures_adaptation_json_is_valid() {
        let value: serde_json::Value = serde_json::from_str(&adaptation_json("Titel")).unwrap();
        assert_eq!(value["title"], "Titel");
    }

    #[test]
    fn test_fixtures_keep_ids() {
        assert_eq!(raw_article(7, "tech").id, 7);
        let adapted = adapted_article(10, 7, "tech", "German", "B1");
        assert_eq!(adapted.original_article_id, 7);
        assert_eq!(adapted.level, "B1");
    }
}
