use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStatus {
    Processing,
    Completed,
    Failed,
}

impl GenerationStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, GenerationStatus::Processing)
    }
}

impl std::fmt::Display for GenerationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerationStatus::Processing => write!(f, "processing"),
            GenerationStatus::Completed => write!(f, "completed"),
            GenerationStatus::Failed => write!(f, "failed"),
        }
    }
}

/// A bulk, fire-and-forget request to mint raw articles for some categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub id: String,
    pub user_id: String,
    pub categories: Vec<String>,
    pub articles_per_category: usize,
    pub status: GenerationStatus,
    #[serde(default)]
    pub generated_article_ids: Vec<i64>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl GenerationRequest {
    pub fn new(user_id: &str, categories: Vec<String>, articles_per_category: usize) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            categories,
            articles_per_category,
            status: GenerationStatus::Processing,
            generated_article_ids: Vec::new(),
            error_message: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }
}

/// Terminal outcome written back once the background task finishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOutcome {
    pub status: GenerationStatus,
    pub generated_article_ids: Vec<i64>,
    pub error_message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_request_starts_processing() {
        let request = GenerationRequest::new("u1", vec!["tech".to_string()], 3);

        assert_eq!(request.status, GenerationStatus::Processing);
        assert!(!request.status.is_terminal());
        assert!(request.completed_at.is_none());
        assert!(Uuid::parse_str(&request.id).is_ok());
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&GenerationStatus::Completed).unwrap();
        assert_eq!(json, "\"completed\"");
        assert_eq!(GenerationStatus::Failed.to_string(), "failed");
        assert!(GenerationStatus::Failed.is_terminal());
    }
}
