use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The fact that a user has already been handed an adapted article.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct AssignmentRecord {
    pub user_id: String,
    pub adapted_article_id: i64,
    pub original_article_id: i64,
    pub assigned_at: DateTime<Utc>,
}

impl AssignmentRecord {
    pub fn new(user_id: &str, adapted_article_id: i64, original_article_id: i64) -> Self {
        Self {
            user_id: user_id.to_string(),
            adapted_article_id,
            original_article_id,
            assigned_at: Utc::now(),
        }
    }
}

/// Position of a user in the content pools, taken from their newest assignment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UserCursor {
    pub last_adapted_id: i64,
    pub last_original_id: i64,
}

impl From<&AssignmentRecord> for UserCursor {
    fn from(record: &AssignmentRecord) -> Self {
        Self {
            last_adapted_id: record.adapted_article_id,
            last_original_id: record.original_article_id,
        }
    }
}

/// Where an assigned article came from during backfill.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentSource {
    Reused,
    Adapted,
    Generated,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct AssignedArticleRef {
    pub adapted_article_id: i64,
    pub original_article_id: i64,
    pub title: String,
    pub source: AssignmentSource,
}

/// Result of one `assign` call. Fewer items than requested is a valid outcome.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssignmentOutcome {
    pub requested: usize,
    pub assigned: Vec<AssignedArticleRef>,
}

impl AssignmentOutcome {
    pub fn is_partial(&self) -> bool {
        self.assigned.len() < self.requested
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_comes_from_record() {
        let record = AssignmentRecord::new("u1", 11, 4);
        let cursor = UserCursor::from(&record);

        assert_eq!(cursor.last_adapted_id, 11);
        assert_eq!(cursor.last_original_id, 4);
        assert_eq!(UserCursor::default().last_adapted_id, 0);
    }

    #[test]
    fn outcome_reports_partial_fulfilment() {
        let outcome = AssignmentOutcome {
            requested: 3,
            assigned: vec![AssignedArticleRef {
                adapted_article_id: 10,
                original_article_id: 2,
                title: "t".to_string(),
                source: AssignmentSource::Reused,
            }],
        };

        assert!(outcome.is_partial());
    }
}
