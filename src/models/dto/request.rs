use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct AssignArticlesRequest {
    #[validate(range(min = 1, max = 20))]
    pub count: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AdaptArticleRequest {
    #[validate(length(min = 1, max = 50))]
    pub main_language: String,

    #[validate(length(min = 1, max = 50))]
    pub learning_language: String,

    #[validate(length(min = 1, max = 10))]
    pub level: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GenerateArticleRequest {
    #[validate(length(min = 1, max = 100))]
    pub category: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateGenerationRequest {
    #[validate(length(min = 1, max = 20))]
    pub categories: Vec<String>,

    #[validate(range(min = 1, max = 10))]
    pub articles_per_category: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct PageQuery {
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i64>,

    #[validate(range(min = 0))]
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DialogTurn {
    pub speaker: String,
    pub text: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CoachRequest {
    pub user_id: String,

    #[serde(default)]
    pub history: Vec<DialogTurn>,

    #[validate(length(min = 1, max = 4000))]
    pub message: String,

    #[serde(default)]
    pub vocabulary: Vec<String>,

    #[serde(default)]
    pub grammar_topics: Vec<String>,
}
