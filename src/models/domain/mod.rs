pub mod adapted_article;
pub mod assignment;
pub mod generation_request;
pub mod raw_article;
pub mod user_preferences;
pub use adapted_article::{AdaptedArticle, NewAdaptedArticle};
pub use assignment::{
    AssignedArticleRef, AssignmentOutcome, AssignmentRecord, AssignmentSource, UserCursor,
};
pub use generation_request::{GenerationOutcome, GenerationRequest, GenerationStatus};
pub use raw_article::{NewRawArticle, RawArticle};
pub use user_preferences::{AdaptationTarget, UserPreferences};
