pub mod content_store;
pub mod generation_request_repository;
pub mod in_memory;

pub use content_store::{ArticleFilter, ContentStore, MongoContentStore};
pub use generation_request_repository::{
    GenerationRequestRepository, MongoGenerationRequestRepository,
};
pub use in_memory::{InMemoryContentStore, InMemoryGenerationRequestRepository};
