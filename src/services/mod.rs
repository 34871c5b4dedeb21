pub mod adaptation_service;
pub mod article_generator;
pub mod backfill_service;
pub mod dialog_coach;
pub mod generation_request_service;
pub mod model_client;
pub mod output_parser;
pub mod prompt_renderer;
pub mod structured_output;

pub use adaptation_service::AdaptationService;
pub use article_generator::ArticleGenerator;
pub use backfill_service::BackfillService;
pub use dialog_coach::DialogCoach;
pub use generation_request_service::GenerationRequestService;
pub use structured_output::StructuredOutputPipeline;
