pub mod article_handler;
pub mod generation_handler;
pub mod health_handler;

use actix_web::web;

pub use article_handler::{
    adapt_article, assign_articles, coach_reply, generate_article, list_assigned_articles,
};
pub use generation_handler::{create_generation_request, get_generation_request};
pub use health_handler::{health_check, health_check_ready};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health_check)
        .service(health_check_ready)
        .service(assign_articles)
        .service(list_assigned_articles)
        .service(adapt_article)
        .service(generate_article)
        .service(coach_reply)
        .service(create_generation_request)
        .service(get_generation_request);
}
