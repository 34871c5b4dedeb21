use actix_web::{get, post, web, HttpResponse};
use validator::Validate;

use crate::{app_state::AppState, errors::AppError, models::dto::request::CreateGenerationRequest};

#[post("/api/users/{user_id}/generation-requests")]
pub async fn create_generation_request(
    state: web::Data<AppState>,
    user_id: web::Path<String>,
    request: web::Json<CreateGenerationRequest>,
) -> Result<HttpResponse, AppError> {
    request.validate()?;

    let request = request.into_inner();
    let per_category = request
        .articles_per_category
        .unwrap_or(state.config.articles_per_category);
    let created = state
        .generation_requests
        .submit(&user_id, request.categories, per_category)
        .await?;
    Ok(HttpResponse::Accepted().json(created))
}

#[get("/api/generation-requests/{id}")]
pub async fn get_generation_request(
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let request = state.generation_requests.get(&id).await?;
    Ok(HttpResponse::Ok().json(request))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Config,
        repositories::{InMemoryContentStore, InMemoryGenerationRequestRepository},
        services::model_client::MockCompletionModel,
    };
    use actix_web::{http::StatusCode, test, App};
    use serde_json::Value;
    use std::sync::Arc;

    #[actix_web::test]
    async fn test_submit_returns_accepted_processing_request() {
        let mut mock = MockCompletionModel::new();
        mock.expect_complete().returning(|_, _| {
            Ok(r#"{"title": "Markets", "content": "Stocks rose.", "category": "finance"}"#.to_string())
        });
        let state = AppState::with_components(
            Config::test_config(),
            Arc::new(InMemoryContentStore::new()),
            Arc::new(InMemoryGenerationRequestRepository::new()),
            Arc::new(mock),
        );

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .service(create_generation_request)
                .service(get_generation_request),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/users/u1/generation-requests")
            .set_json(serde_json::json!({ "categories": ["finance"] }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::ACCEPTED);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "processing");
        assert_eq!(body["articles_per_category"], 2);

        let id = body["id"].as_str().unwrap().to_string();
        let req = test::TestRequest::get()
            .uri(&format!("/api/generation-requests/{}", id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_unknown_request_is_404() {
        let state = AppState::with_components(
            Config::test_config(),
            Arc::new(InMemoryContentStore::new()),
            Arc::new(InMemoryGenerationRequestRepository::new()),
            Arc::new(MockCompletionModel::new()),
        );
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .service(get_generation_request),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/generation-requests/nope")
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_empty_categories_are_rejected() {
        let state = AppState::with_components(
            Config::test_config(),
            Arc::new(InMemoryContentStore::new()),
            Arc::new(InMemoryGenerationRequestRepository::new()),
            Arc::new(MockCompletionModel::new()),
        );
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .service(create_generation_request),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/users/u1/generation-requests")
            .set_json(serde_json::json!({ "categories": [] }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
