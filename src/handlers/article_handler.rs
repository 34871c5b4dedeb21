use actix_web::{get, post, web, HttpResponse};
use chrono::Utc;
use validator::Validate;

use crate::{
    app_state::AppState,
    errors::AppError,
    models::dto::{
        request::{
            AdaptArticleRequest, AssignArticlesRequest, CoachRequest, GenerateArticleRequest,
            PageQuery,
        },
        response::AssignmentResponse,
    },
};

const DEFAULT_PAGE_SIZE: i64 = 20;

#[post("/api/users/{user_id}/articles/assign")]
pub async fn assign_articles(
    state: web::Data<AppState>,
    user_id: web::Path<String>,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    // Only an empty body means "use the default count".
    let request: AssignArticlesRequest = if body.iter().all(u8::is_ascii_whitespace) {
        AssignArticlesRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::ValidationError(format!("invalid request body: {}", e)))?
    };
    request.validate()?;

    let count = request.count.unwrap_or(state.config.default_assign_count);
    let outcome = state.backfill_service.assign(&user_id, count).await?;
    Ok(HttpResponse::Ok().json(AssignmentResponse::from(outcome)))
}

#[get("/api/users/{user_id}/articles")]
pub async fn list_assigned_articles(
    state: web::Data<AppState>,
    user_id: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, AppError> {
    query.validate()?;

    let articles = state
        .backfill_service
        .assigned_articles(
            &user_id,
            query.limit.unwrap_or(DEFAULT_PAGE_SIZE),
            query.offset.unwrap_or(0),
        )
        .await?;
    Ok(HttpResponse::Ok().json(articles))
}

#[post("/api/articles/{id}/adapt")]
pub async fn adapt_article(
    state: web::Data<AppState>,
    id: web::Path<i64>,
    request: web::Json<AdaptArticleRequest>,
) -> Result<HttpResponse, AppError> {
    request.validate()?;

    let adapted = state
        .adaptation_service
        .adapt(
            id.into_inner(),
            &request.main_language,
            &request.learning_language,
            &request.level,
        )
        .await?;
    Ok(HttpResponse::Created().json(adapted))
}

#[post("/api/articles/generate")]
pub async fn generate_article(
    state: web::Data<AppState>,
    request: web::Json<GenerateArticleRequest>,
) -> Result<HttpResponse, AppError> {
    request.validate()?;

    let article = state
        .article_generator
        .generate(request.category.trim(), Utc::now().date_naive())
        .await?;
    Ok(HttpResponse::Created().json(article))
}

#[post("/api/adapted-articles/{id}/coach")]
pub async fn coach_reply(
    state: web::Data<AppState>,
    id: web::Path<i64>,
    request: web::Json<CoachRequest>,
) -> Result<HttpResponse, AppError> {
    request.validate()?;

    let reply = state.dialog_coach.coach(id.into_inner(), &request).await?;
    Ok(HttpResponse::Ok().json(reply))
}
