use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::{make_span_with_request_id, request_id_middleware},
    models::Category,
};

pub mod categories;
pub mod recommendations;
mod state;
pub mod videos;

pub use state::AppState;

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id)),
        )
}

/// API routes under /api/v1
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/categories", get(categories::list))
        .route("/categories/:category/articles", get(categories::articles))
        .route("/recommendations", post(recommendations::recommend))
        .route("/videos", post(videos::find_videos))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// An article picked from a category's current pool
#[derive(Debug, Deserialize)]
pub struct ArticleSelection {
    pub category: String,
    pub article_id: String,
}

pub(crate) fn parse_category(raw: &str) -> AppResult<Category> {
    raw.parse::<Category>().map_err(AppError::InvalidInput)
}
