use axum::{extract::State, Extension, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::request_id::RequestId,
    models::{Article, Recommendation, RecommendationOutcome, RecommendationRequest},
    routes::{parse_category, AppState, ArticleSelection},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationStatus {
    Found,
    NoRecommendations,
}

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub reference: Article,
    pub status: RecommendationStatus,
    pub recommendations: Vec<Recommendation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Handler for recommendations endpoint
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(selection): Json<ArticleSelection>,
) -> AppResult<Json<RecommendationResponse>> {
    let category = parse_category(&selection.category)?;
    let (reference, pool) = state
        .select_article(category, &selection.article_id)
        .await?;

    tracing::info!(
        request_id = %request_id,
        category = %category,
        article = %reference.id,
        pool = pool.len(),
        "Processing recommendation request"
    );

    let request = RecommendationRequest::new(reference, pool);
    let outcome = state.recommender.recommend(&request).await?;
    let reference = request.reference;

    let response = match outcome {
        RecommendationOutcome::Found(result) => RecommendationResponse {
            reference,
            status: RecommendationStatus::Found,
            recommendations: result.recommendations,
            message: None,
        },
        RecommendationOutcome::Unavailable { .. } => RecommendationResponse {
            reference,
            status: RecommendationStatus::NoRecommendations,
            recommendations: Vec::new(),
            message: Some("No similar articles could be found".to_string()),
        },
    };

    tracing::info!(
        request_id = %request_id,
        status = ?response.status,
        count = response.recommendations.len(),
        "Recommendation request completed"
    );

    Ok(Json(response))
}
