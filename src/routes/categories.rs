use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::request_id::RequestId,
    models::{Article, Category},
    routes::{parse_category, AppState},
};

const NO_ARTICLES_MESSAGE: &str = "No articles available";

#[derive(Debug, Serialize)]
pub struct CategoryInfo {
    pub id: Category,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct ArticlesResponse {
    pub category: Category,
    pub articles: Vec<Article>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Handler listing the selectable categories
pub async fn list() -> Json<Vec<CategoryInfo>> {
    Json(
        Category::ALL
            .into_iter()
            .map(|category| CategoryInfo {
                id: category,
                name: category.to_string(),
            })
            .collect(),
    )
}

/// Handler fetching a fresh article pool for a category
pub async fn articles(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Path(category): Path<String>,
) -> AppResult<Json<ArticlesResponse>> {
    let category = parse_category(&category)?;

    tracing::info!(request_id = %request_id, category = %category, "Fetching articles");

    let articles = state.refresh_pool(category).await;
    let message = articles
        .is_empty()
        .then(|| NO_ARTICLES_MESSAGE.to_string());

    tracing::info!(
        request_id = %request_id,
        category = %category,
        count = articles.len(),
        "Articles served"
    );

    Ok(Json(ArticlesResponse {
        category,
        articles,
        message,
    }))
}
