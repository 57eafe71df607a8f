use axum::{extract::State, Extension, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::request_id::RequestId,
    models::{KeywordOrigin, VideoEntry, VideoSearchFailure},
    routes::{parse_category, AppState, ArticleSelection},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoStatus {
    Found,
    NoVideos,
    VideoSearchUnavailable,
}

#[derive(Debug, Serialize)]
pub struct VideoResponse {
    pub keywords: Vec<String>,
    pub keyword_origin: KeywordOrigin,
    pub status: VideoStatus,
    pub videos: Vec<VideoEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<VideoSearchFailure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manual_search_url: Option<String>,
}

/// Handler finding videos related to a selected article
pub async fn find_videos(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(selection): Json<ArticleSelection>,
) -> AppResult<Json<VideoResponse>> {
    let category = parse_category(&selection.category)?;
    let (article, _) = state
        .select_article(category, &selection.article_id)
        .await?;

    let query = state.video_queries.extract(&article).await;
    tracing::info!(
        request_id = %request_id,
        article = %article.id,
        keywords = ?query.keywords,
        origin = ?query.origin,
        "Searching videos"
    );

    let result = state.video_finder.find(&query.keywords).await;

    let status = if result.failure.is_some() {
        VideoStatus::VideoSearchUnavailable
    } else if result.videos.is_empty() {
        VideoStatus::NoVideos
    } else {
        VideoStatus::Found
    };

    Ok(Json(VideoResponse {
        keywords: query.keywords,
        keyword_origin: query.origin,
        status,
        videos: result.videos,
        failure: result.failure,
        manual_search_url: result.manual_search_url,
    }))
}
