/// YouTube Data API v3 search provider
///
/// One `search.list` call per keyword phrase (100 quota units each), so responses are cached
/// per phrase. Errors are classified into [`VideoSearchFailure`] so callers can tell a spent
/// quota or a bad key apart from "no videos".
use reqwest::{Client as HttpClient, StatusCode};
use std::time::Duration;
use tracing::instrument;

use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{VideoEntry, VideoSearchFailure, YouTubeErrorResponse, YouTubeSearchResponse},
    services::providers::VideoSearchProvider,
};

const VIDEO_CACHE_TTL: u64 = 21600; // 6 hours

#[derive(Clone)]
pub struct YouTubeProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    cache: Cache,
}

impl YouTubeProvider {
    pub fn new(cache: Cache, api_key: String, api_url: String, timeout: Duration) -> Self {
        Self {
            http_client: HttpClient::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| HttpClient::new()),
            api_key,
            api_url,
            cache,
        }
    }

    async fn fetch(&self, phrase: &str, max_results: usize) -> AppResult<Vec<VideoEntry>> {
        let url = format!("{}/search", self.api_url.trim_end_matches('/'));
        let max_results = max_results.clamp(1, 50).to_string();

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("part", "snippet"),
                ("type", "video"),
                ("q", phrase),
                ("maxResults", max_results.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                AppError::VideoSearch(VideoSearchFailure::Network(e.without_url().to_string()))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let failure = classify_failure(status, &body);
            tracing::warn!(
                status = %status,
                failure = %failure,
                provider = "youtube",
                "Video search rejected"
            );
            return Err(AppError::VideoSearch(failure));
        }

        let results: YouTubeSearchResponse = response.json().await.map_err(|e| {
            AppError::VideoSearch(VideoSearchFailure::Api(format!(
                "Unreadable YouTube response: {}",
                e.without_url()
            )))
        })?;

        let videos: Vec<VideoEntry> = results
            .items
            .into_iter()
            .filter_map(|item| item.into_video_entry())
            .collect();

        tracing::info!(
            phrase = %phrase,
            results = videos.len(),
            provider = "youtube",
            "Video search completed"
        );

        Ok(videos)
    }
}

#[async_trait::async_trait]
impl VideoSearchProvider for YouTubeProvider {
    #[instrument(skip(self))]
    async fn search_videos(&self, phrase: &str, max_results: usize) -> AppResult<Vec<VideoEntry>> {
        if phrase.trim().is_empty() {
            return Ok(Vec::new());
        }

        let videos: Vec<VideoEntry> = cached!(
            self.cache,
            CacheKey::VideoSearch(format!("{}#{}", phrase, max_results)),
            VIDEO_CACHE_TTL,
            self.fetch(phrase, max_results)
        )?;

        Ok(videos)
    }

    fn name(&self) -> &'static str {
        "youtube"
    }
}

/// Maps a failed search response onto a failure reason
fn classify_failure(status: StatusCode, body: &str) -> VideoSearchFailure {
    let parsed = serde_json::from_str::<YouTubeErrorResponse>(body).ok();
    let reasons: Vec<String> = parsed
        .as_ref()
        .map(|r| r.error.errors.iter().map(|e| e.reason.clone()).collect())
        .unwrap_or_default();
    let has_reason = |wanted: &[&str]| reasons.iter().any(|r| wanted.contains(&r.as_str()));

    if status == StatusCode::TOO_MANY_REQUESTS
        || has_reason(&["quotaExceeded", "dailyLimitExceeded", "rateLimitExceeded"])
    {
        return VideoSearchFailure::QuotaExceeded;
    }

    if status == StatusCode::UNAUTHORIZED
        || status == StatusCode::FORBIDDEN
        || has_reason(&["keyInvalid", "keyExpired", "forbidden", "accessNotConfigured"])
    {
        return VideoSearchFailure::Authentication;
    }

    let message = parsed
        .map(|r| r.error.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("YouTube returned status {}", status));
    VideoSearchFailure::Api(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error_body(code: u16, reason: &str) -> String {
        format!(
            r#"{{"error": {{"code": {}, "message": "boom", "errors": [{{"reason": "{}"}}]}}}}"#,
            code, reason
        )
    }

    #[test]
    fn test_classify_quota_exceeded() {
        let failure = classify_failure(StatusCode::FORBIDDEN, &error_body(403, "quotaExceeded"));
        assert_eq!(failure, VideoSearchFailure::QuotaExceeded);
    }

    #[test]
    fn test_classify_too_many_requests() {
        let failure = classify_failure(StatusCode::TOO_MANY_REQUESTS, "");
        assert_eq!(failure, VideoSearchFailure::QuotaExceeded);
    }

    #[test]
    fn test_classify_invalid_key() {
        let failure = classify_failure(StatusCode::BAD_REQUEST, &error_body(400, "keyInvalid"));
        assert_eq!(failure, VideoSearchFailure::Authentication);
    }

    #[test]
    fn test_classify_forbidden_without_body() {
        let failure = classify_failure(StatusCode::FORBIDDEN, "not json");
        assert_eq!(failure, VideoSearchFailure::Authentication);
    }

    #[test]
    fn test_classify_other_error() {
        let failure = classify_failure(
            StatusCode::INTERNAL_SERVER_ERROR,
            &error_body(500, "backendError"),
        );
        assert_eq!(failure, VideoSearchFailure::Api("boom".to_string()));
    }

    #[tokio::test]
    async fn test_blank_phrase_returns_nothing() {
        let provider = YouTubeProvider::new(
            Cache::disabled().0,
            "key".to_string(),
            "http://test.local".to_string(),
            Duration::from_secs(5),
        );
        let videos = provider.search_videos("   ", 5).await.unwrap();
        assert!(videos.is_empty());
    }

    #[tokio::test]
    async fn test_transport_error_hides_api_key() {
        let provider = YouTubeProvider::new(
            Cache::disabled().0,
            "YTSECRET".to_string(),
            "http://127.0.0.1:1".to_string(),
            Duration::from_secs(2),
        );

        match provider.search_videos("mars rover", 5).await {
            Err(AppError::VideoSearch(failure)) => {
                assert!(matches!(failure, VideoSearchFailure::Network(_)));
                let json = serde_json::to_string(&failure).unwrap();
                assert!(!json.contains("YTSECRET"), "key leaked: {}", json);
            }
            other => panic!("expected network failure, got {:?}", other),
        }
    }
}
