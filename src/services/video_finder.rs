use std::{collections::HashSet, sync::Arc};
use tracing::instrument;

use crate::{
    error::AppError,
    models::{VideoEntry, VideoResult, VideoSearchFailure},
    services::providers::VideoSearchProvider,
};

const MANUAL_SEARCH_URL: &str = "https://www.youtube.com/results";

/// Collects videos for a list of keyword phrases, most specific phrase first
///
/// Each phrase is only searched while the target is still unmet. A failed search ends the
/// iteration; whatever was found before it is kept and the failure is reported alongside.
pub struct VideoFinder {
    provider: Arc<dyn VideoSearchProvider>,
    target: usize,
}

impl VideoFinder {
    pub fn new(provider: Arc<dyn VideoSearchProvider>, target: usize) -> Self {
        Self { provider, target }
    }

    #[instrument(skip(self), fields(target = self.target))]
    pub async fn find(&self, keywords: &[String]) -> VideoResult {
        let mut result = VideoResult::default();
        let mut seen: HashSet<String> = HashSet::new();

        for phrase in keywords {
            if result.videos.len() >= self.target {
                break;
            }

            let missing = self.target - result.videos.len();
            match self.provider.search_videos(phrase, self.target).await {
                Ok(videos) => {
                    let fresh: Vec<VideoEntry> = videos
                        .into_iter()
                        .filter(|v| seen.insert(v.video_id.clone()))
                        .take(missing)
                        .collect();

                    tracing::debug!(
                        phrase = %phrase,
                        added = fresh.len(),
                        provider = self.provider.name(),
                        "Video search phrase done"
                    );
                    result.videos.extend(fresh);
                }
                Err(e) => {
                    let failure = match e {
                        AppError::VideoSearch(failure) => failure,
                        other => VideoSearchFailure::Api(other.to_string()),
                    };
                    tracing::warn!(
                        phrase = %phrase,
                        failure = %failure,
                        kept = result.videos.len(),
                        provider = self.provider.name(),
                        "Video search failed"
                    );

                    result.manual_search_url =
                        keywords.first().and_then(|p| manual_search_url(p));
                    result.failure = Some(failure);
                    break;
                }
            }
        }

        tracing::info!(
            count = result.videos.len(),
            failed = result.failure.is_some(),
            "Video search completed"
        );

        result
    }
}

/// Link for running the primary phrase search by hand
pub fn manual_search_url(phrase: &str) -> Option<String> {
    url::Url::parse_with_params(MANUAL_SEARCH_URL, &[("search_query", phrase)])
        .ok()
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::providers::MockVideoSearchProvider;

    fn video(id: &str) -> VideoEntry {
        VideoEntry {
            video_id: id.to_string(),
            title: format!("Video {}", id),
            thumbnail_url: None,
            link: format!("https://www.youtube.com/watch?v={}", id),
            channel: None,
        }
    }

    fn videos(ids: &[&str]) -> Vec<VideoEntry> {
        ids.iter().map(|id| video(id)).collect()
    }

    fn keywords(phrases: &[&str]) -> Vec<String> {
        phrases.iter().map(|p| p.to_string()).collect()
    }

    fn ids(result: &VideoResult) -> Vec<&str> {
        result.videos.iter().map(|v| v.video_id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_stops_once_target_met() {
        let mut provider = MockVideoSearchProvider::new();
        provider
            .expect_search_videos()
            .withf(|phrase, max| phrase == "K1" && *max == 5)
            .times(1)
            .returning(|_, _| Ok(videos(&["a", "b"])));
        provider
            .expect_search_videos()
            .withf(|phrase, max| phrase == "K2" && *max == 5)
            .times(1)
            .returning(|_, _| Ok(videos(&["b", "c", "d", "e", "f"])));
        provider
            .expect_search_videos()
            .withf(|phrase, max| phrase == "K3" && *max == 5)
            .never();
        provider.expect_name().return_const("fake");

        let finder = VideoFinder::new(Arc::new(provider), 5);
        let result = finder.find(&keywords(&["K1", "K2", "K3"])).await;

        assert_eq!(ids(&result), vec!["a", "b", "c", "d", "e"]);
        assert!(result.failure.is_none());
        assert!(result.manual_search_url.is_none());
    }

    #[tokio::test]
    async fn test_two_then_four_results_fill_target() {
        let mut provider = MockVideoSearchProvider::new();
        provider
            .expect_search_videos()
            .withf(|phrase, _| phrase == "K1")
            .times(1)
            .returning(|_, _| Ok(videos(&["a", "b"])));
        provider
            .expect_search_videos()
            .withf(|phrase, _| phrase == "K2")
            .times(1)
            .returning(|_, _| Ok(videos(&["c", "d", "e", "f"])));
        provider
            .expect_search_videos()
            .withf(|phrase, _| phrase == "K3")
            .never();
        provider.expect_name().return_const("fake");

        let finder = VideoFinder::new(Arc::new(provider), 5);
        let result = finder.find(&keywords(&["K1", "K2", "K3"])).await;

        assert_eq!(ids(&result), vec!["a", "b", "c", "d", "e"]);
        assert!(result.failure.is_none());
    }

    #[tokio::test]
    async fn test_failure_keeps_partial_results() {
        let mut provider = MockVideoSearchProvider::new();
        provider
            .expect_search_videos()
            .withf(|phrase, max| phrase == "mars rover" && *max == 5)
            .returning(|_, _| Ok(videos(&["a"])));
        provider
            .expect_search_videos()
            .withf(|phrase, max| phrase == "nasa" && *max == 5)
            .returning(|_, _| Err(AppError::VideoSearch(VideoSearchFailure::QuotaExceeded)));
        provider
            .expect_search_videos()
            .withf(|phrase, max| phrase == "mars" && *max == 5)
            .never();
        provider.expect_name().return_const("fake");

        let finder = VideoFinder::new(Arc::new(provider), 5);
        let result = finder.find(&keywords(&["mars rover", "nasa", "mars"])).await;

        assert_eq!(ids(&result), vec!["a"]);
        assert_eq!(result.failure, Some(VideoSearchFailure::QuotaExceeded));
        assert_eq!(
            result.manual_search_url.as_deref(),
            Some("https://www.youtube.com/results?search_query=mars+rover")
        );
    }

    #[tokio::test]
    async fn test_exhausted_keywords_without_failure() {
        let mut provider = MockVideoSearchProvider::new();
        provider
            .expect_search_videos()
            .times(2)
            .returning(|_, _| Ok(Vec::new()));
        provider.expect_name().return_const("fake");

        let finder = VideoFinder::new(Arc::new(provider), 5);
        let result = finder.find(&keywords(&["K1", "K2"])).await;

        assert!(result.videos.is_empty());
        assert!(result.failure.is_none());
    }

    #[tokio::test]
    async fn test_no_keywords() {
        let finder = VideoFinder::new(Arc::new(MockVideoSearchProvider::new()), 5);
        let result = finder.find(&[]).await;
        assert_eq!(result, VideoResult::default());
    }

    #[test]
    fn test_manual_search_url_encodes_phrase() {
        assert_eq!(
            manual_search_url("café & croissants").as_deref(),
            Some("https://www.youtube.com/results?search_query=caf%C3%A9+%26+croissants")
        );
    }
}
