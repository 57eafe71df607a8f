/// External service abstractions
///
/// Each outside dependency (feeds, news search, the AI service, video search) sits behind a
/// narrow trait so the pipeline can run against fakes without any network.
use crate::{
    error::AppResult,
    models::{ParsedFeed, SearchHit, VideoEntry},
};

pub mod gemini;
pub mod google_news;
pub mod rss_client;
pub mod youtube;

pub use gemini::GeminiProvider;
pub use google_news::GoogleNewsProvider;
pub use rss_client::RssFeedClient;
pub use youtube::YouTubeProvider;

/// Retrieves and parses a single RSS or Atom document
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait FeedReader: Send + Sync {
    async fn read_feed(&self, url: &str) -> AppResult<ParsedFeed>;
}

/// Free-text news search used when the configured feeds come up short
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait NewsSearchProvider: Send + Sync {
    async fn search_news(&self, query: &str, limit: usize) -> AppResult<Vec<SearchHit>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Opaque text-completion service
///
/// Transport, authentication and quota failures are reported as
/// [`AppError::AiUnavailable`](crate::error::AppError::AiUnavailable).
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> AppResult<String>;

    fn name(&self) -> &'static str;
}

/// Keyword phrase to list of videos
///
/// Failures are reported as [`AppError::VideoSearch`](crate::error::AppError::VideoSearch) so
/// they stay distinguishable from an empty result.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait VideoSearchProvider: Send + Sync {
    async fn search_videos(&self, phrase: &str, max_results: usize) -> AppResult<Vec<VideoEntry>>;

    fn name(&self) -> &'static str;
}
