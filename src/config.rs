use serde::Deserialize;
use std::time::Duration;

use crate::models::{default_feed_table, FeedTable};

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Gemini API key
    pub gemini_api_key: String,

    /// YouTube Data API key
    pub youtube_api_key: String,

    /// Gemini model used for recommendations and keyword extraction
    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,

    /// Gemini API base URL
    #[serde(default = "default_gemini_api_url")]
    pub gemini_api_url: String,

    /// YouTube Data API base URL
    #[serde(default = "default_youtube_api_url")]
    pub youtube_api_url: String,

    /// Google News RSS search endpoint
    #[serde(default = "default_google_news_url")]
    pub google_news_url: String,

    /// Redis connection URL. Caching is disabled when unset.
    #[serde(default)]
    pub redis_url: Option<String>,

    /// JSON file mapping category to feed URLs. Built-in table when unset.
    #[serde(default)]
    pub feeds_file: Option<String>,

    #[serde(default = "default_feed_timeout_secs")]
    pub feed_timeout_secs: u64,

    #[serde(default = "default_ai_timeout_secs")]
    pub ai_timeout_secs: u64,

    #[serde(default = "default_video_timeout_secs")]
    pub video_timeout_secs: u64,

    /// Entries kept from each feed
    #[serde(default = "default_per_source_limit")]
    pub per_source_limit: usize,

    /// Below this many articles a category is topped up from news search
    #[serde(default = "default_min_articles")]
    pub min_articles: usize,

    /// Candidates sent to the AI service per recommendation request
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,

    /// Upper bound on normalized article content, in characters
    #[serde(default = "default_content_max_chars")]
    pub content_max_chars: usize,

    /// Videos returned per article
    #[serde(default = "default_video_target")]
    pub video_target: usize,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_gemini_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_gemini_api_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_youtube_api_url() -> String {
    "https://www.googleapis.com/youtube/v3".to_string()
}

fn default_google_news_url() -> String {
    "https://news.google.com/rss/search".to_string()
}

fn default_feed_timeout_secs() -> u64 {
    10
}

fn default_ai_timeout_secs() -> u64 {
    30
}

fn default_video_timeout_secs() -> u64 {
    10
}

fn default_per_source_limit() -> usize {
    10
}

fn default_min_articles() -> usize {
    5
}

fn default_max_candidates() -> usize {
    30
}

fn default_content_max_chars() -> usize {
    800
}

fn default_video_target() -> usize {
    5
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Category to feed URL table, read from `feeds_file` when configured
    pub fn feed_table(&self) -> anyhow::Result<FeedTable> {
        match &self.feeds_file {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .map_err(|e| anyhow::anyhow!("Failed to read feeds file {}: {}", path, e))?;
                let table: FeedTable = serde_json::from_str(&raw)
                    .map_err(|e| anyhow::anyhow!("Invalid feeds file {}: {}", path, e))?;
                Ok(table)
            }
            None => Ok(default_feed_table()),
        }
    }

    pub fn feed_timeout(&self) -> Duration {
        Duration::from_secs(self.feed_timeout_secs)
    }

    pub fn ai_timeout(&self) -> Duration {
        Duration::from_secs(self.ai_timeout_secs)
    }

    pub fn video_timeout(&self) -> Duration {
        Duration::from_secs(self.video_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;

    fn parse(vars: Vec<(&str, &str)>) -> Result<Config, envy::Error> {
        envy::from_iter(
            vars.into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string())),
        )
    }

    #[test]
    fn test_defaults_applied() {
        let config = parse(vec![
            ("GEMINI_API_KEY", "g-key"),
            ("YOUTUBE_API_KEY", "y-key"),
        ])
        .unwrap();

        assert_eq!(config.gemini_model, "gemini-1.5-flash");
        assert_eq!(config.min_articles, 5);
        assert_eq!(config.per_source_limit, 10);
        assert_eq!(config.video_target, 5);
        assert!(config.redis_url.is_none());
        assert_eq!(config.feed_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_missing_credentials_is_an_error() {
        let result = parse(vec![("YOUTUBE_API_KEY", "y-key")]);
        assert!(result.is_err());
    }

    #[test]
    fn test_overrides() {
        let config = parse(vec![
            ("GEMINI_API_KEY", "g-key"),
            ("YOUTUBE_API_KEY", "y-key"),
            ("MIN_ARTICLES", "8"),
            ("REDIS_URL", "redis://cache:6379"),
            ("PORT", "8080"),
        ])
        .unwrap();

        assert_eq!(config.min_articles, 8);
        assert_eq!(config.redis_url.as_deref(), Some("redis://cache:6379"));
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_builtin_feed_table_without_file() {
        let config = parse(vec![
            ("GEMINI_API_KEY", "g-key"),
            ("YOUTUBE_API_KEY", "y-key"),
        ])
        .unwrap();

        let table = config.feed_table().unwrap();
        assert_eq!(table.get(&Category::Technology).map(Vec::len), Some(3));
    }
}
