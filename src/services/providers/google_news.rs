/// Google News RSS search provider
///
/// Used when a category's own feeds come up short. The search endpoint answers with a plain
/// RSS 2.0 document whose item titles carry a trailing " - Publisher" suffix.
use reqwest::Client as HttpClient;
use std::time::Duration;
use tracing::instrument;

use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::SearchHit,
    services::providers::{rss_client::parse_rss_channel, NewsSearchProvider},
};

const SEARCH_CACHE_TTL: u64 = 3600; // 1 hour

#[derive(Clone)]
pub struct GoogleNewsProvider {
    http_client: HttpClient,
    base_url: String,
    cache: Cache,
}

impl GoogleNewsProvider {
    pub fn new(cache: Cache, base_url: String, timeout: Duration) -> Self {
        Self {
            http_client: HttpClient::builder()
                .timeout(timeout)
                .user_agent("Mozilla/5.0 (compatible; newsmatch/0.1)")
                .build()
                .unwrap_or_else(|_| HttpClient::new()),
            base_url,
            cache,
        }
    }

    fn convert_channel(&self, channel: &rss::Channel) -> Vec<SearchHit> {
        let parsed = parse_rss_channel(channel);

        channel
            .items()
            .iter()
            .zip(parsed.entries)
            .filter_map(|(item, entry)| {
                let source = item
                    .source()
                    .and_then(|s| s.title())
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty());

                let title = strip_publisher_suffix(&entry.title?, source.as_deref());

                Some(SearchHit {
                    title,
                    link: entry.link?,
                    snippet: entry.summary.unwrap_or_default(),
                    source,
                    published: entry.published,
                })
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl NewsSearchProvider for GoogleNewsProvider {
    #[instrument(skip(self))]
    async fn search_news(&self, query: &str, limit: usize) -> AppResult<Vec<SearchHit>> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Search query cannot be empty".to_string(),
            ));
        }

        let hits: Vec<SearchHit> = cached!(
            self.cache,
            CacheKey::NewsSearch(query.to_string()),
            SEARCH_CACHE_TTL,
            async move {
                let response = self
                    .http_client
                    .get(&self.base_url)
                    .query(&[
                        ("q", query),
                        ("hl", "en-US"),
                        ("gl", "US"),
                        ("ceid", "US:en"),
                    ])
                    .send()
                    .await?;

                if !response.status().is_success() {
                    let status = response.status();
                    return Err(AppError::ExternalApi(format!(
                        "Google News returned status {}",
                        status
                    )));
                }

                let content = response.bytes().await?;
                let channel = rss::Channel::read_from(&content[..]).map_err(|e| {
                    AppError::ExternalApi(format!("Failed to parse Google News RSS: {}", e))
                })?;

                let hits = self.convert_channel(&channel);

                tracing::info!(
                    query = %query,
                    results = hits.len(),
                    provider = "google_news",
                    "News search completed"
                );

                Ok::<_, AppError>(hits)
            }
        )?;

        Ok(hits.into_iter().take(limit).collect())
    }

    fn name(&self) -> &'static str {
        "google_news"
    }
}

/// "Headline - Publisher" becomes "Headline" when the publisher is known
fn strip_publisher_suffix(title: &str, source: Option<&str>) -> String {
    let title = title.trim();
    if let Some(source) = source {
        if let Some(stripped) = title.strip_suffix(source) {
            if let Some(stripped) = stripped.trim_end().strip_suffix('-') {
                let stripped = stripped.trim_end();
                if !stripped.is_empty() {
                    return stripped.to_string();
                }
            }
        }
    }
    title.to_string()
}
