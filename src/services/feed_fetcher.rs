use futures::future::join_all;
use std::{cmp::Ordering, sync::Arc, time::Duration};
use tracing::instrument;

use crate::{
    error::AppResult,
    models::{Article, Category, FeedEntry, FeedTable, ParsedFeed, UNKNOWN_SOURCE},
    services::{
        articles::{merge_unique, ArticleStage},
        normalizer::clean_content,
        providers::FeedReader,
    },
};

const TITLE_MAX_CHARS: usize = 300;

/// Primary article stage: the configured RSS/Atom sources of a category
///
/// Sources are read concurrently, each under its own timeout. A source that fails in any way
/// is logged and skipped.
pub struct FeedFetcher {
    reader: Arc<dyn FeedReader>,
    feeds: FeedTable,
    per_source_limit: usize,
    timeout: Duration,
    content_max_chars: usize,
}

impl FeedFetcher {
    pub fn new(
        reader: Arc<dyn FeedReader>,
        feeds: FeedTable,
        per_source_limit: usize,
        timeout: Duration,
        content_max_chars: usize,
    ) -> Self {
        Self {
            reader,
            feeds,
            per_source_limit,
            timeout,
            content_max_chars,
        }
    }

    /// All articles from the category's sources, in configured source order
    #[instrument(skip(self, category), fields(category = %category))]
    pub async fn fetch_category(&self, category: Category) -> Vec<Article> {
        let urls = self.feeds.get(&category).cloned().unwrap_or_default();
        if urls.is_empty() {
            tracing::warn!(category = %category, "No feeds configured for category");
            return Vec::new();
        }

        let batches = join_all(urls.iter().map(|url| self.fetch_source(category, url))).await;

        let mut articles = Vec::new();
        let mut failed = 0;
        for batch in batches {
            match batch {
                Some(batch) => merge_unique(&mut articles, batch, usize::MAX),
                None => failed += 1,
            }
        }

        tracing::info!(
            category = %category,
            sources = urls.len(),
            failed_sources = failed,
            count = articles.len(),
            "Feeds fetched"
        );

        articles
    }

    /// `None` when the source could not be read
    async fn fetch_source(&self, category: Category, url: &str) -> Option<Vec<Article>> {
        let feed = match tokio::time::timeout(self.timeout, self.reader.read_feed(url)).await {
            Ok(Ok(feed)) => feed,
            Ok(Err(e)) => {
                tracing::warn!(feed_url = %url, error = %e, "Skipping feed source");
                return None;
            }
            Err(_) => {
                tracing::warn!(
                    feed_url = %url,
                    timeout_secs = self.timeout.as_secs_f64(),
                    "Feed source timed out"
                );
                return None;
            }
        };

        let articles = feed_to_articles(
            feed,
            category,
            self.per_source_limit,
            self.content_max_chars,
        );
        tracing::debug!(feed_url = %url, count = articles.len(), "Feed source read");

        Some(articles)
    }
}

#[async_trait::async_trait]
impl ArticleStage for FeedFetcher {
    async fn fetch_articles(&self, category: Category, _wanted: usize) -> AppResult<Vec<Article>> {
        Ok(self.fetch_category(category).await)
    }

    fn name(&self) -> &'static str {
        "feeds"
    }
}

/// Normalizes one parsed feed into at most `limit` articles, newest first
///
/// Entries missing a title, link, or any readable content are dropped. Undated entries keep
/// their feed order after the dated ones.
pub(crate) fn feed_to_articles(
    feed: ParsedFeed,
    category: Category,
    limit: usize,
    content_max_chars: usize,
) -> Vec<Article> {
    let source = feed
        .title
        .as_deref()
        .map(|t| clean_content(t, TITLE_MAX_CHARS))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| UNKNOWN_SOURCE.to_string());

    let mut entries = feed.entries;
    entries.sort_by(newest_first);

    entries
        .into_iter()
        .filter_map(|entry| entry_to_article(entry, &source, category, content_max_chars))
        .take(limit)
        .collect()
}

fn newest_first(a: &FeedEntry, b: &FeedEntry) -> Ordering {
    match (a.published, b.published) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn entry_to_article(
    entry: FeedEntry,
    source: &str,
    category: Category,
    content_max_chars: usize,
) -> Option<Article> {
    let title = clean_content(entry.title.as_deref()?, TITLE_MAX_CHARS);
    let link = entry.link?.trim().to_string();
    let content = clean_content(entry.summary.as_deref().unwrap_or_default(), content_max_chars);

    if title.is_empty() || link.is_empty() || content.is_empty() {
        return None;
    }

    Some(Article::new(
        title,
        content,
        source.to_string(),
        link,
        category,
        entry.published,
    ))
}
