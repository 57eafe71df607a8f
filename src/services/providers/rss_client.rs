/// RSS / Atom feed client
///
/// Fetches a feed document over HTTP and reduces it to [`ParsedFeed`]. RSS 2.0 is tried first,
/// then Atom. Missing optional fields (summary, date, even title or link) are tolerated here and
/// filtered later by the feed fetcher.
use chrono::{DateTime, Utc};
use reqwest::Client as HttpClient;
use std::time::Duration;
use tracing::instrument;

use crate::{
    error::{AppError, AppResult},
    models::{FeedEntry, ParsedFeed},
    services::providers::FeedReader,
};

const USER_AGENT: &str = "Mozilla/5.0 (compatible; newsmatch/0.1)";

#[derive(Clone)]
pub struct RssFeedClient {
    http_client: HttpClient,
}

impl RssFeedClient {
    pub fn new(timeout: Duration) -> Self {
        Self {
            http_client: HttpClient::builder()
                .timeout(timeout)
                .user_agent(USER_AGENT)
                .build()
                .unwrap_or_else(|_| HttpClient::new()),
        }
    }
}

#[async_trait::async_trait]
impl FeedReader for RssFeedClient {
    #[instrument(skip(self))]
    async fn read_feed(&self, url: &str) -> AppResult<ParsedFeed> {
        let response = self.http_client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(AppError::Feed(format!(
                "Feed {} returned status {}",
                url,
                response.status()
            )));
        }

        let content = response.bytes().await?;
        let feed = parse_feed(&content)
            .ok_or_else(|| AppError::Feed(format!("Failed to parse feed: {}", url)))?;

        tracing::debug!(
            feed_url = %url,
            entries = feed.entries.len(),
            "Feed parsed"
        );

        Ok(feed)
    }
}

/// Parses an RSS 2.0 or Atom document. `None` if it is neither.
pub fn parse_feed(content: &[u8]) -> Option<ParsedFeed> {
    if let Ok(channel) = rss::Channel::read_from(content) {
        return Some(parse_rss_channel(&channel));
    }

    if let Ok(atom_feed) = atom_syndication::Feed::read_from(content) {
        return Some(parse_atom_feed(&atom_feed));
    }

    None
}

pub(crate) fn parse_rss_channel(channel: &rss::Channel) -> ParsedFeed {
    let entries = channel
        .items()
        .iter()
        .map(|item| FeedEntry {
            title: non_empty(item.title()),
            link: non_empty(item.link()),
            summary: non_empty(item.description()).or_else(|| non_empty(item.content())),
            published: item.pub_date().and_then(parse_date),
        })
        .collect();

    ParsedFeed {
        title: non_empty(Some(channel.title())),
        entries,
    }
}

fn parse_atom_feed(atom_feed: &atom_syndication::Feed) -> ParsedFeed {
    let entries = atom_feed
        .entries()
        .iter()
        .map(|entry| {
            let link = entry
                .links()
                .iter()
                .find(|l| l.rel() == "alternate")
                .or_else(|| entry.links().first())
                .map(|l| l.href());

            let summary = non_empty(entry.summary().map(|s| s.as_str()))
                .or_else(|| non_empty(entry.content().and_then(|c| c.value())));

            let published = entry
                .published()
                .unwrap_or_else(|| entry.updated())
                .with_timezone(&Utc);

            FeedEntry {
                title: non_empty(Some(entry.title().as_str())),
                link: non_empty(link),
                summary,
                published: Some(published),
            }
        })
        .collect();

    ParsedFeed {
        title: non_empty(Some(atom_feed.title().as_str())),
        entries,
    }
}

/// Feeds use RFC 2822 but a fair number publish RFC 3339
fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(raw.trim())
        .or_else(|_| DateTime::parse_from_rfc3339(raw.trim()))
        .map(|d| d.with_timezone(&Utc))
        .ok()
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
