use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

mod article;
mod category;
mod recommendation;
mod video;

pub use article::{article_id, normalize_title, Article, UNKNOWN_SOURCE};
pub use category::{default_feed_table, Category, FeedTable};
pub use recommendation::{
    RawRecommendation, Recommendation, RecommendationOutcome, RecommendationRequest,
    RecommendationResult, MAX_RECOMMENDATIONS,
};
pub use video::{KeywordOrigin, VideoEntry, VideoQuery, VideoResult, VideoSearchFailure};

// ============================================================================
// Feed Types
// ============================================================================

/// A feed document reduced to the fields the pipeline uses
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedFeed {
    pub title: Option<String>,
    pub entries: Vec<FeedEntry>,
}

/// One RSS item or Atom entry. Every field is optional in the wild.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedEntry {
    pub title: Option<String>,
    pub link: Option<String>,
    /// Raw summary or content, may contain markup
    pub summary: Option<String>,
    pub published: Option<DateTime<Utc>>,
}

/// Result from the fallback news search endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub link: String,
    pub snippet: String,
    pub source: Option<String>,
    pub published: Option<DateTime<Utc>>,
}

// ============================================================================
// Gemini API Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiPart {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiContent {
    #[serde(default)]
    pub parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
pub struct GeminiRequest {
    pub contents: Vec<GeminiContent>,
}

impl GeminiRequest {
    pub fn from_prompt(prompt: &str) -> Self {
        Self {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: Some(prompt.to_string()),
                }],
            }],
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GeminiCandidate {
    #[serde(default)]
    pub content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
pub struct GeminiResponse {
    #[serde(default)]
    pub candidates: Vec<GeminiCandidate>,
}

impl GeminiResponse {
    /// Text parts of the first candidate, concatenated
    pub fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default()
    }
}

// ============================================================================
// YouTube Data API Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct YouTubeSearchResponse {
    #[serde(default)]
    pub items: Vec<YouTubeSearchItem>,
}

#[derive(Debug, Deserialize)]
pub struct YouTubeSearchItem {
    pub id: YouTubeItemId,
    pub snippet: Option<YouTubeSnippet>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YouTubeItemId {
    #[serde(default)]
    pub video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YouTubeSnippet {
    pub title: String,
    #[serde(default)]
    pub channel_title: Option<String>,
    #[serde(default)]
    pub thumbnails: YouTubeThumbnails,
}

#[derive(Debug, Default, Deserialize)]
pub struct YouTubeThumbnails {
    #[serde(default)]
    pub high: Option<YouTubeThumbnail>,
    #[serde(default)]
    pub medium: Option<YouTubeThumbnail>,
    #[serde(default)]
    pub default: Option<YouTubeThumbnail>,
}

#[derive(Debug, Deserialize)]
pub struct YouTubeThumbnail {
    pub url: String,
}

impl YouTubeSearchItem {
    /// Converts a search hit into a video entry. Channel and playlist hits yield `None`.
    pub fn into_video_entry(self) -> Option<VideoEntry> {
        let video_id = self.id.video_id?;
        let snippet = self.snippet?;
        let thumbnails = snippet.thumbnails;
        let thumbnail_url = thumbnails
            .high
            .or(thumbnails.medium)
            .or(thumbnails.default)
            .map(|t| t.url);

        Some(VideoEntry {
            link: format!("https://www.youtube.com/watch?v={}", video_id),
            video_id,
            title: snippet.title,
            thumbnail_url,
            channel: snippet.channel_title,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct YouTubeErrorResponse {
    pub error: YouTubeError,
}

#[derive(Debug, Deserialize)]
pub struct YouTubeError {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub errors: Vec<YouTubeErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub struct YouTubeErrorDetail {
    #[serde(default)]
    pub reason: String,
}
