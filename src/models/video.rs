use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Which strategy produced a set of keyword phrases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeywordOrigin {
    /// Structured JSON answer from the AI service
    Model,
    /// AI answer split line by line
    FreeText,
    /// Derived locally from the article title
    Heuristic,
}

/// Keyword phrases ranked by preference, primary first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoQuery {
    pub keywords: Vec<String>,
    pub origin: KeywordOrigin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoEntry {
    pub video_id: String,
    pub title: String,
    pub thumbnail_url: Option<String>,
    pub link: String,
    #[serde(default)]
    pub channel: Option<String>,
}

/// Why the video search could not be completed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum VideoSearchFailure {
    Authentication,
    QuotaExceeded,
    Network(String),
    Api(String),
}

impl Display for VideoSearchFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VideoSearchFailure::Authentication => write!(f, "authentication rejected"),
            VideoSearchFailure::QuotaExceeded => write!(f, "quota exceeded"),
            VideoSearchFailure::Network(msg) => write!(f, "network error: {}", msg),
            VideoSearchFailure::Api(msg) => write!(f, "API error: {}", msg),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VideoResult {
    pub videos: Vec<VideoEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<VideoSearchFailure>,
    /// Link to run the search by hand, set when the search failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manual_search_url: Option<String>,
}
