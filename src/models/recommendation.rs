use serde::{Deserialize, Deserializer, Serialize};

use super::Article;

pub const MAX_RECOMMENDATIONS: usize = 5;

/// Reference article plus the candidates it may be matched against
#[derive(Debug, Clone)]
pub struct RecommendationRequest {
    pub reference: Article,
    pub candidates: Vec<Article>,
}

impl RecommendationRequest {
    /// Builds a request, dropping the reference (by link) from the pool
    pub fn new(reference: Article, pool: impl IntoIterator<Item = Article>) -> Self {
        let candidates = pool
            .into_iter()
            .filter(|a| a.link != reference.link)
            .collect();
        Self {
            reference,
            candidates,
        }
    }
}

/// A candidate selected by the AI service
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Recommendation {
    pub article: Article,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Ordered recommendations, at most [`MAX_RECOMMENDATIONS`], unique by link
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct RecommendationResult {
    pub recommendations: Vec<Recommendation>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecommendationOutcome {
    Found(RecommendationResult),
    /// Nothing usable could be extracted from the model output
    Unavailable { raw_response: String },
}

/// One entry of the model's JSON answer, before validation against the pool
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct RawRecommendation {
    #[serde(default, alias = "index", deserialize_with = "lenient_index")]
    pub id: Option<usize>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default, alias = "rationale")]
    pub reason: Option<String>,
}

impl RawRecommendation {
    /// True when the entry carries anything that can identify a candidate
    pub fn is_reference(&self) -> bool {
        self.id.is_some()
            || self.title.as_deref().is_some_and(|t| !t.trim().is_empty())
            || self.link.as_deref().is_some_and(|l| !l.trim().is_empty())
    }
}

/// Accepts `3`, `"3"` or `"ID: 3"` style indices
fn lenient_index<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_u64().map(|n| n as usize),
        Some(serde_json::Value::String(s)) => {
            let digits: String = s.chars().filter(|c| c.is_ascii_digit()).collect();
            digits.parse().ok()
        }
        _ => None,
    })
}
