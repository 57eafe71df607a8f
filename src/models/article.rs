use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::Category;

pub const UNKNOWN_SOURCE: &str = "Unknown Source";

/// A normalized news article
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Article {
    /// Derived from the link, stable for the lifetime of a pool
    pub id: String,
    pub title: String,
    /// Plain text summary, bounded in length
    pub content: String,
    pub source: String,
    pub link: String,
    pub category: Category,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

impl Article {
    pub fn new(
        title: String,
        content: String,
        source: String,
        link: String,
        category: Category,
        published_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id: article_id(&link),
            title,
            content,
            source,
            link,
            category,
            published_at,
        }
    }
}

/// Short hex identifier for an article link
pub fn article_id(link: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(link.trim().as_bytes());
    hex::encode(&hasher.finalize()[..8])
}

/// Lowercased alphanumeric form of a title used for duplicate detection
pub fn normalize_title(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_article_id_is_stable() {
        let a = article_id("https://example.com/story");
        let b = article_id("https://example.com/story");
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
        assert_ne!(a, article_id("https://example.com/other"));
    }

    #[test]
    fn test_new_derives_id_from_link() {
        let article = Article::new(
            "Title".to_string(),
            "Body".to_string(),
            "Wire".to_string(),
            "https://example.com/1".to_string(),
            Category::World,
            None,
        );
        assert_eq!(article.id, article_id("https://example.com/1"));
    }

    #[test]
    fn test_normalize_title() {
        assert_eq!(
            normalize_title("  Breaking:  Markets RALLY! "),
            "breaking markets rally"
        );
    }
}
