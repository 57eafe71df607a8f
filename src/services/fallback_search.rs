use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{Article, Category, SearchHit, UNKNOWN_SOURCE},
    services::{articles::ArticleStage, normalizer::clean_content, providers::NewsSearchProvider},
};

/// Secondary article stage: free-text news search on the category's search term
///
/// Asks for at least `page_size` hits even when fewer articles are missing, since some hits
/// usually repeat stories the pool already holds.
pub struct FallbackSearch {
    provider: Arc<dyn NewsSearchProvider>,
    page_size: usize,
    content_max_chars: usize,
}

impl FallbackSearch {
    pub fn new(
        provider: Arc<dyn NewsSearchProvider>,
        page_size: usize,
        content_max_chars: usize,
    ) -> Self {
        Self {
            provider,
            page_size,
            content_max_chars,
        }
    }

    fn hit_to_article(&self, hit: SearchHit, category: Category) -> Option<Article> {
        let title = clean_content(&hit.title, self.content_max_chars);
        let link = hit.link.trim().to_string();
        if title.is_empty() || link.is_empty() {
            return None;
        }

        // Search snippets are often empty or just the headline again
        let snippet = clean_content(&hit.snippet, self.content_max_chars);
        let content = if snippet.is_empty() {
            title.clone()
        } else {
            snippet
        };

        let source = hit
            .source
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_SOURCE.to_string());

        Some(Article::new(
            title,
            content,
            source,
            link,
            category,
            hit.published,
        ))
    }
}

#[async_trait::async_trait]
impl ArticleStage for FallbackSearch {
    async fn fetch_articles(&self, category: Category, wanted: usize) -> AppResult<Vec<Article>> {
        let term = category.search_term();
        let limit = wanted.max(self.page_size).max(1);
        let hits = self.provider.search_news(&term, limit).await?;

        tracing::info!(
            category = %category,
            query = %term,
            provider = self.provider.name(),
            hits = hits.len(),
            "Fallback search completed"
        );

        Ok(hits
            .into_iter()
            .filter_map(|hit| self.hit_to_article(hit, category))
            .collect())
    }

    fn name(&self) -> &'static str {
        "search"
    }
}
