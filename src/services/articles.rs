use std::{collections::HashSet, sync::Arc};
use tracing::instrument;

use crate::{
    db::{Cache, CacheKey},
    error::AppResult,
    models::{normalize_title, Article, Category},
};

const ARTICLES_CACHE_TTL: u64 = 3600; // 1 hour

/// One way of getting articles for a category
///
/// Stages are tried in order until the pool is large enough; each is told how many articles
/// are still missing, though it may return more.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ArticleStage: Send + Sync {
    async fn fetch_articles(&self, category: Category, wanted: usize) -> AppResult<Vec<Article>>;

    fn name(&self) -> &'static str;
}

/// Builds the article pool for a category through an ordered fallback chain
pub struct ArticleService {
    stages: Vec<Arc<dyn ArticleStage>>,
    min_articles: usize,
    cache: Cache,
}

impl ArticleService {
    pub fn new(stages: Vec<Arc<dyn ArticleStage>>, min_articles: usize, cache: Cache) -> Self {
        Self {
            stages,
            min_articles,
            cache,
        }
    }

    /// Best-effort pool for `category`, possibly empty
    ///
    /// Never fails: a stage that errors is logged and the chain moves on.
    pub async fn articles_for(&self, category: Category) -> Vec<Article> {
        let key = CacheKey::Articles(category);
        match self.cache.get_from_cache::<Vec<Article>>(&key).await {
            Ok(Some(pool)) if !pool.is_empty() => {
                tracing::debug!(key = %key, count = pool.len(), "Cache hit");
                return pool;
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, key = %key, "Cache read failed, treating as miss"),
        }

        let pool = self.run_chain(category).await;
        // An empty pool is never cached
        if !pool.is_empty() {
            self.cache.set_in_background(&key, &pool, ARTICLES_CACHE_TTL);
        }
        pool
    }

    #[instrument(skip(self, category), fields(category = %category))]
    async fn run_chain(&self, category: Category) -> Vec<Article> {
        let mut pool: Vec<Article> = Vec::new();

        for stage in &self.stages {
            if pool.len() >= self.min_articles {
                break;
            }

            let wanted = self.min_articles - pool.len();
            match stage.fetch_articles(category, wanted).await {
                Ok(batch) => {
                    let before = pool.len();
                    merge_unique(&mut pool, batch, usize::MAX);
                    tracing::info!(
                        category = %category,
                        stage = stage.name(),
                        added = pool.len() - before,
                        count = pool.len(),
                        "Article stage completed"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        category = %category,
                        stage = stage.name(),
                        error = %e,
                        "Article stage failed"
                    );
                }
            }
        }

        if pool.len() < self.min_articles {
            tracing::warn!(
                category = %category,
                count = pool.len(),
                min_articles = self.min_articles,
                "Article pool below threshold after all stages"
            );
        }

        pool
    }
}

/// Appends articles whose link and normalized title are not yet in `pool`, up to `cap` total
pub(crate) fn merge_unique(pool: &mut Vec<Article>, incoming: Vec<Article>, cap: usize) {
    let mut links: HashSet<String> = pool.iter().map(|a| a.link.clone()).collect();
    let mut titles: HashSet<String> = pool.iter().map(|a| normalize_title(&a.title)).collect();

    for article in incoming {
        if pool.len() >= cap {
            break;
        }

        let title = normalize_title(&article.title);
        if links.contains(&article.link) || titles.contains(&title) {
            continue;
        }

        links.insert(article.link.clone());
        titles.insert(title);
        pool.push(article);
    }
}
