use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;

use crate::{
    config::Config,
    db::Cache,
    error::{AppError, AppResult},
    models::{Article, Category},
    services::{
        providers::{GeminiProvider, GoogleNewsProvider, RssFeedClient, YouTubeProvider},
        ArticleService, ArticleStage, FallbackSearch, FeedFetcher, Recommender, VideoFinder,
        VideoQueryExtractor,
    },
};

/// Shared application state
///
/// Everything except `pools` is read-only after startup. `pools` holds the last pool served
/// per category so later selections resolve against the articles the user actually saw.
pub struct AppState {
    pub articles: ArticleService,
    pub recommender: Recommender,
    pub video_queries: VideoQueryExtractor,
    pub video_finder: VideoFinder,
    pub pools: RwLock<HashMap<Category, Vec<Article>>>,
}

impl AppState {
    pub fn new(
        articles: ArticleService,
        recommender: Recommender,
        video_queries: VideoQueryExtractor,
        video_finder: VideoFinder,
    ) -> Self {
        Self {
            articles,
            recommender,
            video_queries,
            video_finder,
            pools: RwLock::new(HashMap::new()),
        }
    }

    /// Wires the production providers from configuration
    pub fn from_config(config: &Config, cache: Cache) -> anyhow::Result<Self> {
        let feeds = config.feed_table()?;

        let feed_reader = Arc::new(RssFeedClient::new(config.feed_timeout()));
        let news_search = Arc::new(GoogleNewsProvider::new(
            cache.clone(),
            config.google_news_url.clone(),
            config.feed_timeout(),
        ));
        let gemini = Arc::new(GeminiProvider::new(
            config.gemini_api_key.clone(),
            config.gemini_api_url.clone(),
            config.gemini_model.clone(),
            config.ai_timeout(),
        ));
        let youtube = Arc::new(YouTubeProvider::new(
            cache.clone(),
            config.youtube_api_key.clone(),
            config.youtube_api_url.clone(),
            config.video_timeout(),
        ));

        let stages: Vec<Arc<dyn ArticleStage>> = vec![
            Arc::new(FeedFetcher::new(
                feed_reader,
                feeds,
                config.per_source_limit,
                config.feed_timeout(),
                config.content_max_chars,
            )),
            Arc::new(FallbackSearch::new(
                news_search,
                config.min_articles,
                config.content_max_chars,
            )),
        ];

        Ok(Self::new(
            ArticleService::new(stages, config.min_articles, cache),
            Recommender::new(
                gemini.clone(),
                config.max_candidates,
                config.content_max_chars,
            ),
            VideoQueryExtractor::new(gemini, config.content_max_chars),
            VideoFinder::new(youtube, config.video_target),
        ))
    }

    /// Fetches a fresh pool for `category` and makes it the session pool
    pub async fn refresh_pool(&self, category: Category) -> Vec<Article> {
        let pool = self.articles.articles_for(category).await;
        self.pools.write().await.insert(category, pool.clone());
        pool
    }

    /// Looks up an article of the category's session pool, loading the pool if needed
    ///
    /// Returns the article together with the pool it came from.
    pub async fn select_article(
        &self,
        category: Category,
        article_id: &str,
    ) -> AppResult<(Article, Vec<Article>)> {
        let cached = self.pools.read().await.get(&category).cloned();
        let pool = match cached {
            Some(pool) => pool,
            None => self.refresh_pool(category).await,
        };

        let article = pool
            .iter()
            .find(|a| a.id == article_id)
            .cloned()
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Article {} not found in {} articles",
                    article_id, category
                ))
            })?;

        Ok((article, pool))
    }
}
