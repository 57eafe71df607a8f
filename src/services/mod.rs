pub mod articles;
pub mod fallback_search;
pub mod feed_fetcher;
pub mod normalizer;
pub mod providers;
pub mod recommendations;
pub mod response_parser;
pub mod video_finder;
pub mod video_query;

pub use articles::{ArticleService, ArticleStage};
pub use fallback_search::FallbackSearch;
pub use feed_fetcher::FeedFetcher;
pub use recommendations::Recommender;
pub use video_finder::VideoFinder;
pub use video_query::VideoQueryExtractor;
