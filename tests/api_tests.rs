use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use newsmatch::{
    db::Cache,
    error::{AppError, AppResult},
    models::{Article, Category, VideoEntry, VideoSearchFailure},
    routes::{create_router, AppState},
    services::{
        providers::{LanguageModel, VideoSearchProvider},
        ArticleService, ArticleStage, Recommender, VideoFinder, VideoQueryExtractor,
    },
};

// ============================================================================
// Fakes
// ============================================================================

struct FixedStage {
    articles: Vec<Article>,
    calls: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl ArticleStage for FixedStage {
    async fn fetch_articles(&self, category: Category, _wanted: usize) -> AppResult<Vec<Article>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .articles
            .iter()
            .filter(|a| a.category == category)
            .cloned()
            .collect())
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

/// Answers keyword prompts and recommendation prompts differently; `None` means unreachable
struct ScriptedModel {
    recommendations: Option<String>,
    keywords: Option<String>,
}

#[async_trait::async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, prompt: &str) -> AppResult<String> {
        let answer = if prompt.contains("video search engine") {
            &self.keywords
        } else {
            &self.recommendations
        };

        answer
            .clone()
            .ok_or_else(|| AppError::AiUnavailable("quota exceeded".to_string()))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

struct ScriptedVideos {
    failure: Option<VideoSearchFailure>,
}

#[async_trait::async_trait]
impl VideoSearchProvider for ScriptedVideos {
    async fn search_videos(&self, phrase: &str, max_results: usize) -> AppResult<Vec<VideoEntry>> {
        if let Some(failure) = &self.failure {
            return Err(AppError::VideoSearch(failure.clone()));
        }

        Ok((0..max_results.min(3))
            .map(|n| {
                let video_id = format!("{}-{}", phrase.replace(' ', "_"), n);
                VideoEntry {
                    link: format!("https://www.youtube.com/watch?v={}", video_id),
                    title: format!("{} #{}", phrase, n),
                    thumbnail_url: None,
                    channel: Some("News Channel".to_string()),
                    video_id,
                }
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

// ============================================================================
// Setup
// ============================================================================

fn article(n: usize) -> Article {
    Article::new(
        format!("Technology story {}", n),
        format!("Details about technology story {}", n),
        "Tech Wire".to_string(),
        format!("https://news.test/tech/{}", n),
        Category::Technology,
        None,
    )
}

struct Harness {
    articles: Vec<Article>,
    recommendations: Option<String>,
    keywords: Option<String>,
    video_failure: Option<VideoSearchFailure>,
}

impl Default for Harness {
    fn default() -> Self {
        Self {
            articles: (0..6).map(article).collect(),
            recommendations: Some(
                r#"[{"id": 0, "title": "Technology story 1", "link": "https://news.test/tech/1"}]"#
                    .to_string(),
            ),
            keywords: Some(r#"["technology story", "tech wire"]"#.to_string()),
            video_failure: None,
        }
    }
}

impl Harness {
    fn server(self) -> (TestServer, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let stage = Arc::new(FixedStage {
            articles: self.articles,
            calls: calls.clone(),
        });
        let model = Arc::new(ScriptedModel {
            recommendations: self.recommendations,
            keywords: self.keywords,
        });
        let videos = Arc::new(ScriptedVideos {
            failure: self.video_failure,
        });

        let state = AppState::new(
            ArticleService::new(vec![stage as Arc<dyn ArticleStage>], 5, Cache::disabled().0),
            Recommender::new(model.clone(), 30, 800),
            VideoQueryExtractor::new(model, 800),
            VideoFinder::new(videos, 5),
        );

        let server = TestServer::new(create_router(Arc::new(state))).unwrap();
        (server, calls)
    }
}

fn selection(article_id: &str) -> Value {
    json!({ "category": "technology", "article_id": article_id })
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let (server, _) = Harness::default().server();
    let response = server.get("/health").await;
    response.assert_status_ok();
    response.assert_json(&json!({ "status": "healthy" }));
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let (server, _) = Harness::default().server();

    let response = server
        .get("/health")
        .add_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static("trace-42"),
        )
        .await;
    assert_eq!(response.header("x-request-id"), "trace-42");

    let response = server.get("/health").await;
    assert!(!response.header("x-request-id").is_empty());
}

#[tokio::test]
async fn test_list_categories() {
    let (server, _) = Harness::default().server();
    let response = server.get("/api/v1/categories").await;
    response.assert_status_ok();

    let categories: Vec<Value> = response.json();
    assert_eq!(categories.len(), 7);
    assert_eq!(categories[1], json!({ "id": "technology", "name": "Technology" }));
}

#[tokio::test]
async fn test_articles_for_category() {
    let (server, _) = Harness::default().server();
    let response = server.get("/api/v1/categories/Technology/articles").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["category"], "technology");
    assert_eq!(body["articles"].as_array().unwrap().len(), 6);
    assert_eq!(body["articles"][0]["source"], "Tech Wire");
    assert!(body.get("message").is_none());
}

#[tokio::test]
async fn test_empty_category_reports_no_articles() {
    let (server, _) = Harness::default().server();
    let response = server.get("/api/v1/categories/sports/articles").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["articles"], json!([]));
    assert_eq!(body["message"], "No articles available");
}

#[tokio::test]
async fn test_unknown_category_is_bad_request() {
    let (server, _) = Harness::default().server();
    let response = server.get("/api/v1/categories/astrology/articles").await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_recommendations_use_session_pool() {
    let (server, calls) = Harness::default().server();
    server
        .get("/api/v1/categories/technology/articles")
        .await
        .assert_status_ok();

    let reference = article(0);
    let response = server
        .post("/api/v1/recommendations")
        .json(&selection(&reference.id))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["status"], "found");
    assert_eq!(body["reference"]["link"], reference.link);
    assert_eq!(body["recommendations"].as_array().unwrap().len(), 1);
    assert_eq!(
        body["recommendations"][0]["article"]["link"],
        "https://news.test/tech/1"
    );
    // The pool loaded for the article list is reused
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_recommendations_unknown_article() {
    let (server, _) = Harness::default().server();
    let response = server
        .post("/api/v1/recommendations")
        .json(&selection("0000000000000000"))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_recommendations_unparseable_answer() {
    let (server, _) = Harness {
        recommendations: Some("Sorry, nothing comes to mind.".to_string()),
        ..Harness::default()
    }
    .server();

    let response = server
        .post("/api/v1/recommendations")
        .json(&selection(&article(2).id))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["status"], "no_recommendations");
    assert_eq!(body["recommendations"], json!([]));
}

#[tokio::test]
async fn test_recommendations_ai_unavailable() {
    let (server, _) = Harness {
        recommendations: None,
        ..Harness::default()
    }
    .server();

    let response = server
        .post("/api/v1/recommendations")
        .json(&selection(&article(2).id))
        .await;
    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);

    let body: Value = response.json();
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("AI service unavailable"));
}

#[tokio::test]
async fn test_videos_found() {
    let (server, _) = Harness::default().server();
    let response = server
        .post("/api/v1/videos")
        .json(&selection(&article(3).id))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["status"], "found");
    assert_eq!(body["keyword_origin"], "model");
    assert_eq!(body["keywords"], json!(["technology story", "tech wire"]));
    assert_eq!(body["videos"].as_array().unwrap().len(), 5);
    assert!(body.get("failure").is_none());
}

#[tokio::test]
async fn test_videos_with_heuristic_keywords_and_quota_failure() {
    let (server, _) = Harness {
        keywords: None,
        video_failure: Some(VideoSearchFailure::QuotaExceeded),
        ..Harness::default()
    }
    .server();

    let response = server
        .post("/api/v1/videos")
        .json(&selection(&article(4).id))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["status"], "video_search_unavailable");
    assert_eq!(body["keyword_origin"], "heuristic");
    assert_eq!(body["failure"]["reason"], "quota_exceeded");
    assert_eq!(body["videos"], json!([]));
    assert_eq!(
        body["manual_search_url"],
        "https://www.youtube.com/results?search_query=technology+story"
    );
}
