/// Gemini `generateContent` provider
///
/// Sends a single text prompt and returns the concatenated text of the first candidate. Every
/// failure to get an answer (transport, timeout, auth, quota) becomes
/// [`AppError::AiUnavailable`]; a blocked or empty candidate is returned as empty text.
use reqwest::{Client as HttpClient, StatusCode};
use std::time::Duration;
use tracing::instrument;

use crate::{
    error::{AppError, AppResult},
    models::{GeminiRequest, GeminiResponse},
    services::providers::LanguageModel,
};

#[derive(Clone)]
pub struct GeminiProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    model: String,
}

impl GeminiProvider {
    pub fn new(api_key: String, api_url: String, model: String, timeout: Duration) -> Self {
        Self {
            http_client: HttpClient::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| HttpClient::new()),
            api_key,
            api_url,
            model,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.api_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait::async_trait]
impl LanguageModel for GeminiProvider {
    #[instrument(skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
    async fn complete(&self, prompt: &str) -> AppResult<String> {
        let response = self
            .http_client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&GeminiRequest::from_prompt(prompt))
            .send()
            .await
            .map_err(|e| AppError::AiUnavailable(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %body, "Gemini request rejected");
            return Err(AppError::AiUnavailable(match status {
                StatusCode::TOO_MANY_REQUESTS => "quota exceeded".to_string(),
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    "credentials rejected".to_string()
                }
                _ => format!("Gemini returned status {}", status),
            }));
        }

        let response_text = response
            .text()
            .await
            .map_err(|e| AppError::AiUnavailable(e.without_url().to_string()))?;
        tracing::debug!(response = %response_text, "Raw Gemini response");

        let parsed: GeminiResponse = serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                response = %response_text,
                "Failed to deserialize Gemini response"
            );
            AppError::AiUnavailable(format!("Unreadable Gemini response: {}", e))
        })?;

        let text = parsed.text();
        if text.trim().is_empty() {
            tracing::warn!("Gemini returned no text");
        }

        Ok(text)
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint() {
        let provider = GeminiProvider::new(
            "key".to_string(),
            "https://generativelanguage.googleapis.com/v1beta/".to_string(),
            "gemini-1.5-flash".to_string(),
            Duration::from_secs(5),
        );
        assert_eq!(
            provider.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_value(GeminiRequest::from_prompt("hello")).unwrap();
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hello");
    }

    #[tokio::test]
    async fn test_transport_error_hides_api_key() {
        let provider = GeminiProvider::new(
            "SECRETKEY123".to_string(),
            "http://127.0.0.1:1".to_string(),
            "m".to_string(),
            Duration::from_secs(2),
        );

        match provider.complete("hi").await {
            Err(AppError::AiUnavailable(reason)) => {
                assert!(!reason.contains("SECRETKEY123"), "key leaked: {}", reason);
                assert!(!AppError::AiUnavailable(reason).to_string().contains("SECRETKEY123"));
            }
            other => panic!("expected AiUnavailable, got {:?}", other),
        }
    }
}
