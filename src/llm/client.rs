use async_trait::async_trait;
use backoff::{future::retry, Error as BackoffError, ExponentialBackoff};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};

use crate::llm::types::*;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Sends the conversation plus tool schema to a language model.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;
}

pub struct HttpCompletionClient {
    http: Client,
    config: LlmConfig,
    api_key: String,
    max_elapsed: Duration,
}

impl HttpCompletionClient {
    pub fn new(config: LlmConfig, api_key: String) -> Result<Self, LlmError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| LlmError::Http(e.to_string()))?;

        Ok(Self { http, config, api_key, max_elapsed: Duration::from_secs(30) })
    }

    /// Cap the total time spent retrying transient failures.
    pub fn with_max_elapsed(mut self, max_elapsed: Duration) -> Self {
        self.max_elapsed = max_elapsed;
        self
    }

    fn headers(&self) -> Result<HeaderMap, LlmError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(&self.api_key).map_err(|_| LlmError::Http("API key is not a valid header value".into()))?,
        );
        headers.insert("anthropic-version", HeaderValue::from_static(ANTHROPIC_VERSION));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        // Add extra headers from config
        if let Some(obj) = self.config.extra_headers.as_object() {
            for (key, value) in obj {
                if let Some(val_str) = value.as_str() {
                    if let (Ok(header_name), Ok(header_value)) =
                        (HeaderName::from_bytes(key.as_bytes()), val_str.parse::<HeaderValue>())
                    {
                        headers.insert(header_name, header_value);
                    }
                }
            }
        }
        Ok(headers)
    }
}

#[async_trait]
impl CompletionClient for HttpCompletionClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        if self.api_key.is_empty() {
            return Err(LlmError::MissingApiKey);
        }

        let body = MessagesApiRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            system: &request.system,
            messages: &request.messages,
            tools: &request.tools,
        };
        let url = format!("{}/v1/messages", self.config.base_url.trim_end_matches('/'));
        let headers = self.headers()?;

        debug!(model = %self.config.model, messages = request.messages.len(), "sending completion request");

        let operation = || async {
            let response = self
                .http
                .post(&url)
                .headers(headers.clone())
                .json(&body)
                .send()
                .await
                .map_err(|e| BackoffError::transient(LlmError::Http(e.to_string())))?;

            let status = response.status();

            if status.is_success() {
                let parsed: CompletionResponse = response
                    .json()
                    .await
                    .map_err(|e| BackoffError::permanent(LlmError::InvalidResponse(e.to_string())))?;
                Ok(parsed)
            } else {
                let error_text = response.text().await.unwrap_or_default();
                match status {
                    StatusCode::TOO_MANY_REQUESTS => {
                        warn!("completion endpoint rate limited; backing off");
                        Err(BackoffError::transient(LlmError::RateLimited))
                    }
                    StatusCode::UNAUTHORIZED => Err(BackoffError::permanent(LlmError::Api {
                        status: 401,
                        message: "Invalid API key".to_string(),
                    })),
                    _ if status.as_u16() >= 500 => Err(BackoffError::transient(LlmError::Api {
                        status: status.as_u16(),
                        message: error_text,
                    })),
                    _ => Err(BackoffError::permanent(LlmError::Api {
                        status: status.as_u16(),
                        message: error_text,
                    })),
                }
            }
        };

        let backoff = ExponentialBackoff {
            initial_interval: Duration::from_millis(500),
            max_interval: Duration::from_secs(4),
            max_elapsed_time: Some(self.max_elapsed),
            ..Default::default()
        };

        retry(backoff, operation).await
    }
}
