use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::core::{
    config::AppConfig,
    errors::{AppError, AppResult},
    retry::{with_retry, RetryPolicy},
};
use crate::providers::{ensure_success, into_byte_stream, ByteStream};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct InsightRequest {
    pub selected_text: String,
    #[serde(rename = "currPDFName")]
    pub current_document_name: String,
    pub summaries: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct GuideRequest {
    pub summaries: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PodcastRequest {
    pub summaries: String,
}

/// The generation backend. Text endpoints answer with an unframed UTF-8
/// byte stream; the podcast endpoint answers with one audio payload.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    async fn stream_insights(&self, request: &InsightRequest) -> AppResult<ByteStream>;

    async fn stream_guide(&self, request: &GuideRequest) -> AppResult<ByteStream>;

    async fn generate_podcast(&self, request: &PodcastRequest) -> AppResult<Vec<u8>>;
}

#[derive(Debug, Clone)]
pub struct HttpInferenceClient {
    http: reqwest::Client,
    base: String,
    retry: RetryPolicy,
    podcast_timeout: Duration,
}

impl HttpInferenceClient {
    pub fn new(config: &AppConfig) -> AppResult<Self> {
        // A client-wide timeout would also cover reading the stream body.
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|err| AppError::Network(err.to_string()))?;
        Ok(Self {
            http,
            base: config.inference_base.clone(),
            retry: RetryPolicy::from_config(config),
            podcast_timeout: config.request_timeout * 5,
        })
    }

    async fn open_stream<B: Serialize + Sync>(&self, path: &str, body: &B) -> AppResult<ByteStream> {
        let url = format!("{}{}", self.base, path);
        let url = url.as_str();
        let response = with_retry(&self.retry, path, move || async move {
            let response = self.http.post(url).json(body).send().await?;
            ensure_success(response).await
        })
        .await?;
        Ok(into_byte_stream(response))
    }
}

#[async_trait]
impl InferenceClient for HttpInferenceClient {
    async fn stream_insights(&self, request: &InsightRequest) -> AppResult<ByteStream> {
        self.open_stream("/insights", request).await
    }

    async fn stream_guide(&self, request: &GuideRequest) -> AppResult<ByteStream> {
        self.open_stream("/guide", request).await
    }

    async fn generate_podcast(&self, request: &PodcastRequest) -> AppResult<Vec<u8>> {
        let url = format!("{}/podcast", self.base);
        // Single attempt; every call synthesizes a new episode.
        let response = self
            .http
            .post(url)
            .timeout(self.podcast_timeout)
            .json(request)
            .send()
            .await?;
        let response = ensure_success(response).await?;
        let audio = response.bytes().await?;
        if audio.is_empty() {
            return Err(AppError::InvalidPayload("podcast response was empty".to_string()));
        }
        Ok(audio.to_vec())
    }
}
