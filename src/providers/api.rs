use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::COOKIE;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::core::{
    config::AppConfig,
    errors::{AppError, AppResult},
    retry::{with_retry, RetryPolicy},
    types::{
        DocumentMetadata, FaqEntry, HeadingRecord, HeadingsResponse, InsightContext,
        RelevanceResponse, RelevanceResult,
    },
};
use crate::providers::{ensure_success, into_byte_stream, ByteStream};

/// Persistence/auth collaborator: the web application's JSON routes.
#[async_trait]
pub trait DocumentApi: Send + Sync {
    async fn get_document_metadata(&self, document_id: &str) -> AppResult<DocumentMetadata>;

    async fn get_headings(&self, document_id: &str) -> AppResult<Vec<HeadingRecord>>;

    async fn get_file_bytes(&self, document_id: &str) -> AppResult<ByteStream>;

    async fn search_relevance(&self, folder_id: &str, query: &str) -> AppResult<RelevanceResult>;

    async fn get_summary(&self, document_id: &str) -> AppResult<String>;

    async fn get_faq(&self, document_id: &str) -> AppResult<Vec<FaqEntry>>;

    /// Summaries of every document in the same folder, plus this document's name.
    async fn get_insight_context(&self, document_id: &str) -> AppResult<InsightContext>;

    async fn get_folder_summaries(&self, folder_id: &str) -> AppResult<String>;

    /// Where the viewer should fetch the document's bytes from.
    fn file_location(&self, document_id: &str) -> String;
}

#[derive(Debug, Deserialize)]
struct SummaryEnvelope {
    success: bool,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default, rename = "currPDFName")]
    current_document_name: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FaqEnvelope {
    success: bool,
    #[serde(default)]
    faq: Option<Vec<FaqEntry>>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FolderSummariesEnvelope {
    success: bool,
    #[serde(default)]
    summaries: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

fn envelope_error(what: &str, error: Option<String>) -> AppError {
    let message = error.unwrap_or_else(|| format!("{what} unavailable"));
    if message.to_ascii_lowercase().contains("not found") {
        AppError::NotFound(message)
    } else {
        AppError::Upstream {
            status: 200,
            body: message,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpDocumentApi {
    http: reqwest::Client,
    base: String,
    token: Option<String>,
    retry: RetryPolicy,
}

impl HttpDocumentApi {
    pub fn new(config: &AppConfig, token: Option<String>) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|err| AppError::Network(err.to_string()))?;
        Ok(Self {
            http,
            base: config.api_base.clone(),
            token,
            retry: RetryPolicy::from_config(config),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    fn with_auth(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => builder.header(COOKIE, format!("token={token}")),
            None => builder,
        }
    }

    async fn get_json<T: DeserializeOwned + Send>(&self, path: &str) -> AppResult<T> {
        let url = self.url(path);
        let url = url.as_str();
        with_retry(&self.retry, path, move || async move {
            let response = self.with_auth(self.http.get(url)).send().await?;
            let response = ensure_success(response).await?;
            Ok::<T, AppError>(response.json::<T>().await?)
        })
        .await
    }

    async fn post_json<T: DeserializeOwned + Send>(&self, path: &str, body: &serde_json::Value) -> AppResult<T> {
        let url = self.url(path);
        let url = url.as_str();
        with_retry(&self.retry, path, move || async move {
            let response = self.with_auth(self.http.post(url)).json(body).send().await?;
            let response = ensure_success(response).await?;
            Ok::<T, AppError>(response.json::<T>().await?)
        })
        .await
    }
}

#[async_trait]
impl DocumentApi for HttpDocumentApi {
    async fn get_document_metadata(&self, document_id: &str) -> AppResult<DocumentMetadata> {
        self.get_json(&format!("/api/pdfs/{document_id}")).await
    }

    async fn get_headings(&self, document_id: &str) -> AppResult<Vec<HeadingRecord>> {
        let response: HeadingsResponse = self
            .get_json(&format!("/api/pdfs/{document_id}/headings"))
            .await?;
        Ok(response.headings)
    }

    async fn get_file_bytes(&self, document_id: &str) -> AppResult<ByteStream> {
        let url = self.file_location(document_id);
        let url = url.as_str();
        let response = with_retry(&self.retry, "file", move || async move {
            let response = self.with_auth(self.http.get(url)).send().await?;
            ensure_success(response).await
        })
        .await?;
        Ok(into_byte_stream(response))
    }

    async fn search_relevance(&self, folder_id: &str, query: &str) -> AppResult<RelevanceResult> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput("query cannot be empty".to_string()));
        }
        let body = serde_json::json!({ "folderId": folder_id, "query": query });
        let response: RelevanceResponse = self.post_json("/api/relevance", &body).await?;
        Ok(response.combined)
    }

    async fn get_summary(&self, document_id: &str) -> AppResult<String> {
        let envelope: SummaryEnvelope = self
            .get_json(&format!("/api/pdfs/{document_id}/summaries"))
            .await?;
        match envelope {
            SummaryEnvelope {
                success: true,
                summary: Some(summary),
                ..
            } => Ok(summary),
            other => Err(envelope_error("summary", other.error)),
        }
    }

    async fn get_faq(&self, document_id: &str) -> AppResult<Vec<FaqEntry>> {
        let envelope: FaqEnvelope = self
            .get_json(&format!("/api/pdfs/{document_id}/faqs"))
            .await?;
        match envelope {
            FaqEnvelope {
                success: true,
                faq: Some(faq),
                ..
            } => Ok(faq),
            other => Err(envelope_error("faq", other.error)),
        }
    }

    async fn get_insight_context(&self, document_id: &str) -> AppResult<InsightContext> {
        let envelope: SummaryEnvelope = self
            .get_json(&format!("/api/pdfs/{document_id}/summaries?get_all=true"))
            .await?;
        match envelope {
            SummaryEnvelope {
                success: true,
                summary: Some(summaries),
                current_document_name,
                ..
            } => Ok(InsightContext {
                summaries,
                current_document_name: current_document_name.unwrap_or_default(),
            }),
            other => Err(envelope_error("summaries", other.error)),
        }
    }

    async fn get_folder_summaries(&self, folder_id: &str) -> AppResult<String> {
        let envelope: FolderSummariesEnvelope = self
            .post_json(
                &format!("/api/folders/{folder_id}/summaries"),
                &serde_json::json!({}),
            )
            .await?;
        match envelope {
            FolderSummariesEnvelope {
                success: true,
                summaries: Some(summaries),
                ..
            } => Ok(summaries),
            other => Err(envelope_error("folder summaries", other.error)),
        }
    }

    fn file_location(&self, document_id: &str) -> String {
        self.url(&format!("/api/pdfs/{document_id}/file"))
    }
}
