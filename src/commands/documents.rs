use std::path::{Path, PathBuf};

use futures::StreamExt;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tokio::io::AsyncWriteExt;

use crate::{
    core::{
        errors::{AppError, AppResult},
        types::{DocumentMetadata, FaqEntry, RelatedDocument, RelevanceResponse, RelevanceResult},
    },
    outline::flatten,
    session::{ApplyReport, OpenOutcome},
    AppState,
};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlineEntry {
    pub depth: usize,
    pub id: String,
    pub text: String,
    pub level: String,
    pub page: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlineResponse {
    pub document: Option<DocumentMetadata>,
    pub entries: Vec<OutlineEntry>,
    /// 1-based page the viewer moved to, when a heading was selected.
    pub current_page: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotateResponse {
    pub report: Option<ApplyReport>,
    pub related_documents: Vec<RelatedDocument>,
    pub annotations: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadResponse {
    pub path: PathBuf,
    pub bytes: u64,
    pub checksum: String,
}

pub(crate) async fn ensure_open(state: &AppState, document_id: &str) -> AppResult<()> {
    match state.controller.open_document(document_id).await? {
        OpenOutcome::Ready | OpenOutcome::AlreadyOpen => Ok(()),
        OpenOutcome::Superseded => Err(AppError::InvalidState(format!(
            "document {document_id} was replaced while loading"
        ))),
        OpenOutcome::InProgress => Err(AppError::InvalidState(format!(
            "document {document_id} is still loading"
        ))),
    }
}

fn annotate_response(state: &AppState, report: Option<ApplyReport>) -> AnnotateResponse {
    AnnotateResponse {
        report,
        related_documents: state.controller.snapshot().related_documents,
        annotations: state
            .viewers
            .state()
            .annotations
            .iter()
            .map(|annotation| annotation.to_viewer_json())
            .collect(),
    }
}

pub async fn open_outline(state: &AppState, document_id: &str, heading_id: Option<&str>) -> AppResult<OutlineResponse> {
    ensure_open(state, document_id).await?;
    let current_page = match heading_id {
        Some(id) => Some(state.controller.select_heading(id).await?),
        None => None,
    };

    let snapshot = state.controller.snapshot();
    let entries = flatten(&snapshot.outline)
        .into_iter()
        .map(|(depth, node)| OutlineEntry {
            depth,
            id: node.heading.id.clone(),
            text: node.heading.text.clone(),
            level: node.heading.level.clone(),
            page: node.heading.page,
        })
        .collect();
    Ok(OutlineResponse {
        document: snapshot.document,
        entries,
        current_page,
    })
}

/// Highlights a relevance result stored on disk, either the bare
/// `{docId: {...}}` map or the `{"combined": {...}}` envelope.
pub async fn annotate_from_file(state: &AppState, document_id: &str, path: &Path) -> AppResult<AnnotateResponse> {
    let raw = tokio::fs::read(path).await?;
    let result = match serde_json::from_slice::<RelevanceResponse>(&raw) {
        Ok(response) => response.combined,
        Err(_) => serde_json::from_slice::<RelevanceResult>(&raw)?,
    };

    ensure_open(state, document_id).await?;
    let outcome = state.controller.publish_relevance(result).await?;
    Ok(annotate_response(state, outcome.report))
}

pub async fn search(state: &AppState, document_id: &str, query: &str) -> AppResult<AnnotateResponse> {
    if query.trim().is_empty() {
        return Err(AppError::InvalidInput("query cannot be empty".to_string()));
    }
    ensure_open(state, document_id).await?;
    state.controller.select_text(query).await?;
    let outcome = state.controller.search_relevant().await?;
    Ok(annotate_response(state, outcome.report))
}

pub async fn summary(state: &AppState, document_id: &str) -> AppResult<String> {
    state.api.get_summary(document_id).await
}

pub async fn faq(state: &AppState, document_id: &str) -> AppResult<Vec<FaqEntry>> {
    state.api.get_faq(document_id).await
}

pub async fn download(state: &AppState, document_id: &str, output: &Path) -> AppResult<DownloadResponse> {
    let mut body = state.api.get_file_bytes(document_id).await?;
    let mut file = tokio::fs::File::create(output).await?;
    let mut hasher = Sha256::new();
    let mut bytes = 0u64;
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        hasher.update(&chunk);
        bytes += chunk.len() as u64;
        file.write_all(&chunk).await?;
    }
    file.flush().await?;

    tracing::info!(document_id, bytes, path = %output.display(), "document downloaded");
    Ok(DownloadResponse {
        path: output.to_path_buf(),
        bytes,
        checksum: format!("{:x}", hasher.finalize()),
    })
}
