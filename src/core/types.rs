use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Page-space rectangle `[x0, y0, x1, y1]`.
pub type BBox = [f64; 4];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HeadingRecord {
    pub id: String,
    pub text: String,
    pub level: String,
    pub page: u32,
    #[serde(default)]
    pub bbox: Option<BBox>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HeadingNode {
    #[serde(flatten)]
    pub heading: HeadingRecord,
    pub children: Vec<HeadingNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HeadingsResponse {
    pub headings: Vec<HeadingRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentMetadata {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "originalName")]
    pub name: String,
    #[serde(rename = "folderId")]
    pub folder_id: String,
    #[serde(default)]
    pub filename: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RelevanceSection {
    #[serde(rename = "section_title")]
    pub title: String,
    pub page_number: u32,
    #[serde(default)]
    pub page_height: Option<f64>,
    #[serde(default)]
    pub bbox: Option<BBox>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RelevanceSubsection {
    pub refined_text: String,
    pub page_number: u32,
    #[serde(default)]
    pub page_height: Option<f64>,
    #[serde(default)]
    pub bbox: Option<BBox>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRelevance {
    pub original_name: String,
    #[serde(default)]
    pub sections: Vec<RelevanceSection>,
    #[serde(default)]
    pub subsections: Vec<RelevanceSubsection>,
}

/// Result of one relevance search, keyed by document id.
pub type RelevanceResult = BTreeMap<String, DocumentRelevance>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RelevanceResponse {
    pub combined: RelevanceResult,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FaqEntry {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InsightContext {
    pub summaries: String,
    pub current_document_name: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    Insight,
    Guide,
}

impl StreamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Insight => "insight",
            Self::Guide => "guide",
        }
    }

    pub fn failure_warning(&self) -> &'static str {
        match self {
            Self::Insight => "\u{26a0}\u{fe0f} Failed to generate insights.",
            Self::Guide => "\u{26a0}\u{fe0f} Failed to generate guide.",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StreamPhase {
    Idle,
    Loading,
    Streaming,
    Done,
    Failed,
}

impl StreamPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::Loading | Self::Streaming)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Uninitialized,
    LoadingMetadata,
    MetadataReady,
    LoadFailed,
    ViewerInitializing,
    ViewerReady,
    AnnotationsApplied,
    Active,
    AwaitingSearch,
    Closed,
}

impl SessionPhase {
    pub fn viewer_ready(&self) -> bool {
        matches!(
            self,
            Self::ViewerReady | Self::AnnotationsApplied | Self::Active | Self::AwaitingSearch
        )
    }

    pub fn is_opening(&self) -> bool {
        matches!(
            self,
            Self::LoadingMetadata | Self::MetadataReady | Self::ViewerInitializing
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RelatedDocument {
    pub document_id: String,
    pub original_name: String,
}
