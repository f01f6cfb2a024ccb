pub mod headless;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::annotations::Annotation;
use crate::core::errors::AppResult;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ViewerDocument {
    pub document_id: String,
    pub file_name: String,
    pub file_url: String,
}

#[async_trait]
pub trait ViewerSurface: Send + Sync {
    /// Loads the document. Must be called once, before anything else.
    async fn initialize(&mut self, document: &ViewerDocument) -> AppResult<()>;

    async fn add_annotation(&mut self, annotation: &Annotation) -> AppResult<()>;

    async fn clear_annotations(&mut self) -> AppResult<()>;

    /// Scrolls to a 1-based page number.
    async fn goto_page(&mut self, page_number: u32) -> AppResult<()>;

    async fn get_selection(&mut self) -> AppResult<Option<String>>;
}

/// Produces a fresh, uninitialized surface for each viewer session.
pub trait ViewerFactory: Send + Sync {
    fn create(&self) -> Box<dyn ViewerSurface>;
}

pub use headless::{HeadlessViewer, HeadlessViewerFactory, HeadlessViewerState};
