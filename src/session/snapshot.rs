use serde::Serialize;
use uuid::Uuid;

use crate::core::types::{DocumentMetadata, HeadingNode, RelatedDocument, SessionPhase};

/// Every open or close starts a new `generation`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub generation: u64,
    pub session_id: Option<Uuid>,
    pub document_id: Option<String>,
    pub document: Option<DocumentMetadata>,
    pub phase: SessionPhase,
    pub viewer_ready: bool,
    pub outline: Vec<HeadingNode>,
    pub selected_heading: Option<String>,
    pub selected_text: String,
    pub annotation_count: usize,
    pub related_documents: Vec<RelatedDocument>,
    pub last_error: Option<String>,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            generation: 0,
            session_id: None,
            document_id: None,
            document: None,
            phase: SessionPhase::Uninitialized,
            viewer_ready: false,
            outline: Vec::new(),
            selected_heading: None,
            selected_text: String::new(),
            annotation_count: 0,
            related_documents: Vec::new(),
            last_error: None,
        }
    }
}

impl SessionSnapshot {
    pub fn set_phase(&mut self, phase: SessionPhase) {
        self.phase = phase;
        self.viewer_ready = phase.viewer_ready();
    }
}
