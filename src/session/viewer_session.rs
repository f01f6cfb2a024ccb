use uuid::Uuid;

use crate::core::types::{DocumentMetadata, HeadingNode, SessionPhase};
use crate::session::snapshot::SessionSnapshot;
use crate::viewer::ViewerSurface;

/// State of the one displayed document. Owns the viewer handle exclusively;
/// dropping the session releases it.
pub(crate) struct ViewerSession {
    pub session_id: Uuid,
    pub generation: u64,
    pub document_id: String,
    pub document: DocumentMetadata,
    pub outline: Vec<HeadingNode>,
    pub selected_heading: Option<String>,
    pub selected_text: String,
    pub phase: SessionPhase,
    pub viewer: Box<dyn ViewerSurface>,
    pub applied_revision: Option<u64>,
    pub annotation_count: usize,
}

impl ViewerSession {
    pub fn new(
        generation: u64,
        document_id: String,
        document: DocumentMetadata,
        outline: Vec<HeadingNode>,
        viewer: Box<dyn ViewerSurface>,
    ) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            generation,
            document_id,
            document,
            outline,
            selected_heading: None,
            selected_text: String::new(),
            phase: SessionPhase::ViewerReady,
            viewer,
            applied_revision: None,
            annotation_count: 0,
        }
    }

    pub fn write_into(&self, snapshot: &mut SessionSnapshot) {
        snapshot.session_id = Some(self.session_id);
        snapshot.document_id = Some(self.document_id.clone());
        snapshot.document = Some(self.document.clone());
        snapshot.set_phase(self.phase);
        snapshot.outline = self.outline.clone();
        snapshot.selected_heading = self.selected_heading.clone();
        snapshot.selected_text = self.selected_text.clone();
        snapshot.annotation_count = self.annotation_count;
        snapshot.last_error = None;
    }
}
