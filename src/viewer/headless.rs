use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::Serialize;

use crate::annotations::Annotation;
use crate::core::errors::{AppError, AppResult};
use crate::viewer::{ViewerDocument, ViewerFactory, ViewerSurface};

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadlessViewerState {
    pub document: Option<ViewerDocument>,
    pub initializations: usize,
    pub annotations: Vec<Annotation>,
    pub current_page: Option<u32>,
    pub selection: Option<String>,
}

/// In-process viewer that records what a real surface would display.
pub struct HeadlessViewer {
    state: Arc<Mutex<HeadlessViewerState>>,
    initialized: bool,
}

impl HeadlessViewer {
    fn with_state<T>(&self, f: impl FnOnce(&mut HeadlessViewerState) -> T) -> AppResult<T> {
        let mut guard = self
            .state
            .lock()
            .map_err(|_| AppError::Internal("headless viewer state poisoned".to_string()))?;
        Ok(f(&mut guard))
    }

    fn ensure_initialized(&self) -> AppResult<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(AppError::Viewer("viewer not initialized".to_string()))
        }
    }
}

#[async_trait]
impl ViewerSurface for HeadlessViewer {
    async fn initialize(&mut self, document: &ViewerDocument) -> AppResult<()> {
        if self.initialized {
            return Err(AppError::Viewer(format!(
                "viewer already initialized for {}",
                document.document_id
            )));
        }
        self.with_state(|state| {
            *state = HeadlessViewerState {
                document: Some(document.clone()),
                initializations: state.initializations + 1,
                ..HeadlessViewerState::default()
            };
        })?;
        self.initialized = true;
        tracing::info!(document_id = %document.document_id, file = %document.file_url, "viewer initialized");
        Ok(())
    }

    async fn add_annotation(&mut self, annotation: &Annotation) -> AppResult<()> {
        self.ensure_initialized()?;
        tracing::debug!(
            annotation_id = %annotation.id,
            page_index = annotation.page_index,
            "annotation added"
        );
        self.with_state(|state| state.annotations.push(annotation.clone()))
    }

    async fn clear_annotations(&mut self) -> AppResult<()> {
        self.ensure_initialized()?;
        self.with_state(|state| state.annotations.clear())
    }

    async fn goto_page(&mut self, page_number: u32) -> AppResult<()> {
        self.ensure_initialized()?;
        if page_number == 0 {
            return Err(AppError::InvalidInput("page numbers start at 1".to_string()));
        }
        self.with_state(|state| state.current_page = Some(page_number))
    }

    async fn get_selection(&mut self) -> AppResult<Option<String>> {
        self.ensure_initialized()?;
        self.with_state(|state| state.selection.clone())
    }
}

/// Hands out headless viewers that all report into one shared state.
#[derive(Clone, Default)]
pub struct HeadlessViewerFactory {
    state: Arc<Mutex<HeadlessViewerState>>,
}

impl HeadlessViewerFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> HeadlessViewerState {
        self.state
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Simulates the user dragging a selection in the viewer.
    pub fn set_selection(&self, text: Option<String>) {
        if let Ok(mut guard) = self.state.lock() {
            guard.selection = text;
        }
    }
}

impl ViewerFactory for HeadlessViewerFactory {
    fn create(&self) -> Box<dyn ViewerSurface> {
        Box::new(HeadlessViewer {
            state: Arc::clone(&self.state),
            initialized: false,
        })
    }
}
