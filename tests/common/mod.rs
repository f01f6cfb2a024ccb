#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::Notify;

use docsight_lib::{
    annotations::Annotation,
    core::{
        config::AppConfig,
        errors::{AppError, AppResult},
        types::{
            DocumentMetadata, DocumentRelevance, FaqEntry, HeadingRecord, InsightContext, RelevanceResult,
            RelevanceSection, RelevanceSubsection,
        },
    },
    providers::{ByteStream, DocumentApi, GuideRequest, InferenceClient, InsightRequest, PodcastRequest},
    relevance::RelevanceStore,
    session::{SessionController, SessionDeps},
    viewer::{HeadlessViewerFactory, ViewerDocument, ViewerFactory, ViewerSurface},
};

pub fn heading(id: &str, level: &str, page: u32) -> HeadingRecord {
    HeadingRecord {
        id: id.to_string(),
        text: format!("Heading {id}"),
        level: level.to_string(),
        page,
        bbox: None,
    }
}

pub fn metadata(id: &str) -> DocumentMetadata {
    DocumentMetadata {
        id: id.to_string(),
        name: format!("{id}.pdf"),
        folder_id: "folder-1".to_string(),
        filename: Some(format!("{id}-stored.pdf")),
    }
}

/// `doc-1` has two highlightable passages and one without a bbox; `doc-2`
/// has one.
pub fn relevance_fixture() -> RelevanceResult {
    let mut result = RelevanceResult::new();
    result.insert(
        "doc-1".to_string(),
        DocumentRelevance {
            original_name: "doc-1.pdf".to_string(),
            sections: vec![
                RelevanceSection {
                    title: "Introduction".to_string(),
                    page_number: 1,
                    page_height: Some(100.0),
                    bbox: Some([10.0, 20.0, 50.0, 80.0]),
                },
                RelevanceSection {
                    title: "Unlocated".to_string(),
                    page_number: 2,
                    page_height: Some(100.0),
                    bbox: None,
                },
            ],
            subsections: vec![RelevanceSubsection {
                refined_text: "Gradient descent converges".to_string(),
                page_number: 3,
                page_height: Some(100.0),
                bbox: Some([10.0, 0.0, 50.0, 30.0]),
            }],
        },
    );
    result.insert(
        "doc-2".to_string(),
        DocumentRelevance {
            original_name: "Other.pdf".to_string(),
            sections: vec![RelevanceSection {
                title: "Background".to_string(),
                page_number: 4,
                page_height: Some(792.0),
                bbox: Some([72.0, 600.0, 300.0, 640.0]),
            }],
            subsections: Vec::new(),
        },
    );
    result
}

#[derive(Default)]
pub struct FakeApi {
    pub documents: Mutex<HashMap<String, Vec<HeadingRecord>>>,
    pub failing_headings: Mutex<HashSet<String>>,
    pub unauthenticated: Mutex<bool>,
    pub summaries_missing: Mutex<bool>,
    pub gates: Mutex<HashMap<String, Arc<Notify>>>,
    pub entered: Arc<Notify>,
    pub relevance: Mutex<RelevanceResult>,
    pub searches: Mutex<Vec<(String, String)>>,
    pub metadata_calls: AtomicUsize,
}

impl FakeApi {
    pub fn with_document(self, id: &str, headings: Vec<HeadingRecord>) -> Self {
        self.documents.lock().unwrap().insert(id.to_string(), headings);
        self
    }

    /// Holds metadata loads for `id` until the returned handle is notified.
    pub fn gate(&self, id: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates.lock().unwrap().insert(id.to_string(), Arc::clone(&gate));
        gate
    }
}

#[async_trait]
impl DocumentApi for FakeApi {
    async fn get_document_metadata(&self, document_id: &str) -> AppResult<DocumentMetadata> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();
        let gate = self.gates.lock().unwrap().get(document_id).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if *self.unauthenticated.lock().unwrap() {
            return Err(AppError::Authentication);
        }
        if self.documents.lock().unwrap().contains_key(document_id) {
            Ok(metadata(document_id))
        } else {
            Err(AppError::NotFound(format!("document {document_id}")))
        }
    }

    async fn get_headings(&self, document_id: &str) -> AppResult<Vec<HeadingRecord>> {
        if self.failing_headings.lock().unwrap().contains(document_id) {
            return Err(AppError::Upstream {
                status: 500,
                body: "headings unavailable".to_string(),
            });
        }
        self.documents
            .lock()
            .unwrap()
            .get(document_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("headings for {document_id}")))
    }

    async fn get_file_bytes(&self, _document_id: &str) -> AppResult<ByteStream> {
        Ok(futures::stream::iter(vec![Ok(b"%PDF-1.7\n".to_vec()), Ok(b"%%EOF".to_vec())]).boxed())
    }

    async fn search_relevance(&self, folder_id: &str, query: &str) -> AppResult<RelevanceResult> {
        self.searches
            .lock()
            .unwrap()
            .push((folder_id.to_string(), query.to_string()));
        Ok(self.relevance.lock().unwrap().clone())
    }

    async fn get_summary(&self, document_id: &str) -> AppResult<String> {
        Ok(format!("Summary of {document_id}"))
    }

    async fn get_faq(&self, _document_id: &str) -> AppResult<Vec<FaqEntry>> {
        Ok(vec![FaqEntry {
            question: "What is it?".to_string(),
            answer: "A test document.".to_string(),
        }])
    }

    async fn get_insight_context(&self, document_id: &str) -> AppResult<InsightContext> {
        if *self.summaries_missing.lock().unwrap() {
            return Err(AppError::Network("connection refused".to_string()));
        }
        Ok(InsightContext {
            summaries: "All summaries".to_string(),
            current_document_name: format!("{document_id}.pdf"),
        })
    }

    async fn get_folder_summaries(&self, folder_id: &str) -> AppResult<String> {
        if *self.summaries_missing.lock().unwrap() {
            return Err(AppError::NotFound(format!("summaries for {folder_id}")));
        }
        Ok(format!("Summaries of {folder_id}"))
    }

    fn file_location(&self, document_id: &str) -> String {
        format!("http://files.test/uploads/{document_id}.pdf")
    }
}

/// Chunks handed out for every text stream. `fail_after_chunks` appends a
/// transport error once the chunks are exhausted.
#[derive(Default)]
pub struct FakeInference {
    pub chunks: Mutex<Vec<Vec<u8>>>,
    pub fail_after_chunks: Mutex<bool>,
    pub insight_requests: Mutex<Vec<InsightRequest>>,
    pub guide_requests: Mutex<Vec<GuideRequest>>,
    pub podcast_calls: AtomicUsize,
}

impl FakeInference {
    pub fn with_chunks(chunks: &[&[u8]]) -> Self {
        let fake = Self::default();
        *fake.chunks.lock().unwrap() = chunks.iter().map(|chunk| chunk.to_vec()).collect();
        fake
    }

    fn body(&self) -> ByteStream {
        let mut items: Vec<AppResult<Vec<u8>>> = self.chunks.lock().unwrap().iter().cloned().map(Ok).collect();
        if *self.fail_after_chunks.lock().unwrap() {
            items.push(Err(AppError::StreamTransport("connection reset".to_string())));
        }
        futures::stream::iter(items).boxed()
    }
}

#[async_trait]
impl InferenceClient for FakeInference {
    async fn stream_insights(&self, request: &InsightRequest) -> AppResult<ByteStream> {
        self.insight_requests.lock().unwrap().push(request.clone());
        Ok(self.body())
    }

    async fn stream_guide(&self, request: &GuideRequest) -> AppResult<ByteStream> {
        self.guide_requests.lock().unwrap().push(request.clone());
        Ok(self.body())
    }

    async fn generate_podcast(&self, _request: &PodcastRequest) -> AppResult<Vec<u8>> {
        self.podcast_calls.fetch_add(1, Ordering::SeqCst);
        Ok(b"ID3-audio".to_vec())
    }
}

/// Headless viewer that rejects chosen annotation ids.
pub struct RejectingViewer {
    inner: Box<dyn ViewerSurface>,
    reject: HashSet<String>,
}

#[async_trait]
impl ViewerSurface for RejectingViewer {
    async fn initialize(&mut self, document: &ViewerDocument) -> AppResult<()> {
        self.inner.initialize(document).await
    }

    async fn add_annotation(&mut self, annotation: &Annotation) -> AppResult<()> {
        if self.reject.contains(&annotation.id) {
            return Err(AppError::Viewer(format!("cannot draw {}", annotation.id)));
        }
        self.inner.add_annotation(annotation).await
    }

    async fn clear_annotations(&mut self) -> AppResult<()> {
        self.inner.clear_annotations().await
    }

    async fn goto_page(&mut self, page_number: u32) -> AppResult<()> {
        self.inner.goto_page(page_number).await
    }

    async fn get_selection(&mut self) -> AppResult<Option<String>> {
        self.inner.get_selection().await
    }
}

pub struct RejectingViewerFactory {
    pub inner: HeadlessViewerFactory,
    pub reject: HashSet<String>,
}

impl ViewerFactory for RejectingViewerFactory {
    fn create(&self) -> Box<dyn ViewerSurface> {
        Box::new(RejectingViewer {
            inner: self.inner.create(),
            reject: self.reject.clone(),
        })
    }
}

/// Holds `initialize` for one document until `gate` is notified, then
/// reports success without touching the shared headless state.
pub struct GatedViewer {
    inner: Box<dyn ViewerSurface>,
    document_id: String,
    gate: Arc<Notify>,
    entered: Arc<Notify>,
}

#[async_trait]
impl ViewerSurface for GatedViewer {
    async fn initialize(&mut self, document: &ViewerDocument) -> AppResult<()> {
        if document.document_id != self.document_id {
            return self.inner.initialize(document).await;
        }
        self.entered.notify_one();
        self.gate.notified().await;
        Ok(())
    }

    async fn add_annotation(&mut self, annotation: &Annotation) -> AppResult<()> {
        self.inner.add_annotation(annotation).await
    }

    async fn clear_annotations(&mut self) -> AppResult<()> {
        self.inner.clear_annotations().await
    }

    async fn goto_page(&mut self, page_number: u32) -> AppResult<()> {
        self.inner.goto_page(page_number).await
    }

    async fn get_selection(&mut self) -> AppResult<Option<String>> {
        self.inner.get_selection().await
    }
}

pub struct GatedViewerFactory {
    pub inner: HeadlessViewerFactory,
    pub document_id: String,
    pub gate: Arc<Notify>,
    pub entered: Arc<Notify>,
}

impl GatedViewerFactory {
    pub fn new(inner: HeadlessViewerFactory, document_id: &str) -> Self {
        Self {
            inner,
            document_id: document_id.to_string(),
            gate: Arc::new(Notify::new()),
            entered: Arc::new(Notify::new()),
        }
    }
}

impl ViewerFactory for GatedViewerFactory {
    fn create(&self) -> Box<dyn ViewerSurface> {
        Box::new(GatedViewer {
            inner: self.inner.create(),
            document_id: self.document_id.clone(),
            gate: Arc::clone(&self.gate),
            entered: Arc::clone(&self.entered),
        })
    }
}

pub struct Harness {
    pub controller: SessionController,
    pub api: Arc<FakeApi>,
    pub inference: Arc<FakeInference>,
    pub viewers: HeadlessViewerFactory,
    pub relevance: RelevanceStore,
}

pub fn harness(api: FakeApi, inference: FakeInference) -> Harness {
    harness_rejecting(api, inference, &[])
}

pub fn harness_rejecting(api: FakeApi, inference: FakeInference, reject: &[&str]) -> Harness {
    let viewers = HeadlessViewerFactory::new();
    let factory = RejectingViewerFactory {
        inner: viewers.clone(),
        reject: reject.iter().map(|id| id.to_string()).collect(),
    };
    harness_with(api, inference, viewers, Arc::new(factory), &AppConfig::default())
}

/// `viewers` is the headless factory whose state the test inspects; `factory`
/// is what the controller creates viewers from.
pub fn harness_with(
    api: FakeApi,
    inference: FakeInference,
    viewers: HeadlessViewerFactory,
    factory: Arc<dyn ViewerFactory>,
    config: &AppConfig,
) -> Harness {
    let api = Arc::new(api);
    let inference = Arc::new(inference);
    let (writer, relevance) = RelevanceStore::channel();
    let controller = SessionController::new(
        SessionDeps {
            api: api.clone(),
            inference: inference.clone(),
            viewers: factory,
            relevance: writer,
        },
        config,
    );
    Harness {
        controller,
        api,
        inference,
        viewers,
        relevance,
    }
}

pub fn sample_outline() -> Vec<HeadingRecord> {
    vec![
        heading("h1", "H1", 0),
        heading("h2", "H2", 1),
        heading("h3", "H2", 2),
        heading("h4", "H3", 2),
        heading("h5", "H1", 4),
    ]
}
