use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::StreamExt;
use serde::Serialize;
use tokio::sync::{watch, Mutex};

use crate::{
    annotations::annotations_for_document,
    core::{
        config::AppConfig,
        errors::{AppError, AppResult},
        types::{InsightContext, RelatedDocument, RelevanceResult, SessionPhase, StreamKind},
    },
    outline::{build_tree, find_node},
    providers::{DocumentApi, GuideRequest, InferenceClient, InsightRequest, PodcastRequest},
    relevance::{RelevanceSnapshot, RelevanceStore, RelevanceWriter},
    session::{snapshot::SessionSnapshot, viewer_session::ViewerSession},
    stream::{FolderScope, InputFingerprint, StreamInput, StreamState, Utf8StreamDecoder},
    viewer::{ViewerDocument, ViewerFactory},
};

/// Context sent with an insight request when the folder summaries could not
/// be fetched.
pub const SUMMARY_PLACEHOLDER: &str = "\u{26a0}\u{fe0f} Failed to fetch summaries.";

pub struct SessionDeps {
    pub api: Arc<dyn DocumentApi>,
    pub inference: Arc<dyn InferenceClient>,
    pub viewers: Arc<dyn ViewerFactory>,
    pub relevance: RelevanceWriter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OpenOutcome {
    Ready,
    AlreadyOpen,
    /// Another call is still loading the same document.
    InProgress,
    Superseded,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyReport {
    pub revision: u64,
    pub applied: usize,
    pub failed: usize,
    pub skipped: usize,
    pub already_applied: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum StreamOutcome {
    Completed { chars: usize },
    Failed { code: String, message: String },
    Toggled { visible: bool },
    InFlight,
    Superseded,
}

#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub snapshot: RelevanceSnapshot,
    /// `None` when no document was open to receive the highlights.
    pub report: Option<ApplyReport>,
}

enum Claim {
    Open,
    Opening,
    Started(u64),
}

enum StreamDecision {
    Start(u64),
    Toggle(bool),
    InFlight,
}

struct Inner {
    api: Arc<dyn DocumentApi>,
    inference: Arc<dyn InferenceClient>,
    viewers: Arc<dyn ViewerFactory>,
    relevance_writer: RelevanceWriter,
    relevance: RelevanceStore,
    stream_idle_timeout: Duration,
    viewer_timeout: Duration,
    session: Mutex<Option<ViewerSession>>,
    snapshot: watch::Sender<SessionSnapshot>,
    insight: watch::Sender<StreamState>,
    guide: watch::Sender<StreamState>,
    podcast: Mutex<Option<(InputFingerprint, Arc<Vec<u8>>)>>,
}

#[derive(Clone)]
pub struct SessionController {
    inner: Arc<Inner>,
}

impl SessionController {
    pub fn new(deps: SessionDeps, config: &AppConfig) -> Self {
        let relevance = deps.relevance.reader();
        let (snapshot, _) = watch::channel(SessionSnapshot::default());
        let (insight, _) = watch::channel(StreamState::new(StreamKind::Insight));
        let (guide, _) = watch::channel(StreamState::new(StreamKind::Guide));
        Self {
            inner: Arc::new(Inner {
                api: deps.api,
                inference: deps.inference,
                viewers: deps.viewers,
                relevance_writer: deps.relevance,
                relevance,
                stream_idle_timeout: config.stream_idle_timeout,
                viewer_timeout: config.request_timeout,
                session: Mutex::new(None),
                snapshot,
                insight,
                guide,
                podcast: Mutex::new(None),
            }),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.snapshot.subscribe()
    }

    pub fn viewer_ready(&self) -> bool {
        self.inner.snapshot.borrow().viewer_ready
    }

    pub fn stream_state(&self, kind: StreamKind) -> StreamState {
        self.stream_slot(kind).borrow().clone()
    }

    pub fn subscribe_stream(&self, kind: StreamKind) -> watch::Receiver<StreamState> {
        self.stream_slot(kind).subscribe()
    }

    pub fn relevance(&self) -> RelevanceStore {
        self.inner.relevance.clone()
    }

    /// Loads a document and brings up its viewer. A load superseded by a later
    /// `open_document` or `close` is discarded.
    pub async fn open_document(&self, document_id: &str) -> AppResult<OpenOutcome> {
        let document_id = document_id.trim();
        if document_id.is_empty() {
            return Err(AppError::InvalidInput("document id cannot be empty".to_string()));
        }

        let generation = match self.claim_document(document_id) {
            Claim::Open => {
                tracing::debug!(document_id, "document already open");
                return Ok(OpenOutcome::AlreadyOpen);
            }
            Claim::Opening => {
                tracing::debug!(document_id, "document already opening");
                return Ok(OpenOutcome::InProgress);
            }
            Claim::Started(generation) => generation,
        };
        self.reset_stream(StreamKind::Insight);
        self.release_session().await;
        tracing::info!(document_id, generation, "loading document");

        let loaded = futures::future::try_join(
            self.inner.api.get_document_metadata(document_id),
            self.inner.api.get_headings(document_id),
        )
        .await;

        if self.current_generation() != generation {
            tracing::debug!(document_id, generation, "discarding stale document load");
            return Ok(OpenOutcome::Superseded);
        }

        let (document, headings) = match loaded {
            Ok(pair) => pair,
            Err(err) => {
                tracing::warn!(document_id, code = err.code(), error = %err, "document load failed");
                self.mark_failed(generation, &err);
                return Err(match err {
                    AppError::Authentication => AppError::Authentication,
                    other => AppError::LoadFailure(other.to_string()),
                });
            }
        };

        let outline = build_tree(&headings);
        let published = self.publish_if_current(generation, |snap| {
            snap.set_phase(SessionPhase::MetadataReady);
            snap.document = Some(document.clone());
            snap.outline = outline.clone();
        });
        if !published {
            return Ok(OpenOutcome::Superseded);
        }
        self.publish_if_current(generation, |snap| snap.set_phase(SessionPhase::ViewerInitializing));

        let mut viewer = self.inner.viewers.create();
        let target = ViewerDocument {
            document_id: document.id.clone(),
            file_name: document.name.clone(),
            file_url: self.inner.api.file_location(document_id),
        };
        let initialized = match tokio::time::timeout(self.inner.viewer_timeout, viewer.initialize(&target)).await {
            Ok(result) => result,
            Err(_) => Err(AppError::Timeout),
        };
        if self.current_generation() != generation {
            tracing::debug!(document_id, generation, "dropping viewer for superseded document");
            return Ok(OpenOutcome::Superseded);
        }
        if let Err(err) = initialized {
            tracing::warn!(document_id, code = err.code(), error = %err, "viewer initialization failed");
            self.mark_failed(generation, &err);
            return Err(err);
        }

        let mut session = ViewerSession::new(generation, document_id.to_string(), document, outline, viewer);
        let pending = self.inner.relevance.snapshot();
        if pending.for_document(document_id).is_some() {
            let report = self.apply_batch(&mut session, &pending).await;
            tracing::info!(
                document_id,
                applied = report.applied,
                failed = report.failed,
                skipped = report.skipped,
                "applied pending relevance highlights"
            );
        }

        let mut slot = self.inner.session.lock().await;
        if self.current_generation() != generation {
            return Ok(OpenOutcome::Superseded);
        }
        // published while the viewer was initializing
        let latest = self.inner.relevance.snapshot();
        if latest.revision != pending.revision && latest.for_document(document_id).is_some() {
            self.apply_batch(&mut session, &latest).await;
        }
        session.phase = SessionPhase::Active;
        self.publish_session(&session);
        tracing::info!(document_id, session_id = %session.session_id, "viewer session active");
        *slot = Some(session);
        Ok(OpenOutcome::Ready)
    }

    /// Applies one relevance result to the open session, once per revision.
    pub async fn apply_relevance_annotations(&self, relevance: &RelevanceSnapshot) -> AppResult<ApplyReport> {
        let mut slot = self.inner.session.lock().await;
        let session = ready_session(&mut slot)?;
        if session.applied_revision == Some(relevance.revision) {
            return Ok(ApplyReport {
                revision: relevance.revision,
                already_applied: true,
                ..ApplyReport::default()
            });
        }

        let report = self.apply_batch(session, relevance).await;
        session.phase = if session.selected_text.trim().is_empty() {
            SessionPhase::Active
        } else {
            SessionPhase::AwaitingSearch
        };
        self.publish_session(session);
        Ok(report)
    }

    pub async fn select_text(&self, text: &str) -> AppResult<()> {
        let mut slot = self.inner.session.lock().await;
        let session = ready_session(&mut slot)?;
        let changed = session.selected_text != text;
        session.selected_text = text.to_string();
        session.phase = if text.trim().is_empty() {
            SessionPhase::Active
        } else {
            SessionPhase::AwaitingSearch
        };
        self.publish_session(session);
        drop(slot);

        if changed {
            self.reset_stream(StreamKind::Insight);
        }
        Ok(())
    }

    /// Pulls the viewer's current selection into the session.
    pub async fn capture_selection(&self) -> AppResult<Option<String>> {
        let selection = {
            let mut slot = self.inner.session.lock().await;
            let session = ready_session(&mut slot)?;
            session.viewer.get_selection().await?
        };
        if let Some(text) = &selection {
            self.select_text(text).await?;
        }
        Ok(selection)
    }

    /// Navigates to a heading. Returns the 1-based page shown.
    pub async fn select_heading(&self, heading_id: &str) -> AppResult<u32> {
        let mut slot = self.inner.session.lock().await;
        let session = ready_session(&mut slot)?;
        let page = find_node(&session.outline, heading_id)
            .map(|node| node.heading.page)
            .ok_or_else(|| AppError::NotFound(format!("heading {heading_id}")))?;
        let page_number = page.saturating_add(1);
        session.viewer.goto_page(page_number).await?;
        session.selected_heading = Some(heading_id.to_string());
        self.publish_session(session);
        Ok(page_number)
    }

    pub async fn search_relevant(&self) -> AppResult<SearchOutcome> {
        let (folder_id, query) = {
            let mut slot = self.inner.session.lock().await;
            let session = ready_session(&mut slot)?;
            if session.selected_text.trim().is_empty() {
                return Err(AppError::InvalidInput("select text before searching".to_string()));
            }
            (session.document.folder_id.clone(), session.selected_text.clone())
        };

        tracing::info!(folder_id = %folder_id, query_len = query.len(), "searching related passages");
        let result = self.inner.api.search_relevance(&folder_id, &query).await?;
        self.publish_relevance(result).await
    }

    pub async fn publish_relevance(&self, result: RelevanceResult) -> AppResult<SearchOutcome> {
        let snapshot = self.inner.relevance_writer.publish(result);
        let related = snapshot.related_documents();
        self.inner.snapshot.send_modify(|snap| snap.related_documents = related);

        let report = match self.apply_relevance_annotations(&snapshot).await {
            Ok(report) => Some(report),
            Err(AppError::InvalidState(_)) => None,
            Err(err) => return Err(err),
        };
        Ok(SearchOutcome { snapshot, report })
    }

    /// Finished text, including a failure warning, is cached per input
    /// identity; asking again with the same input toggles visibility.
    pub async fn run_stream(&self, input: StreamInput) -> AppResult<StreamOutcome> {
        validate_stream_input(&input)?;
        let kind = input.kind();
        let fingerprint = input.fingerprint();

        let mut decision = StreamDecision::InFlight;
        self.stream_slot(kind).send_modify(|state| {
            if state.fingerprint.as_ref() != Some(&fingerprint) {
                state.reset(Some(fingerprint.clone()));
            }
            decision = if state.phase.is_in_flight() {
                StreamDecision::InFlight
            } else if state.has_cached_text() {
                StreamDecision::Toggle(state.toggle_visible())
            } else {
                state.begin();
                StreamDecision::Start(state.run)
            };
        });

        match decision {
            StreamDecision::InFlight => Ok(StreamOutcome::InFlight),
            StreamDecision::Toggle(visible) => Ok(StreamOutcome::Toggled { visible }),
            StreamDecision::Start(run) => Ok(self.drive_stream(kind, run, &input).await),
        }
    }

    pub fn reset_stream(&self, kind: StreamKind) {
        self.stream_slot(kind).send_modify(|state| state.reset(None));
    }

    /// Audio overview of a folder, generated at most once per folder contents.
    pub async fn generate_podcast(&self, scope: &FolderScope) -> AppResult<Arc<Vec<u8>>> {
        if scope.folder_id.trim().is_empty() {
            return Err(AppError::InvalidInput("folder id cannot be empty".to_string()));
        }
        let fingerprint = scope.fingerprint("podcast");
        let mut cache = self.inner.podcast.lock().await;
        if let Some((cached, audio)) = cache.as_ref() {
            if *cached == fingerprint {
                tracing::debug!(folder_id = %scope.folder_id, "reusing generated podcast");
                return Ok(Arc::clone(audio));
            }
        }

        let summaries = self.inner.api.get_folder_summaries(&scope.folder_id).await?;
        tracing::info!(folder_id = %scope.folder_id, "generating podcast");
        let audio = Arc::new(
            self.inner
                .inference
                .generate_podcast(&PodcastRequest { summaries })
                .await?,
        );
        *cache = Some((fingerprint, Arc::clone(&audio)));
        Ok(audio)
    }

    /// Tears down the current session and invalidates in-flight loads.
    pub async fn close(&self) {
        self.begin_generation(SessionPhase::Closed, None);
        self.release_session().await;
        self.reset_stream(StreamKind::Insight);
    }

    async fn drive_stream(&self, kind: StreamKind, run: u64, input: &StreamInput) -> StreamOutcome {
        let opened = match input {
            StreamInput::Insight {
                document_id,
                selected_text,
            } => {
                let context = match self.inner.api.get_insight_context(document_id).await {
                    Ok(context) => context,
                    Err(err) => {
                        tracing::warn!(document_id = %document_id, error = %err, "summaries unavailable for insight");
                        InsightContext {
                            summaries: SUMMARY_PLACEHOLDER.to_string(),
                            current_document_name: String::new(),
                        }
                    }
                };
                let request = InsightRequest {
                    selected_text: selected_text.clone(),
                    current_document_name: context.current_document_name,
                    summaries: context.summaries,
                };
                self.inner.inference.stream_insights(&request).await
            }
            StreamInput::Guide(scope) => match self.inner.api.get_folder_summaries(&scope.folder_id).await {
                Ok(summaries) => self.inner.inference.stream_guide(&GuideRequest { summaries }).await,
                Err(err) => Err(err),
            },
        };

        let mut body = match opened {
            Ok(body) => body,
            Err(err) => return self.fail_stream(kind, run, err),
        };

        let slot = self.stream_slot(kind);
        let mut decoder = Utf8StreamDecoder::new();
        let mut chars = 0usize;
        loop {
            let next = match tokio::time::timeout(self.inner.stream_idle_timeout, body.next()).await {
                Ok(next) => next,
                Err(_) => return self.fail_stream(kind, run, AppError::Timeout),
            };
            let bytes = match next {
                Some(Ok(bytes)) => bytes,
                Some(Err(err)) => return self.fail_stream(kind, run, err),
                None => break,
            };
            let text = match decoder.decode(&bytes) {
                Ok(text) => text,
                Err(err) => return self.fail_stream(kind, run, err),
            };
            chars += text.chars().count();
            if !slot.send_if_modified(|state| state.push_chunk(run, &text)) {
                tracing::debug!(stream = kind.as_str(), run, "stream superseded mid-flight");
                return StreamOutcome::Superseded;
            }
        }

        let tail = match decoder.finish() {
            Ok(tail) => tail,
            Err(err) => return self.fail_stream(kind, run, err),
        };
        chars += tail.chars().count();
        if !slot.send_if_modified(|state| state.push_chunk(run, &tail) && state.finish(run)) {
            return StreamOutcome::Superseded;
        }
        tracing::info!(stream = kind.as_str(), chars, "stream completed");
        StreamOutcome::Completed { chars }
    }

    fn fail_stream(&self, kind: StreamKind, run: u64, err: AppError) -> StreamOutcome {
        tracing::warn!(stream = kind.as_str(), code = err.code(), error = %err, "stream failed");
        let recorded = self
            .stream_slot(kind)
            .send_if_modified(|state| state.fail(run, kind.failure_warning()));
        if !recorded {
            return StreamOutcome::Superseded;
        }
        StreamOutcome::Failed {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }

    async fn apply_batch(&self, session: &mut ViewerSession, relevance: &RelevanceSnapshot) -> ApplyReport {
        let annotations = annotations_for_document(&relevance.result, &session.document_id, Utc::now());
        let candidates = relevance
            .for_document(&session.document_id)
            .map(|doc| doc.sections.len() + doc.subsections.len())
            .unwrap_or(0);
        let mut report = ApplyReport {
            revision: relevance.revision,
            skipped: candidates.saturating_sub(annotations.len()),
            ..ApplyReport::default()
        };

        if session.annotation_count > 0 {
            if let Err(err) = session.viewer.clear_annotations().await {
                tracing::warn!(error = %err, "could not clear previous highlights");
            }
            session.annotation_count = 0;
        }

        for annotation in &annotations {
            match session.viewer.add_annotation(annotation).await {
                Ok(()) => report.applied += 1,
                Err(err) => {
                    let failure = AppError::AnnotationFailure {
                        id: annotation.id.clone(),
                        message: err.to_string(),
                    };
                    tracing::warn!(code = failure.code(), "{failure}");
                    report.failed += 1;
                }
            }
        }

        session.annotation_count = report.applied;
        session.applied_revision = Some(relevance.revision);
        session.phase = SessionPhase::AnnotationsApplied;
        report
    }

    async fn release_session(&self) {
        let previous = self.inner.session.lock().await.take();
        if let Some(session) = previous {
            tracing::info!(
                document_id = %session.document_id,
                session_id = %session.session_id,
                "viewer session released"
            );
        }
    }

    fn begin_generation(&self, phase: SessionPhase, document_id: Option<&str>) -> u64 {
        let related = self.inner.relevance.snapshot().related_documents();
        let mut generation = 0;
        self.inner.snapshot.send_modify(|snap| {
            *snap = fresh_snapshot(snap.generation + 1, phase, document_id, related);
            generation = snap.generation;
        });
        generation
    }

    /// Starts a new generation for `document_id` unless that document is
    /// already open or opening.
    fn claim_document(&self, document_id: &str) -> Claim {
        let related = self.inner.relevance.snapshot().related_documents();
        let mut claim = Claim::Opening;
        self.inner.snapshot.send_if_modified(|snap| {
            if snap.document_id.as_deref() == Some(document_id) {
                if snap.viewer_ready {
                    claim = Claim::Open;
                    return false;
                }
                if snap.phase.is_opening() {
                    return false;
                }
            }
            *snap = fresh_snapshot(
                snap.generation + 1,
                SessionPhase::LoadingMetadata,
                Some(document_id),
                related,
            );
            claim = Claim::Started(snap.generation);
            true
        });
        claim
    }

    fn mark_failed(&self, generation: u64, err: &AppError) {
        let message = err.to_string();
        self.publish_if_current(generation, |snap| {
            snap.set_phase(SessionPhase::LoadFailed);
            snap.last_error = Some(message);
        });
    }

    fn current_generation(&self) -> u64 {
        self.inner.snapshot.borrow().generation
    }

    fn publish_if_current(&self, generation: u64, update: impl FnOnce(&mut SessionSnapshot)) -> bool {
        self.inner.snapshot.send_if_modified(|snap| {
            if snap.generation != generation {
                return false;
            }
            update(snap);
            true
        })
    }

    fn publish_session(&self, session: &ViewerSession) -> bool {
        self.publish_if_current(session.generation, |snap| session.write_into(snap))
    }

    fn stream_slot(&self, kind: StreamKind) -> &watch::Sender<StreamState> {
        match kind {
            StreamKind::Insight => &self.inner.insight,
            StreamKind::Guide => &self.inner.guide,
        }
    }
}

fn fresh_snapshot(
    generation: u64,
    phase: SessionPhase,
    document_id: Option<&str>,
    related_documents: Vec<RelatedDocument>,
) -> SessionSnapshot {
    let mut snapshot = SessionSnapshot {
        generation,
        document_id: document_id.map(str::to_string),
        related_documents,
        ..SessionSnapshot::default()
    };
    snapshot.set_phase(phase);
    snapshot
}

fn ready_session(slot: &mut Option<ViewerSession>) -> AppResult<&mut ViewerSession> {
    slot.as_mut()
        .filter(|session| session.phase.viewer_ready())
        .ok_or_else(|| AppError::InvalidState("no document is open".to_string()))
}

fn validate_stream_input(input: &StreamInput) -> AppResult<()> {
    match input {
        StreamInput::Insight {
            document_id,
            selected_text,
        } => {
            if document_id.trim().is_empty() {
                return Err(AppError::InvalidInput("document id cannot be empty".to_string()));
            }
            if selected_text.trim().is_empty() {
                return Err(AppError::InvalidInput("select text before generating insights".to_string()));
            }
        }
        StreamInput::Guide(scope) => {
            if scope.folder_id.trim().is_empty() {
                return Err(AppError::InvalidInput("folder id cannot be empty".to_string()));
            }
        }
    }
    Ok(())
}
