pub mod documents;
pub mod insights;
pub mod settings;

use std::sync::Arc;

use crate::{
    core::{config::AppConfig, errors::AppResult},
    providers::{DocumentApi, HttpDocumentApi, HttpInferenceClient, InferenceClient},
    relevance::RelevanceStore,
    security::keyring,
    session::{SessionController, SessionDeps},
    viewer::HeadlessViewerFactory,
};

/// Everything a shell command needs, wired once per process.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub api: Arc<dyn DocumentApi>,
    pub controller: SessionController,
    pub relevance: RelevanceStore,
    pub viewers: HeadlessViewerFactory,
}

impl AppState {
    pub fn from_config(config: AppConfig) -> AppResult<Self> {
        let token = match config.session_token.clone() {
            Some(token) => Some(token),
            None => keyring::get_session_token().ok(),
        };
        if token.is_none() {
            tracing::debug!("no session token configured");
        }
        let api: Arc<dyn DocumentApi> = Arc::new(HttpDocumentApi::new(&config, token)?);
        let inference: Arc<dyn InferenceClient> = Arc::new(HttpInferenceClient::new(&config)?);
        Ok(Self::with_collaborators(config, api, inference))
    }

    pub fn with_collaborators(
        config: AppConfig,
        api: Arc<dyn DocumentApi>,
        inference: Arc<dyn InferenceClient>,
    ) -> Self {
        let viewers = HeadlessViewerFactory::new();
        let (writer, relevance) = RelevanceStore::channel();
        let controller = SessionController::new(
            SessionDeps {
                api: Arc::clone(&api),
                inference,
                viewers: Arc::new(viewers.clone()),
                relevance: writer,
            },
            &config,
        );
        Self {
            config,
            api,
            controller,
            relevance,
            viewers,
        }
    }
}
