use std::time::Duration;

use crate::core::errors::{AppError, AppResult};

const DEFAULT_API_BASE: &str = "http://127.0.0.1:3000";
const DEFAULT_INFERENCE_HOST: &str = "127.0.0.1";
const DEFAULT_INFERENCE_PORT: u16 = 8000;
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_STREAM_IDLE_SECS: u64 = 30;
const DEFAULT_MAX_RETRIES: u32 = 1;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base: String,
    pub inference_base: String,
    pub request_timeout: Duration,
    pub stream_idle_timeout: Duration,
    pub max_retries: u32,
    pub session_token: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            inference_base: format!("http://{DEFAULT_INFERENCE_HOST}:{DEFAULT_INFERENCE_PORT}"),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            stream_idle_timeout: Duration::from_secs(DEFAULT_STREAM_IDLE_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
            session_token: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let api_base = non_empty("DOCSIGHT_API_BASE")
            .map(|value| value.trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_base);
        let inference_base = match non_empty("DOCSIGHT_INFERENCE_BASE") {
            Some(value) => value.trim_end_matches('/').to_string(),
            None => match non_empty("SERVICE_NAME") {
                Some(host) => format!("http://{}:{DEFAULT_INFERENCE_PORT}", host.trim()),
                None => defaults.inference_base,
            },
        };

        Ok(Self {
            api_base,
            inference_base,
            request_timeout: parse_secs(non_empty("DOCSIGHT_TIMEOUT_SECS"), "DOCSIGHT_TIMEOUT_SECS")?
                .unwrap_or(defaults.request_timeout),
            stream_idle_timeout: parse_secs(
                non_empty("DOCSIGHT_STREAM_IDLE_SECS"),
                "DOCSIGHT_STREAM_IDLE_SECS",
            )?
            .unwrap_or(defaults.stream_idle_timeout),
            max_retries: match non_empty("DOCSIGHT_MAX_RETRIES") {
                Some(raw) => raw.trim().parse().map_err(|_| {
                    AppError::InvalidInput(format!("DOCSIGHT_MAX_RETRIES must be an integer, got {raw}"))
                })?,
                None => defaults.max_retries,
            },
            session_token: non_empty("DOCSIGHT_SESSION_TOKEN"),
        })
    }
}

fn parse_secs(raw: Option<String>, key: &str) -> AppResult<Option<Duration>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let secs: u64 = raw
        .trim()
        .parse()
        .map_err(|_| AppError::InvalidInput(format!("{key} must be a number of seconds, got {raw}")))?;
    if secs == 0 {
        return Err(AppError::InvalidInput(format!("{key} must be greater than zero")));
    }
    Ok(Some(Duration::from_secs(secs)))
}
