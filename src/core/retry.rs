use std::{future::Future, time::Duration};

use crate::core::{
    config::AppConfig,
    errors::{AppError, AppResult},
};

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub timeout: Duration,
    pub max_retries: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            timeout: config.request_timeout,
            max_retries: config.max_retries,
            backoff: Duration::from_millis(250),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// Runs `op` under the policy's timeout, retrying retryable failures.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, label: &str, mut op: F) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let mut attempt: u32 = 0;
    loop {
        let outcome = match tokio::time::timeout(policy.timeout, op()).await {
            Ok(result) => result,
            Err(_) => Err(AppError::Timeout),
        };
        match outcome {
            Err(err) if err.retryable() && attempt < policy.max_retries => {
                attempt += 1;
                tracing::warn!(request = label, attempt, error = %err, "retrying request");
                tokio::time::sleep(policy.backoff).await;
            }
            other => return other,
        }
    }
}
