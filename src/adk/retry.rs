// SPDX-License-Identifier: MIT

//! Bounded retry for text-generation calls
//!
//! Transport and rate-limit failures are retried with exponential backoff
//! at the collaborator boundary. This is separate from the quality gate's
//! semantic retry loop, which lives in the workflow graph.

use crate::adk::error::ModelError;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

/// Retry policy for model calls
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetryConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_max_backoff")]
    pub max_backoff_ms: u64,
}

fn default_max_retries() -> u32 {
    2
}

fn default_initial_backoff() -> u64 {
    500
}

fn default_max_backoff() -> u64 {
    8_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff(),
            max_backoff_ms: default_max_backoff(),
        }
    }
}

impl RetryConfig {
    /// Delay before retry number `attempt + 1`.
    ///
    /// A server-provided `retry_after` wins over the exponential schedule;
    /// both are capped at `max_backoff_ms`.
    pub fn backoff(&self, attempt: u32, retry_after_secs: Option<u64>) -> Duration {
        let ms = match retry_after_secs {
            Some(secs) => secs.saturating_mul(1000),
            None => {
                let base = self
                    .initial_backoff_ms
                    .saturating_mul(1u64 << attempt.min(16));
                // 0.8x to 1.2x jitter
                let jitter = 0.8 + rand::random::<f64>() * 0.4;
                (base as f64 * jitter) as u64
            }
        };
        Duration::from_millis(ms.min(self.max_backoff_ms))
    }
}

/// Run `op` until it succeeds, fails with a non-retryable error, or the
/// retry budget is spent.
pub async fn with_retry<T, F, Fut>(
    config: &RetryConfig,
    label: &str,
    mut op: F,
) -> Result<T, ModelError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ModelError>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < config.max_retries => {
                let retry_after = match &e {
                    ModelError::RateLimited { retry_after_secs } => *retry_after_secs,
                    _ => None,
                };
                let delay = config.backoff(attempt, retry_after);
                log::warn!(
                    "{} failed (attempt {}/{}), retrying in {}ms: {}",
                    label,
                    attempt + 1,
                    config.max_retries + 1,
                    delay.as_millis(),
                    e
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast() -> RetryConfig {
        RetryConfig {
            max_retries: 2,
            initial_backoff_ms: 1,
            max_backoff_ms: 5,
        }
    }

    #[test]
    fn test_backoff_is_capped() {
        let config = RetryConfig {
            max_retries: 10,
            initial_backoff_ms: 1_000,
            max_backoff_ms: 3_000,
        };
        assert!(config.backoff(8, None) <= Duration::from_millis(3_000));
        assert_eq!(config.backoff(0, Some(60)), Duration::from_millis(3_000));
    }

    #[test]
    fn test_defaults_from_empty_yaml() {
        let config: RetryConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, RetryConfig::default());
    }

    #[tokio::test]
    async fn test_retries_transient_failures() {
        let calls = AtomicU32::new(0);
        let result = with_retry(&fast(), "test", || async {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err(ModelError::RateLimited {
                    retry_after_secs: None,
                })
            } else {
                Ok("done")
            }
        })
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_budget() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retry(&fast(), "test", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ModelError::Api {
                provider: "groq".into(),
                status: 502,
                message: "bad gateway".into(),
            })
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_does_not_retry_contract_violation() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retry(&fast(), "test", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ModelError::InvalidResponse("garbage".into()))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
