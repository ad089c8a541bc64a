//! Retry policy for outbound Discord calls.
//!
//! Every call the engine makes goes through `RetryPolicy::call`. Transient
//! failures (gateway unavailable) are retried after a fixed wait, anything
//! else is returned as fatal straight away.

use std::future::Future;
use std::time::Duration;

use backon::{ConstantBuilder, Retryable};
use tracing::warn;

use crate::common::error::{CallError, CallResult, TransportError};
use crate::config::types::NotifierConfig;

/// Bounded fixed-interval retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, first try included.
    max_attempts: usize,
    backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    pub fn from_config(config: &NotifierConfig) -> Self {
        Self::new(config.max_attempts, config.backoff())
    }

    #[cfg(test)]
    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    fn backoff_builder(&self) -> ConstantBuilder {
        ConstantBuilder::default()
            .with_delay(self.backoff)
            .with_max_times(self.max_attempts - 1)
    }

    /// Run `op` until it succeeds, fails fatally, or runs out of attempts.
    pub async fn call<T, F, Fut>(&self, op: F) -> CallResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, TransportError>>,
    {
        self.call_notify(op, |_, _| {}).await
    }

    /// Like `call`, invoking `on_retry` before every backoff wait.
    pub async fn call_notify<T, F, Fut, N>(&self, op: F, mut on_retry: N) -> CallResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, TransportError>>,
        N: FnMut(&TransportError, Duration),
    {
        op.retry(self.backoff_builder())
            .sleep(tokio::time::sleep)
            .when(TransportError::is_transient)
            .notify(|error: &TransportError, delay: Duration| {
                warn!("{}, retrying in {:.1}s", error, delay.as_secs_f64());
                on_retry(error, delay);
            })
            .await
            .map_err(|error| match error {
                TransportError::Fatal { message } => CallError::Fatal { message },
                last_error @ TransportError::Transient { .. } => CallError::RetryExhausted {
                    attempts: self.max_attempts,
                    last_error,
                },
            })
    }
}
