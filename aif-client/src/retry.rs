//! Retry with exponential backoff for idempotent reads.
//!
//! Creates, deletes and completions are never passed through here; a failed
//! write is surfaced to the caller as-is.

use aif_core::Result;
use std::{future::Future, time::Duration};

/// Backoff schedule for transient read failures.
///
/// Retry `n` (0-based) waits `initial_delay * backoff_multiplier^n`, capped at
/// `max_delay`.
#[derive(Clone, Debug, PartialEq)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Every request is sent exactly once.
    #[must_use]
    pub fn none() -> Self {
        Self { max_retries: 0, ..Self::default() }
    }

    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    #[must_use]
    pub fn with_initial_delay(mut self, initial_delay: Duration) -> Self {
        self.initial_delay = initial_delay;
        self
    }

    #[must_use]
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    #[must_use]
    pub fn with_backoff_multiplier(mut self, backoff_multiplier: f64) -> Self {
        self.backoff_multiplier = backoff_multiplier;
        self
    }

    /// Wait before retry number `retry + 1`.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let scaled =
            self.initial_delay.as_secs_f64() * self.backoff_multiplier.max(1.0).powi(exponent);
        if scaled.is_finite() && scaled < self.max_delay.as_secs_f64() {
            Duration::from_secs_f64(scaled)
        } else {
            self.max_delay
        }
    }
}

/// Run `operation`, repeating it while it fails with an error for which
/// [`aif_core::AifError::is_retryable`] holds and retries remain.
///
/// `label` names the request in the retry warnings.
pub async fn execute_with_retry<T, Op, Fut>(
    retry_config: &RetryConfig,
    label: &str,
    mut operation: Op,
) -> Result<T>
where
    Op: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut retry: u32 = 0;

    loop {
        let error = match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };

        if retry >= retry_config.max_retries || !error.is_retryable() {
            return Err(error);
        }

        let delay = retry_config.delay_for(retry);
        retry += 1;
        aif_telemetry::warn!(
            request = label,
            retry,
            max_retries = retry_config.max_retries,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "transient failure; retrying"
        );
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aif_core::AifError;
    use proptest::prelude::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::time::Instant;

    /// Fails with each scripted error in turn, then yields `value`.
    async fn scripted<T>(
        script: &Mutex<VecDeque<AifError>>,
        calls: &Mutex<u32>,
        value: T,
    ) -> Result<T> {
        *calls.lock().unwrap() += 1;
        let next = script.lock().unwrap().pop_front();
        match next {
            Some(error) => Err(error),
            None => Ok(value),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn waits_follow_the_backoff_schedule() {
        let script = Mutex::new(VecDeque::from([
            AifError::from_response(503, "busy"),
            AifError::from_response(429, "slow down"),
        ]));
        let calls = Mutex::new(0);
        let (script, calls) = (&script, &calls);
        let started = Instant::now();

        let value = execute_with_retry(&RetryConfig::default(), "GET /runs/run_1", move || {
            scripted(script, calls, "completed")
        })
        .await
        .unwrap();

        assert_eq!(value, "completed");
        assert_eq!(*calls.lock().unwrap(), 3);
        // 500ms, then 1s.
        let waited = started.elapsed();
        assert!(waited >= Duration::from_millis(1500), "waited {waited:?}");
        assert!(waited < Duration::from_millis(1600), "waited {waited:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn client_errors_are_returned_at_once() {
        let script = Mutex::new(VecDeque::from([AifError::from_response(404, "no such run")]));
        let calls = Mutex::new(0);
        let (script, calls) = (&script, &calls);

        let error = execute_with_retry(&RetryConfig::default(), "GET /runs/run_x", move || {
            scripted(script, calls, ())
        })
        .await
        .unwrap_err();

        assert!(error.is_not_found());
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn last_transient_error_is_kept_once_retries_run_out() {
        let config = RetryConfig::default().with_max_retries(2);
        let script =
            Mutex::new((0..5).map(|_| AifError::Transport("connection reset".into())).collect());
        let calls = Mutex::new(0);
        let (script, calls) = (&script, &calls);

        let error =
            execute_with_retry(&config, "GET /fine_tuning/jobs/ftjob-1", move || {
                scripted(script, calls, ())
            })
            .await
            .unwrap_err();

        assert!(matches!(error, AifError::Transport(_)));
        assert_eq!(*calls.lock().unwrap(), 3);
    }

    #[tokio::test]
    async fn none_sends_once() {
        let script = Mutex::new(VecDeque::from([AifError::from_response(503, "busy")]));
        let calls = Mutex::new(0);
        let (script, calls) = (&script, &calls);

        let error = execute_with_retry(&RetryConfig::none(), "GET /files", move || {
            scripted(script, calls, ())
        })
        .await
        .unwrap_err();

        assert_eq!(error.status(), Some(503));
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[test]
    fn delay_is_capped() {
        let config = RetryConfig::default();
        assert_eq!(config.delay_for(0), Duration::from_millis(500));
        assert_eq!(config.delay_for(3), Duration::from_secs(4));
        assert_eq!(config.delay_for(4), Duration::from_secs(8));
        assert_eq!(config.delay_for(u32::MAX), Duration::from_secs(8));
    }

    proptest! {
        #[test]
        fn delays_grow_monotonically_up_to_the_cap(
            initial_ms in 0u64..2_000,
            cap_ms in 1u64..10_000,
            multiplier in 0.5f64..4.0,
            retry in 0u32..40,
        ) {
            let config = RetryConfig::default()
                .with_initial_delay(Duration::from_millis(initial_ms))
                .with_max_delay(Duration::from_millis(cap_ms))
                .with_backoff_multiplier(multiplier);
            let current = config.delay_for(retry);
            let next = config.delay_for(retry + 1);
            prop_assert!(current <= config.max_delay);
            prop_assert!(next + Duration::from_micros(1) >= current);
        }
    }
}
