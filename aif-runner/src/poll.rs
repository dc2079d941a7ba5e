//! Bounded polling of remote resources until they reach a terminal status.

use aif_core::{AifError, FineTuningJob, Result, Run};
use aif_telemetry::Instrument;
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// A remote resource whose status is observed by polling.
pub trait Pollable {
    fn status_label(&self) -> String;
    fn is_terminal(&self) -> bool;
}

impl Pollable for Run {
    fn status_label(&self) -> String {
        self.status.to_string()
    }

    fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

impl Pollable for FineTuningJob {
    fn status_label(&self) -> String {
        self.status.to_string()
    }

    fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Delay schedule and limits for a poll loop.
///
/// The n-th wait is `initial_interval * multiplier^n`, capped at
/// `max_interval`, then spread by up to `jitter` of itself in either
/// direction. The loop gives up once `max_attempts` reads were made or the
/// next wait would cross `deadline`.
#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    pub initial_interval: Duration,
    pub max_interval: Duration,
    pub multiplier: f64,
    pub jitter: f64,
    pub max_attempts: Option<u32>,
    pub deadline: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::fine_tuning()
    }
}

impl PollPolicy {
    /// Fine-tuning jobs take minutes to hours.
    pub fn fine_tuning() -> Self {
        Self {
            initial_interval: Duration::from_secs(30),
            max_interval: Duration::from_secs(300),
            multiplier: 1.5,
            jitter: 0.1,
            max_attempts: None,
            deadline: Some(Duration::from_secs(24 * 60 * 60)),
        }
    }

    /// Agent runs usually finish within seconds.
    pub fn run() -> Self {
        Self {
            initial_interval: Duration::from_secs(1),
            max_interval: Duration::from_secs(10),
            multiplier: 1.5,
            jitter: 0.1,
            max_attempts: None,
            deadline: Some(Duration::from_secs(30 * 60)),
        }
    }

    /// Constant interval, no jitter, no limits.
    pub fn fixed(interval: Duration) -> Self {
        Self {
            initial_interval: interval,
            max_interval: interval,
            multiplier: 1.0,
            jitter: 0.0,
            max_attempts: None,
            deadline: None,
        }
    }

    #[must_use]
    pub fn with_initial_interval(mut self, interval: Duration) -> Self {
        self.initial_interval = interval;
        self.max_interval = self.max_interval.max(interval);
        self
    }

    #[must_use]
    pub fn with_max_interval(mut self, interval: Duration) -> Self {
        self.max_interval = interval;
        self
    }

    #[must_use]
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    #[must_use]
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter;
        self
    }

    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: Option<u32>) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    #[must_use]
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Backoff before jitter for the wait following read number `wait_index + 1`.
    pub fn base_delay(&self, wait_index: u32) -> Duration {
        let multiplier = self.multiplier.max(1.0);
        let exponent = i32::try_from(wait_index).unwrap_or(i32::MAX);
        let scaled = self.initial_interval.as_secs_f64() * multiplier.powi(exponent);
        let capped = scaled.min(self.max_interval.as_secs_f64());
        if capped.is_finite() { Duration::from_secs_f64(capped) } else { self.max_interval }
    }

    /// [`Self::base_delay`] with jitter applied.
    pub fn delay(&self, wait_index: u32) -> Duration {
        let base = self.base_delay(wait_index);
        let jitter = self.jitter.clamp(0.0, 1.0);
        if jitter == 0.0 || base.is_zero() {
            return base;
        }
        let factor = rand::thread_rng().gen_range((1.0 - jitter)..=(1.0 + jitter));
        Duration::from_secs_f64(base.as_secs_f64() * factor)
    }
}

/// The terminal value observed and how many reads it took.
#[derive(Debug, Clone, PartialEq)]
pub struct PollOutcome<T> {
    pub value: T,
    pub attempts: u32,
}

/// Read `fetch` until it yields a terminal value.
///
/// The first read happens immediately. `observe` sees every value read,
/// including the terminal one, together with its 1-based attempt number.
pub async fn poll_until<T, Fetch, Fut, Observe>(
    policy: &PollPolicy,
    resource: &'static str,
    id: &str,
    mut fetch: Fetch,
    mut observe: Observe,
) -> Result<PollOutcome<T>>
where
    T: Pollable,
    Fetch: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    Observe: FnMut(&T, u32) -> Result<()>,
{
    let span = aif_telemetry::poll_span(resource, id);

    async move {
        let started = Instant::now();
        let mut attempts: u32 = 0;

        loop {
            let value = fetch().await?;
            attempts += 1;
            observe(&value, attempts)?;

            let status = value.status_label();
            tracing::info!(attempt = attempts, status = %status, "polled");

            if value.is_terminal() {
                return Ok(PollOutcome { value, attempts });
            }

            let exhausted = || AifError::PollExhausted {
                resource,
                id: id.to_string(),
                attempts,
                last_status: status.clone(),
            };

            if policy.max_attempts.is_some_and(|max| attempts >= max) {
                return Err(exhausted());
            }

            let delay = policy.delay(attempts - 1);
            if let Some(deadline) = policy.deadline {
                if started.elapsed() + delay > deadline {
                    return Err(exhausted());
                }
            }

            tracing::debug!(delay_ms = delay.as_millis() as u64, "waiting before next poll");
            tokio::time::sleep(delay).await;
        }
    }
    .instrument(span)
    .await
}
