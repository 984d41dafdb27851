//! Fixed-interval polling past transient "service unavailable" answers.

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use log::{debug, error, warn};
use reqwest::StatusCode;
use tokio::time::Instant;

use crate::config::{DEFAULT_POLL_INTERVAL, DEFAULT_TIMEOUT, SERVICE_UNAVAILABLE};
use crate::converter::ConversionResponse;

/// How long and how often to re-issue a request that came back transient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Upper bound on the whole polling sequence.
    pub max_wait: Duration,
    /// Constant delay between attempts.
    pub interval: Duration,
    /// The only status that triggers another attempt.
    pub transient_status: StatusCode,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            max_wait: DEFAULT_TIMEOUT,
            interval: DEFAULT_POLL_INTERVAL,
            transient_status: SERVICE_UNAVAILABLE,
        }
    }
}

/// Runs `operation` until it yields a non-transient status or `max_wait`
/// runs out.
///
/// The operation is invoked afresh on every attempt. Errors it returns are
/// propagated immediately; only the transient status is polled past. When the
/// deadline is reached the last response is returned as-is, still carrying the
/// transient status, so callers have to look at the status themselves.
pub async fn poll_until_available<F, Fut>(
    operation_name: &str,
    settings: &PollSettings,
    operation: F,
) -> Result<ConversionResponse>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<ConversionResponse>>,
{
    let started = Instant::now();
    let mut attempt: usize = 1;

    loop {
        let response = operation().await?;

        if response.status() != settings.transient_status {
            debug!(
                "{}: got {} after {} attempt(s)",
                operation_name,
                response.status(),
                attempt
            );
            return Ok(response);
        }

        let elapsed = started.elapsed();
        if elapsed + settings.interval > settings.max_wait {
            error!(
                "{}: still {} after {} attempt(s) in {:?}, giving up (limit {:?})",
                operation_name,
                response.status(),
                attempt,
                elapsed,
                settings.max_wait
            );
            return Ok(response);
        }

        warn!(
            "{}: attempt {} returned {}, polling again in {:?}...",
            operation_name,
            attempt,
            response.status(),
            settings.interval
        );
        tokio::time::sleep(settings.interval).await;
        attempt += 1;
    }
}
