// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Fixed-interval polling until an observed value satisfies a predicate.
//!
//! Every "create a resource, then wait for its status" step goes through
//! [`wait_for`]. The caller supplies a typed accessor returning the current
//! value (or `None` when there is nothing to observe yet) and a predicate
//! deciding when that value is good enough.

use crate::constants::wait::{POLL_INTERVAL_SECS, PROGRESS_EVERY, TIMEOUT_SECS};
use crate::error::{Result, SetupError};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

/// Polling cadence and budget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    pub interval: Duration,
    pub timeout: Duration,
    /// Log a progress line every this many polls (0 disables progress logging)
    pub progress_every: u32,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(POLL_INTERVAL_SECS),
            timeout: Duration::from_secs(TIMEOUT_SECS),
            progress_every: PROGRESS_EVERY,
        }
    }
}

impl WaitOptions {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self {
            interval,
            timeout,
            ..Default::default()
        }
    }

    pub fn from_secs(interval: u64, timeout: u64) -> Self {
        Self::new(Duration::from_secs(interval), Duration::from_secs(timeout))
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self { timeout, ..self }
    }
}

/// Outcome of a successful wait
#[derive(Debug, Clone)]
pub struct WaitReport<T> {
    pub polls: u32,
    pub elapsed: Duration,
    pub value: T,
}

/// What to do when a wait (or any step) fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Propagate the error to the caller
    #[default]
    Fail,
    /// Log a warning and carry on without a value
    Warn,
}

impl FailurePolicy {
    pub fn apply<T>(self, result: Result<T>) -> Result<Option<T>> {
        match (self, result) {
            (_, Ok(value)) => Ok(Some(value)),
            (FailurePolicy::Fail, Err(e)) => Err(e),
            (FailurePolicy::Warn, Err(e)) => {
                warn!("{}; continuing", e);
                Ok(None)
            }
        }
    }
}

/// Poll `observe` until `ready` accepts its value or the timeout elapses.
///
/// The first poll happens immediately. A probe error is logged and treated
/// like "nothing observed yet". The last poll happens at the timeout boundary.
pub async fn wait_for<T, F, Fut, P>(
    what: &str,
    options: &WaitOptions,
    mut observe: F,
    mut ready: P,
) -> Result<WaitReport<T>>
where
    T: Debug,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
    P: FnMut(&T) -> bool,
{
    let start = Instant::now();
    let mut polls = 0u32;
    let mut last_observed: Option<String> = None;

    info!(
        "Waiting for {} (timeout {}s)...",
        what,
        options.timeout.as_secs()
    );

    loop {
        polls += 1;

        match observe().await {
            Ok(Some(value)) if ready(&value) => {
                let elapsed = start.elapsed();
                info!("{} ready after {}s", what, elapsed.as_secs());
                return Ok(WaitReport {
                    polls,
                    elapsed,
                    value,
                });
            }
            Ok(Some(value)) => {
                debug!("{}: observed {:?}", what, value);
                last_observed = Some(format!("{:?}", value));
            }
            Ok(None) => {
                debug!("{}: nothing observed yet", what);
            }
            Err(e) => {
                warn!("Error while waiting for {}: {}, retrying...", what, e);
            }
        }

        let elapsed = start.elapsed();
        if elapsed >= options.timeout {
            return Err(SetupError::Timeout {
                what: what.to_string(),
                waited: elapsed,
                last_observed,
            });
        }

        if options.progress_every > 0 && polls % options.progress_every == 0 {
            info!(
                "Still waiting for {} ({}s/{}s, current: {})",
                what,
                elapsed.as_secs(),
                options.timeout.as_secs(),
                last_observed.as_deref().unwrap_or("<none>")
            );
        }

        sleep(options.interval.min(options.timeout - elapsed)).await;
    }
}
