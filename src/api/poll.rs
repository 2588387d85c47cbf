// Copyright 2025 Adobe. All rights reserved.
// This file is licensed to you under the Apache License,
// Version 2.0 (http://www.apache.org/licenses/LICENSE-2.0)
// or the MIT license (http://opensource.org/licenses/MIT),
// at your option.
//
// Unless required by applicable law or agreed to in writing,
// this software is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR REPRESENTATIONS OF ANY KIND, either express or
// implied. See the LICENSE-MIT and LICENSE-APACHE files for the
// specific language governing permissions and limitations under
// each license.

//! Bounded polling until a remote resource reaches a terminal state.
//!
//! Cloud mutations are asynchronous: create returns while the server is
//! still building, destroy returns while it is still deleting. Callers that
//! need "running" or "gone" re-query until the provider reports a terminal
//! state, with a growing delay between probes and a hard overall deadline.

use std::cmp::min;
use std::future::Future;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::api::error::{ApiError, ApiResult};

/// Timing knobs for [`poll_until`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    /// Delay before the second probe. Grows by half per round.
    pub period: Duration,
    /// Ceiling for the growing period.
    pub max_period: Duration,
    /// Overall deadline for the whole poll.
    pub timeout: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_secs(2),
            max_period: Duration::from_secs(10),
            timeout: Duration::from_secs(300),
        }
    }
}

impl PollConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    pub fn with_max_period(mut self, max_period: Duration) -> Self {
        self.max_period = max_period;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Verdict of one probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollDecision<T> {
    /// Terminal state reached; carries the final observation.
    Done(T),
    /// Not there yet, probe again after the delay.
    Continue,
    /// The resource reached a failure state; polling longer cannot help.
    Failed(String),
}

fn grow(period: Duration, max: Duration) -> Duration {
    min(period * 3 / 2, max)
}

/// Re-run `probe` until it reports [`PollDecision::Done`] or the deadline
/// passes.
///
/// `what` names the awaited condition in errors and logs, e.g.
/// `"node web-1 running"`. Probe errors propagate immediately; transient
/// tolerance belongs inside the probe, which knows which errors are
/// expected mid-transition (a 404 while a node is deleting, say).
///
/// # Errors
///
/// [`ApiError::PollTimeoutError`] when the deadline passes with the probe
/// still reporting `Continue`, [`ApiError::StateError`] when the probe
/// reports `Failed`.
pub async fn poll_until<T, F, Fut>(config: &PollConfig, what: &str, mut probe: F) -> ApiResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ApiResult<PollDecision<T>>>,
{
    let start = Instant::now();
    let mut period = config.period;
    let mut rounds = 0u32;

    loop {
        rounds += 1;
        match probe().await? {
            PollDecision::Done(value) => {
                debug!(
                    "{} reached after {} probe(s) in {:?}",
                    what,
                    rounds,
                    start.elapsed()
                );
                return Ok(value);
            }
            PollDecision::Failed(state) => {
                return Err(ApiError::StateError {
                    resource: what.to_string(),
                    state,
                });
            }
            PollDecision::Continue => {}
        }

        let elapsed = start.elapsed();
        if elapsed >= config.timeout {
            return Err(ApiError::PollTimeoutError {
                what: what.to_string(),
                waited_secs: elapsed.as_secs(),
            });
        }

        let delay = min(period, config.timeout - elapsed);
        trace!("{} not ready (probe {}), sleeping {:?}", what, rounds, delay);
        tokio::time::sleep(delay).await;
        period = grow(period, config.max_period);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn fast() -> PollConfig {
        PollConfig::new()
            .with_period(Duration::from_millis(5))
            .with_max_period(Duration::from_millis(20))
            .with_timeout(Duration::from_millis(500))
    }

    #[test]
    fn test_default_config() {
        let config = PollConfig::default();
        assert_eq!(config.period, Duration::from_secs(2));
        assert_eq!(config.max_period, Duration::from_secs(10));
        assert_eq!(config.timeout, Duration::from_secs(300));
    }

    #[test]
    fn test_period_growth_is_capped() {
        let max = Duration::from_secs(10);
        let mut period = Duration::from_secs(2);
        let mut seen = Vec::new();
        for _ in 0..6 {
            period = grow(period, max);
            seen.push(period);
        }
        assert_eq!(seen[0], Duration::from_secs(3));
        assert_eq!(seen[1], Duration::from_millis(4500));
        // Settles at the ceiling
        assert_eq!(*seen.last().unwrap(), max);
    }

    #[tokio::test]
    async fn test_poll_done_immediately() {
        let result = poll_until(&fast(), "value ready", || async {
            Ok(PollDecision::Done(42))
        })
        .await;

        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_poll_continues_until_done() {
        let probes = Arc::new(AtomicUsize::new(0));
        let probes_clone = Arc::clone(&probes);

        let result = poll_until(&fast(), "node running", move || {
            let probes = Arc::clone(&probes_clone);
            async move {
                if probes.fetch_add(1, Ordering::SeqCst) < 2 {
                    Ok(PollDecision::Continue)
                } else {
                    Ok(PollDecision::Done("running"))
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "running");
        assert_eq!(probes.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_poll_failed_state() {
        let result: ApiResult<()> = poll_until(&fast(), "node web-1 running", || async {
            Ok(PollDecision::Failed("ERROR".to_string()))
        })
        .await;

        match result.unwrap_err() {
            ApiError::StateError { resource, state } => {
                assert_eq!(resource, "node web-1 running");
                assert_eq!(state, "ERROR");
            }
            other => panic!("expected StateError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_poll_timeout() {
        let config = PollConfig::new()
            .with_period(Duration::from_millis(5))
            .with_max_period(Duration::from_millis(5))
            .with_timeout(Duration::from_millis(40));

        let probes = Arc::new(AtomicUsize::new(0));
        let probes_clone = Arc::clone(&probes);

        let result: ApiResult<()> = poll_until(&config, "node gone", move || {
            let probes = Arc::clone(&probes_clone);
            async move {
                probes.fetch_add(1, Ordering::SeqCst);
                Ok(PollDecision::Continue)
            }
        })
        .await;

        match result.unwrap_err() {
            ApiError::PollTimeoutError { what, .. } => assert_eq!(what, "node gone"),
            other => panic!("expected PollTimeoutError, got {:?}", other),
        }
        // Deadline, not probe count, ended the loop
        assert!(probes.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn test_poll_probe_error_propagates() {
        let probes = Arc::new(AtomicUsize::new(0));
        let probes_clone = Arc::clone(&probes);

        let result: ApiResult<()> = poll_until(&fast(), "node running", move || {
            let probes = Arc::clone(&probes_clone);
            async move {
                probes.fetch_add(1, Ordering::SeqCst);
                Err(ApiError::StatusError {
                    status: 500,
                    message: "backend down".to_string(),
                })
            }
        })
        .await;

        assert_eq!(result.unwrap_err().status(), Some(500));
        assert_eq!(probes.load(Ordering::SeqCst), 1);
    }
}
