//! Per-endpoint circuit breaker
//!
//! A fallback transport consults this before calling an endpoint, so an RPC
//! that keeps failing is skipped until it has had time to recover.
//! States: Closed (normal) -> Open (skipped) -> HalfOpen (one trial allowed)

use parking_lot::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Requests flow normally
    Closed,
    /// Endpoint is skipped until `open_duration` has passed
    Open,
    /// One trial request decides whether the circuit closes again
    HalfOpen,
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before the endpoint is skipped
    pub failure_threshold: u32,
    /// How long an open circuit skips the endpoint before trying it
    pub open_duration: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            open_duration: Duration::from_secs(30),
        }
    }
}

#[derive(Debug)]
struct BreakerState {
    /// Current circuit state
    state: CircuitState,
    /// Failures since the last success
    consecutive_failures: u32,
    /// When the circuit last tripped
    opened_at: Option<Instant>,
    /// A half-open trial has been handed out and not yet settled
    trial_in_flight: bool,
}

#[derive(Debug)]
pub struct CircuitBreaker {
    /// Endpoint URL, for logging
    endpoint: String,
    /// Thresholds and timings
    config: CircuitBreakerConfig,
    /// Mutable state behind a single lock
    inner: Mutex<BreakerState>,
}

/// Permission to send one request through a breaker.
///
/// Settle it with [`RequestPermit::success`] or [`RequestPermit::failure`].
/// A half-open trial permit dropped unsettled (its request was cancelled)
/// releases the trial slot so the next request can try again.
#[derive(Debug)]
pub struct RequestPermit<'a> {
    /// Breaker the permit was taken from
    breaker: &'a CircuitBreaker,
    /// Whether this permit holds the half-open trial slot
    trial: bool,
    /// Set once the outcome has been recorded
    settled: bool,
}

impl RequestPermit<'_> {
    pub fn is_trial(&self) -> bool {
        self.trial
    }

    pub fn success(mut self) {
        self.settled = true;
        self.breaker.record_success();
    }

    pub fn failure(mut self) {
        self.settled = true;
        self.breaker.record_failure();
    }
}

impl Drop for RequestPermit<'_> {
    fn drop(&mut self) {
        if self.trial && !self.settled {
            self.breaker.release_trial();
        }
    }
}

impl CircuitBreaker {
    pub fn new(endpoint: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            endpoint: endpoint.into(),
            config,
            inner: Mutex::new(BreakerState {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                opened_at: None,
                trial_in_flight: false,
            }),
        }
    }

    pub fn state(&self) -> CircuitState {
        self.inner.lock().state
    }

    /// Asks whether a request may go to this endpoint.
    ///
    /// An open circuit turns half-open once `open_duration` has passed and
    /// then hands out exactly one trial permit at a time.
    pub fn allow_request(&self) -> Option<RequestPermit<'_>> {
        let mut inner = self.inner.lock();

        let trial = match inner.state {
            CircuitState::Closed => false,
            CircuitState::Open => {
                let elapsed = inner
                    .opened_at
                    .map(|opened| opened.elapsed() >= self.config.open_duration)
                    .unwrap_or(true);
                if !elapsed {
                    debug!(endpoint = %self.endpoint, "Circuit open, skipping endpoint");
                    return None;
                }
                info!(endpoint = %self.endpoint, "Circuit half-open, sending trial request");
                inner.state = CircuitState::HalfOpen;
                inner.trial_in_flight = true;
                true
            }
            CircuitState::HalfOpen => {
                if inner.trial_in_flight {
                    return None;
                }
                inner.trial_in_flight = true;
                true
            }
        };

        Some(self.permit(trial))
    }

    /// Permit that ignores the circuit state, for when every endpoint is open
    pub fn bypass(&self) -> RequestPermit<'_> {
        self.permit(false)
    }

    fn permit(&self, trial: bool) -> RequestPermit<'_> {
        RequestPermit {
            breaker: self,
            trial,
            settled: false,
        }
    }

    fn release_trial(&self) {
        let mut inner = self.inner.lock();
        if inner.state == CircuitState::HalfOpen && inner.trial_in_flight {
            debug!(endpoint = %self.endpoint, "Trial abandoned, releasing slot");
            inner.trial_in_flight = false;
        }
    }

    pub fn record_success(&self) {
        let mut inner = self.inner.lock();
        if inner.state != CircuitState::Closed {
            info!(endpoint = %self.endpoint, "Endpoint recovered, circuit closed");
        }
        inner.state = CircuitState::Closed;
        inner.consecutive_failures = 0;
        inner.opened_at = None;
        inner.trial_in_flight = false;
    }

    pub fn record_failure(&self) {
        let mut inner = self.inner.lock();
        inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);
        inner.trial_in_flight = false;

        let trip = match inner.state {
            CircuitState::HalfOpen => true,
            CircuitState::Closed => inner.consecutive_failures >= self.config.failure_threshold,
            CircuitState::Open => false,
        };

        if trip {
            warn!(
                endpoint = %self.endpoint,
                failures = inner.consecutive_failures,
                open_duration_secs = self.config.open_duration.as_secs(),
                "Circuit tripped, endpoint will be skipped"
            );
            inner.state = CircuitState::Open;
            inner.opened_at = Some(Instant::now());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker(threshold: u32, open_ms: u64) -> CircuitBreaker {
        CircuitBreaker::new(
            "https://rpc.example",
            CircuitBreakerConfig {
                failure_threshold: threshold,
                open_duration: Duration::from_millis(open_ms),
            },
        )
    }

    #[test]
    fn test_trips_after_threshold() {
        let cb = breaker(2, 10_000);
        cb.allow_request().unwrap().failure();
        assert_eq!(cb.state(), CircuitState::Closed);
        cb.allow_request().unwrap().failure();
        assert_eq!(cb.state(), CircuitState::Open);
        assert!(cb.allow_request().is_none());
    }

    #[test]
    fn test_success_resets_failures() {
        let cb = breaker(2, 10_000);
        cb.record_failure();
        cb.record_success();
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[test]
    fn test_half_open_single_trial() {
        let cb = breaker(1, 10);
        cb.record_failure();
        std::thread::sleep(Duration::from_millis(20));

        let trial = cb.allow_request().unwrap();
        assert!(trial.is_trial());
        assert_eq!(cb.state(), CircuitState::HalfOpen);
        assert!(cb.allow_request().is_none());

        trial.success();
        assert_eq!(cb.state(), CircuitState::Closed);
        assert!(!cb.allow_request().unwrap().is_trial());
    }

    #[test]
    fn test_half_open_failure_reopens() {
        let cb = breaker(1, 10);
        cb.record_failure();
        std::thread::sleep(Duration::from_millis(20));
        cb.allow_request().unwrap().failure();

        assert_eq!(cb.state(), CircuitState::Open);
        assert!(cb.allow_request().is_none());
    }

    #[test]
    fn test_dropped_trial_releases_slot() {
        let cb = breaker(1, 10);
        cb.record_failure();
        std::thread::sleep(Duration::from_millis(20));

        let trial = cb.allow_request().unwrap();
        assert!(cb.allow_request().is_none());
        drop(trial);

        assert_eq!(cb.state(), CircuitState::HalfOpen);
        let retry = cb.allow_request().unwrap();
        assert!(retry.is_trial());
        retry.success();
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[test]
    fn test_settled_trial_is_not_released_twice() {
        let cb = breaker(1, 10);
        cb.record_failure();
        std::thread::sleep(Duration::from_millis(20));

        cb.allow_request().unwrap().failure();
        assert_eq!(cb.state(), CircuitState::Open);
        assert!(cb.allow_request().is_none());
    }

    #[test]
    fn test_bypass_ignores_open_circuit() {
        let cb = breaker(1, 10_000);
        cb.record_failure();
        assert!(cb.allow_request().is_none());

        cb.bypass().success();
        assert_eq!(cb.state(), CircuitState::Closed);
    }
}
