//! Sliding-window request throttling.
//!
//! Generalizes the usual per-source fixed-interval limiter into a
//! trailing-window budget: at most `max_requests` admissions within any
//! `window`. What happens when the budget is exhausted depends on the
//! configured [`ThrottlePolicy`]. The recorded timestamp sequence is the
//! only state shared between concurrent callers; every
//! purge-then-check-then-append runs as one critical section so two
//! callers can never both observe a free slot and overfill the window.
//!
//! The mutex is never held across an await: blocking policies compute
//! the wait, release the lock, sleep, and re-check (another caller may
//! have taken the slot in the meantime). Dropping the future cancels a
//! wait cleanly.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Mutex;

use backon::{ExponentialBuilder, Retryable};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::{sleep, Duration, Instant};

use crate::error::ResolveError;

/// How the gate reacts when the request budget is exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ThrottlePolicy {
    /// Block until the oldest timestamp leaves the window, then re-check.
    /// Never fails on budget grounds.
    Wait,
    /// Fail immediately with a rate-limit error.
    FailFast,
    /// Retry with exponential backoff up to a fixed ceiling, then fail
    /// wrapping the last gate rejection.
    RetryWithBackoff,
}

impl fmt::Display for ThrottlePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ThrottlePolicy::Wait => "wait",
            ThrottlePolicy::FailFast => "fail-fast",
            ThrottlePolicy::RetryWithBackoff => "retry-with-backoff",
        };
        f.write_str(name)
    }
}

/// A single failed reservation attempt: the window is full.
#[derive(Debug, Clone, Error)]
#[error("request budget exhausted ({in_window}/{max_requests} in window)")]
pub struct BudgetExhausted {
    /// Admissions currently inside the trailing window.
    pub in_window: usize,
    /// Configured budget.
    pub max_requests: usize,
    /// Time until the oldest admission leaves the window.
    pub retry_after: Duration,
}

/// Point-in-time view of the window, for diagnostics. Reading one never
/// mutates gate state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateWindowSnapshot {
    /// Admissions currently inside the trailing window.
    pub in_window: usize,
    /// Slots left before the budget is exhausted.
    pub remaining: usize,
    /// When the next slot frees up; `None` if one is free now.
    pub next_slot_in: Option<Duration>,
}

/// Sliding-window rate gate.
///
/// One instance lives for the process lifetime and is shared by every
/// concurrent resolution pipeline. Optionally scoped to a single host:
/// when a scope is set, admissions for other hosts pass through
/// untouched.
#[derive(Debug)]
pub struct RateGate {
    max_requests: usize,
    window: Duration,
    policy: ThrottlePolicy,
    scope_host: Option<String>,
    backoff_base: Duration,
    backoff_max: Duration,
    backoff_retries: usize,
    timestamps: Mutex<VecDeque<Instant>>,
}

impl RateGate {
    /// Create a gate admitting at most `max_requests` per `window`.
    ///
    /// A zero budget would deadlock every policy, so it is clamped to 1.
    #[must_use]
    pub fn new(max_requests: usize, window: Duration, policy: ThrottlePolicy) -> Self {
        Self {
            max_requests: max_requests.max(1),
            window,
            policy,
            scope_host: None,
            backoff_base: Duration::from_millis(250),
            backoff_max: Duration::from_secs(2),
            backoff_retries: 3,
            timestamps: Mutex::new(VecDeque::new()),
        }
    }

    /// Gate only requests to `host`; everything else passes through.
    #[must_use]
    pub fn scoped_to(mut self, host: impl Into<String>) -> Self {
        self.scope_host = Some(host.into());
        self
    }

    /// Tune the `RetryWithBackoff` schedule. Each failed attempt waits
    /// `min(base * 2^attempt, max)`; `retries` is the retry ceiling.
    #[must_use]
    pub fn with_backoff(mut self, base: Duration, max: Duration, retries: usize) -> Self {
        self.backoff_base = base;
        self.backoff_max = max;
        self.backoff_retries = retries;
        self
    }

    /// Purge expired timestamps, check the budget, and append, all in
    /// one critical section. On failure reports how long until the
    /// oldest admission expires.
    fn try_reserve(&self) -> Result<(), BudgetExhausted> {
        let now = Instant::now();
        let mut stamps = self
            .timestamps
            .lock()
            .expect("rate window mutex poisoned");
        while let Some(oldest) = stamps.front() {
            if now.duration_since(*oldest) >= self.window {
                stamps.pop_front();
            } else {
                break;
            }
        }
        if stamps.len() < self.max_requests {
            stamps.push_back(now);
            return Ok(());
        }
        // Window is full, so a front element exists.
        let retry_after = stamps
            .front()
            .map(|oldest| self.window.saturating_sub(now.duration_since(*oldest)))
            .unwrap_or_default();
        Err(BudgetExhausted {
            in_window: stamps.len(),
            max_requests: self.max_requests,
            retry_after,
        })
    }

    /// Admit one request to `host`, applying the configured policy.
    ///
    /// Pass-through when a scope host is configured and `host` differs.
    ///
    /// # Errors
    /// `RateLimited` under `FailFast` (immediately) or
    /// `RetryWithBackoff` (after the retry ceiling). `Wait` never fails.
    pub async fn admit(&self, host: Option<&str>) -> Result<(), ResolveError> {
        if let Some(scope) = &self.scope_host {
            let gated = host.is_some_and(|h| h.eq_ignore_ascii_case(scope));
            if !gated {
                return Ok(());
            }
        }

        match self.policy {
            ThrottlePolicy::Wait => {
                loop {
                    match self.try_reserve() {
                        Ok(()) => return Ok(()),
                        Err(exhausted) => {
                            log::debug!(
                                "rate window full, waiting {:?} for a slot",
                                exhausted.retry_after
                            );
                            sleep(exhausted.retry_after).await;
                            // Re-check: a concurrent caller may have
                            // taken the freed slot while we slept.
                        }
                    }
                }
            }
            ThrottlePolicy::FailFast => self.try_reserve().map_err(|cause| {
                ResolveError::RateLimited {
                    policy: ThrottlePolicy::FailFast,
                    cause,
                }
            }),
            ThrottlePolicy::RetryWithBackoff => {
                let schedule = ExponentialBuilder::default()
                    .with_min_delay(self.backoff_base)
                    .with_max_delay(self.backoff_max)
                    .with_max_times(self.backoff_retries);
                (|| async { self.try_reserve() })
                    .retry(schedule)
                    .notify(|err: &BudgetExhausted, dur: Duration| {
                        log::debug!("rate window full, backing off {:?}: {}", dur, err);
                    })
                    .await
                    .map_err(|cause| ResolveError::RateLimited {
                        policy: ThrottlePolicy::RetryWithBackoff,
                        cause,
                    })
            }
        }
    }

    /// Non-mutating view of the window. Expired entries are excluded
    /// from the counts but not removed.
    pub fn snapshot(&self) -> RateWindowSnapshot {
        let now = Instant::now();
        let stamps = self
            .timestamps
            .lock()
            .expect("rate window mutex poisoned");
        let mut live = stamps
            .iter()
            .filter(|t| now.duration_since(**t) < self.window);
        let oldest_live = live.next().copied();
        let in_window = oldest_live.map_or(0, |_| 1 + live.count());
        let remaining = self.max_requests.saturating_sub(in_window);
        let next_slot_in = if remaining > 0 {
            None
        } else {
            oldest_live.map(|oldest| self.window.saturating_sub(now.duration_since(oldest)))
        };
        RateWindowSnapshot {
            in_window,
            remaining,
            next_slot_in,
        }
    }

    /// Clear all recorded timestamps.
    pub fn reset(&self) {
        self.timestamps
            .lock()
            .expect("rate window mutex poisoned")
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate(max: usize, window_ms: u64, policy: ThrottlePolicy) -> RateGate {
        RateGate::new(max, Duration::from_millis(window_ms), policy)
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_policy_spreads_concurrent_requests() {
        let gate = gate(2, 1000, ThrottlePolicy::Wait);
        let start = Instant::now();

        let (a, b, c) = tokio::join!(gate.admit(None), gate.admit(None), gate.admit(None));
        assert!(a.is_ok());
        assert!(b.is_ok());
        assert!(c.is_ok());

        // Two slots are free immediately; the third had to wait out the
        // full window.
        assert!(start.elapsed() >= Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_policy_is_immediate_under_budget() {
        let gate = gate(3, 1000, ThrottlePolicy::Wait);
        let start = Instant::now();
        for _ in 0..3 {
            gate.admit(None).await.unwrap();
        }
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fail_fast_rejects_within_window() {
        let gate = gate(1, 1000, ThrottlePolicy::FailFast);
        gate.admit(None).await.unwrap();

        let second = gate.admit(None).await;
        match second {
            Err(ResolveError::RateLimited { policy, cause }) => {
                assert_eq!(policy, ThrottlePolicy::FailFast);
                assert_eq!(cause.in_window, 1);
                assert_eq!(cause.max_requests, 1);
            }
            other => panic!("expected RateLimited, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fail_fast_admits_after_window_elapses() {
        let gate = gate(1, 1000, ThrottlePolicy::FailFast);
        gate.admit(None).await.unwrap();
        assert!(gate.admit(None).await.is_err());

        tokio::time::advance(Duration::from_millis(1001)).await;
        assert!(gate.admit(None).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_succeeds_once_a_slot_frees() {
        let gate = gate(1, 300, ThrottlePolicy::RetryWithBackoff).with_backoff(
            Duration::from_millis(200),
            Duration::from_secs(1),
            3,
        );
        gate.admit(None).await.unwrap();

        // First retry lands at 200ms (still inside the 300ms window),
        // the second at 600ms (slot free).
        let start = Instant::now();
        gate.admit(None).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_fails_when_window_never_frees() {
        let gate = gate(1, 60 * 60 * 1000, ThrottlePolicy::RetryWithBackoff).with_backoff(
            Duration::from_millis(100),
            Duration::from_millis(400),
            3,
        );
        gate.admit(None).await.unwrap();

        let second = gate.admit(None).await;
        match second {
            Err(ResolveError::RateLimited { policy, cause }) => {
                assert_eq!(policy, ThrottlePolicy::RetryWithBackoff);
                assert_eq!(cause.in_window, 1);
            }
            other => panic!("expected RateLimited, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_scoped_gate_passes_other_hosts_through() {
        let gate = gate(1, 1000, ThrottlePolicy::FailFast).scoped_to("api.example.com");
        gate.admit(Some("api.example.com")).await.unwrap();

        // Other hosts (and host-less requests) are not gated.
        for _ in 0..5 {
            gate.admit(Some("cdn.example.net")).await.unwrap();
            gate.admit(None).await.unwrap();
        }

        // The scoped host is still over budget.
        assert!(gate.admit(Some("api.example.com")).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_reports_without_mutating() {
        let gate = gate(2, 1000, ThrottlePolicy::FailFast);
        assert_eq!(
            gate.snapshot(),
            RateWindowSnapshot {
                in_window: 0,
                remaining: 2,
                next_slot_in: None
            }
        );

        gate.admit(None).await.unwrap();
        gate.admit(None).await.unwrap();
        let snap = gate.snapshot();
        assert_eq!(snap.in_window, 2);
        assert_eq!(snap.remaining, 0);
        assert_eq!(snap.next_slot_in, Some(Duration::from_millis(1000)));

        // Snapshots do not consume slots or purge entries.
        assert_eq!(gate.snapshot().in_window, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_excludes_expired_entries() {
        let gate = gate(2, 1000, ThrottlePolicy::FailFast);
        gate.admit(None).await.unwrap();
        tokio::time::advance(Duration::from_millis(1500)).await;
        let snap = gate.snapshot();
        assert_eq!(snap.in_window, 0);
        assert_eq!(snap.remaining, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_clears_the_window() {
        let gate = gate(1, 1000, ThrottlePolicy::FailFast);
        gate.admit(None).await.unwrap();
        assert!(gate.admit(None).await.is_err());

        gate.reset();
        assert!(gate.admit(None).await.is_ok());
    }

    #[test]
    fn test_zero_budget_is_clamped() {
        let gate = RateGate::new(0, Duration::from_secs(1), ThrottlePolicy::FailFast);
        assert!(gate.try_reserve().is_ok());
    }

    #[test]
    fn test_policy_display() {
        assert_eq!(ThrottlePolicy::Wait.to_string(), "wait");
        assert_eq!(ThrottlePolicy::FailFast.to_string(), "fail-fast");
        assert_eq!(
            ThrottlePolicy::RetryWithBackoff.to_string(),
            "retry-with-backoff"
        );
    }

    #[test]
    fn test_policy_deserializes_kebab_case() {
        let p: ThrottlePolicy = serde_json::from_str("\"retry-with-backoff\"").unwrap();
        assert_eq!(p, ThrottlePolicy::RetryWithBackoff);
    }
}
