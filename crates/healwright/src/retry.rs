//! Bounded retry with backoff for idempotent page actions.
//!
//! ```text
//!              ┌────────────┐  ok   ┌───────────┐
//!   start ───► │ Attempting │ ────► │ Succeeded │
//!              └────────────┘       └───────────┘
//!                │  ▲     │ err, attempts left
//!   err, budget  │  │     ▼
//!   spent or     │  │  ┌─────────┐
//!   terminal     │  └──│ Waiting │  sleep(backoff.delay(n))
//!                ▼     └─────────┘
//!           ┌───────────┐
//!           │ Exhausted │
//!           └───────────┘
//! ```
//!
//! Sleeps go through a [`Sleeper`] so tests can record the delays instead
//! of waiting them out.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, warn};

use crate::result::{HealError, HealResult};

/// Default number of attempts (first try included)
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default base delay between attempts (500ms)
pub const DEFAULT_BASE_DELAY_MS: u64 = 500;

/// Upper bound on any single backoff delay (60 seconds)
pub const MAX_BACKOFF_MS: u64 = 60_000;

// =============================================================================
// BACKOFF
// =============================================================================

/// How the delay grows with the attempt number
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backoff {
    /// `base × n`
    #[default]
    Linear,
    /// `base × 2^(n-1)`
    Exponential,
}

impl Backoff {
    /// Delay after failed attempt `attempt` (1-based), capped at [`MAX_BACKOFF_MS`]
    #[must_use]
    pub fn delay(self, base: Duration, attempt: u32) -> Duration {
        let base_ms = u64::try_from(base.as_millis()).unwrap_or(u64::MAX);
        let n = u64::from(attempt.max(1));
        let ms = match self {
            Self::Linear => base_ms.saturating_mul(n),
            Self::Exponential => {
                let exponent = u32::try_from(n - 1).unwrap_or(u32::MAX);
                base_ms.saturating_mul(2u64.saturating_pow(exponent))
            }
        };
        Duration::from_millis(ms.min(MAX_BACKOFF_MS))
    }
}

// =============================================================================
// POLICY
// =============================================================================

/// Retry budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Attempts including the first
    pub max_attempts: u32,
    /// Base delay in milliseconds
    pub base_delay_ms: u64,
    /// Growth of the delay
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            backoff: Backoff::Linear,
        }
    }
}

impl RetryPolicy {
    /// Set maximum attempts
    #[must_use]
    pub const fn with_max_attempts(mut self, max: u32) -> Self {
        self.max_attempts = max;
        self
    }

    /// Set base delay
    #[must_use]
    pub const fn with_base_delay_ms(mut self, ms: u64) -> Self {
        self.base_delay_ms = ms;
        self
    }

    /// Set backoff growth
    #[must_use]
    pub const fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Single attempt, no waiting
    #[must_use]
    pub const fn once() -> Self {
        Self {
            max_attempts: 1,
            base_delay_ms: 0,
            backoff: Backoff::Linear,
        }
    }

    /// Base delay as Duration
    #[must_use]
    pub const fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    /// Delay after failed attempt `attempt`
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff.delay(self.base_delay(), attempt)
    }

    /// Reject budgets that can never run
    pub fn validate(&self) -> HealResult<()> {
        if self.max_attempts == 0 {
            return Err(HealError::config("retry.max_attempts must be at least 1"));
        }
        Ok(())
    }
}

// =============================================================================
// STATE
// =============================================================================

/// Phase of a retry loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RetryPhase {
    /// Invoking the action
    Attempting,
    /// Sleeping before the next attempt
    Waiting,
    /// The action succeeded
    Succeeded,
    /// Budget spent or a terminal error seen
    Exhausted,
}

/// Progress of one retry loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryState {
    /// Current attempt, 1-based, never above `max_attempts`
    pub attempt: u32,
    /// Attempt budget
    pub max_attempts: u32,
    /// Delay chosen before the next attempt
    pub delay: Duration,
    /// Message of the last failure
    pub last_error: Option<String>,
    /// Current phase
    pub phase: RetryPhase,
}

impl RetryState {
    /// Fresh state at attempt 1
    #[must_use]
    pub fn new(max_attempts: u32) -> Self {
        Self {
            attempt: 1,
            max_attempts: max_attempts.max(1),
            delay: Duration::ZERO,
            last_error: None,
            phase: RetryPhase::Attempting,
        }
    }

    /// Attempting -> Succeeded
    pub fn succeed(&mut self) {
        self.phase = RetryPhase::Succeeded;
    }

    /// Attempting -> Waiting or Exhausted
    pub fn fail(&mut self, error: &HealError, policy: &RetryPolicy) {
        self.last_error = Some(error.to_string());
        if !error.is_recoverable() || self.attempt >= self.max_attempts {
            self.phase = RetryPhase::Exhausted;
        } else {
            self.delay = policy.delay_after(self.attempt);
            self.phase = RetryPhase::Waiting;
        }
    }

    /// Waiting -> Attempting
    pub fn resume(&mut self) {
        if self.phase == RetryPhase::Waiting {
            self.attempt += 1;
            self.phase = RetryPhase::Attempting;
        }
    }
}

// =============================================================================
// SLEEPER
// =============================================================================

/// Source of backoff sleeps
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Suspend for `duration`
    async fn sleep(&self, duration: Duration);
}

#[async_trait]
impl<T: Sleeper + ?Sized> Sleeper for &T {
    async fn sleep(&self, duration: Duration) {
        (**self).sleep(duration).await;
    }
}

/// Sleeps on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Records requested sleeps without waiting
///
/// Clones share one log, so a clone handed to a retrier can be inspected
/// from the test afterwards.
#[derive(Debug, Clone, Default)]
pub struct RecordingSleeper {
    slept: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    /// Create an empty recorder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every requested sleep, in order
    pub fn durations(&self) -> Vec<Duration> {
        self.slept.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Sum of requested sleeps
    pub fn total(&self) -> Duration {
        self.durations().iter().sum()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.slept
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(duration);
    }
}

// =============================================================================
// RETRIER
// =============================================================================

/// Runs an action under a [`RetryPolicy`]
#[derive(Debug, Clone)]
pub struct Retrier<S = TokioSleeper> {
    policy: RetryPolicy,
    sleeper: S,
}

impl Retrier<TokioSleeper> {
    /// Retrier sleeping on the tokio timer
    #[must_use]
    pub const fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            sleeper: TokioSleeper,
        }
    }
}

impl<S: Sleeper> Retrier<S> {
    /// Retrier with a custom sleeper
    #[must_use]
    pub const fn with_sleeper(policy: RetryPolicy, sleeper: S) -> Self {
        Self { policy, sleeper }
    }

    /// Active policy
    #[must_use]
    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Invoke `action` until it succeeds or the budget is spent
    ///
    /// `action` receives the 1-based attempt number. Recoverable errors
    /// are retried after the backoff delay; any other error is returned
    /// unchanged. Exhaustion yields [`HealError::RetryExhausted`] wrapping
    /// the last error.
    pub async fn run<T, F, Fut>(&self, label: &str, mut action: F) -> HealResult<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = HealResult<T>>,
    {
        let mut state = RetryState::new(self.policy.max_attempts);
        loop {
            match action(state.attempt).await {
                Ok(value) => {
                    state.succeed();
                    if state.attempt > 1 {
                        debug!(label, attempt = state.attempt, "succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) => {
                    state.fail(&err, &self.policy);
                    match state.phase {
                        RetryPhase::Waiting => {
                            warn!(
                                label,
                                attempt = state.attempt,
                                max_attempts = state.max_attempts,
                                delay_ms = state.delay.as_millis() as u64,
                                error = %err,
                                "attempt failed, retrying"
                            );
                            self.sleeper.sleep(state.delay).await;
                            state.resume();
                        }
                        _ if !err.is_recoverable() => return Err(err),
                        _ => {
                            return Err(HealError::RetryExhausted {
                                label: label.to_string(),
                                attempts: state.attempt,
                                last: Box::new(err),
                            });
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn flaky(message: &str) -> HealError {
        HealError::action("click", "#go", message)
    }

    mod backoff_tests {
        use super::*;

        #[test]
        fn test_linear_delays() {
            let base = Duration::from_millis(500);
            assert_eq!(Backoff::Linear.delay(base, 1), Duration::from_millis(500));
            assert_eq!(Backoff::Linear.delay(base, 2), Duration::from_millis(1000));
            assert_eq!(Backoff::Linear.delay(base, 3), Duration::from_millis(1500));
        }

        #[test]
        fn test_exponential_delays() {
            let base = Duration::from_millis(500);
            assert_eq!(Backoff::Exponential.delay(base, 1), Duration::from_millis(500));
            assert_eq!(Backoff::Exponential.delay(base, 2), Duration::from_millis(1000));
            assert_eq!(Backoff::Exponential.delay(base, 4), Duration::from_millis(4000));
        }

        #[test]
        fn test_delay_is_capped() {
            let base = Duration::from_millis(1000);
            assert_eq!(Backoff::Exponential.delay(base, 40), Duration::from_millis(MAX_BACKOFF_MS));
        }

        #[test]
        fn test_policy_defaults() {
            let policy = RetryPolicy::default();
            assert_eq!(policy.max_attempts, 3);
            assert_eq!(policy.base_delay_ms, 500);
            assert_eq!(policy.backoff, Backoff::Linear);
            assert!(policy.validate().is_ok());
            assert!(policy.with_max_attempts(0).validate().is_err());
        }

        #[test]
        fn test_policy_deserializes_partial() {
            let policy: RetryPolicy = serde_json::from_str(r#"{"backoff":"exponential"}"#).unwrap();
            assert_eq!(policy.max_attempts, 3);
            assert_eq!(policy.backoff, Backoff::Exponential);
        }
    }

    mod state_tests {
        use super::*;

        #[test]
        fn test_state_transitions() {
            let policy = RetryPolicy::default().with_max_attempts(2);
            let mut state = RetryState::new(2);
            state.fail(&flaky("x"), &policy);
            assert_eq!(state.phase, RetryPhase::Waiting);
            assert_eq!(state.delay, Duration::from_millis(500));
            state.resume();
            assert_eq!(state.attempt, 2);
            state.fail(&flaky("y"), &policy);
            assert_eq!(state.phase, RetryPhase::Exhausted);
            assert_eq!(state.attempt, 2);
            assert!(state.last_error.unwrap().contains('y'));
        }

        #[test]
        fn test_terminal_error_exhausts_immediately() {
            let mut state = RetryState::new(3);
            state.fail(&HealError::config("bad"), &RetryPolicy::default());
            assert_eq!(state.phase, RetryPhase::Exhausted);
            assert_eq!(state.attempt, 1);
        }
    }

    mod retrier_tests {
        use super::*;

        #[tokio::test]
        async fn test_always_failing_runs_max_attempts() {
            let sleeper = RecordingSleeper::new();
            let retrier = Retrier::with_sleeper(RetryPolicy::default(), sleeper.clone());
            let calls = AtomicU32::new(0);

            let result: HealResult<()> = retrier
                .run("click go", |_| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err(flaky("covered")) }
                })
                .await;

            assert_eq!(calls.load(Ordering::SeqCst), 3);
            match result.unwrap_err() {
                HealError::RetryExhausted { label, attempts, last } => {
                    assert_eq!(label, "click go");
                    assert_eq!(attempts, 3);
                    assert!(last.to_string().contains("covered"));
                }
                other => panic!("unexpected error: {other}"),
            }
            assert_eq!(sleeper.durations().len(), 2);
        }

        #[tokio::test]
        async fn test_success_first_try_runs_once() {
            let sleeper = RecordingSleeper::new();
            let retrier = Retrier::with_sleeper(RetryPolicy::default(), sleeper.clone());
            let calls = AtomicU32::new(0);

            let value = retrier
                .run("fill", |_| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Ok::<_, HealError>(7) }
                })
                .await
                .unwrap();

            assert_eq!(value, 7);
            assert_eq!(calls.load(Ordering::SeqCst), 1);
            assert!(sleeper.durations().is_empty());
        }

        #[tokio::test]
        async fn test_fail_fail_succeed_sleeps_linear() {
            let sleeper = RecordingSleeper::new();
            let retrier = Retrier::with_sleeper(RetryPolicy::default(), sleeper.clone());
            let calls = AtomicU32::new(0);

            let attempt = retrier
                .run("fill user", |n| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async move {
                        if n < 3 {
                            Err(flaky("detached"))
                        } else {
                            Ok(n)
                        }
                    }
                })
                .await
                .unwrap();

            assert_eq!(attempt, 3);
            assert_eq!(calls.load(Ordering::SeqCst), 3);
            assert_eq!(
                sleeper.durations(),
                vec![Duration::from_millis(500), Duration::from_millis(1000)]
            );
        }

        #[tokio::test]
        async fn test_exponential_sleeps() {
            let sleeper = RecordingSleeper::new();
            let policy = RetryPolicy::default()
                .with_max_attempts(4)
                .with_backoff(Backoff::Exponential);
            let retrier = Retrier::with_sleeper(policy, &sleeper);

            let _: HealResult<()> = retrier.run("x", |_| async { Err(flaky("no")) }).await;

            assert_eq!(
                sleeper.durations(),
                vec![
                    Duration::from_millis(500),
                    Duration::from_millis(1000),
                    Duration::from_millis(2000)
                ]
            );
        }

        #[tokio::test]
        async fn test_terminal_error_not_retried() {
            let sleeper = RecordingSleeper::new();
            let retrier = Retrier::with_sleeper(RetryPolicy::default(), sleeper.clone());
            let calls = AtomicU32::new(0);

            let result: HealResult<()> = retrier
                .run("cfg", |_| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err(HealError::config("broken")) }
                })
                .await;

            assert_eq!(calls.load(Ordering::SeqCst), 1);
            assert!(matches!(result, Err(HealError::Config { .. })));
            assert!(sleeper.durations().is_empty());
        }

        #[tokio::test]
        async fn test_tokio_sleeper_waits() {
            let retrier = Retrier::new(RetryPolicy::default().with_base_delay_ms(1));
            let result = retrier
                .run("quick", |n| async move {
                    if n == 1 {
                        Err(flaky("once"))
                    } else {
                        Ok(n)
                    }
                })
                .await;
            assert_eq!(result.unwrap(), 2);
        }
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_delay_non_decreasing(base in 0u64..5_000, a in 1u32..50, b in 1u32..50) {
                let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
                let base = Duration::from_millis(base);
                for backoff in [Backoff::Linear, Backoff::Exponential] {
                    prop_assert!(backoff.delay(base, lo) <= backoff.delay(base, hi));
                }
            }
        }
    }
}
