//! Navigation fallback sequencer.
//!
//! Each outer attempt walks the strategy ladder (`domcontentloaded`,
//! `load`, `networkidle`); the first `goto` that succeeds ends the
//! navigation. A trailing network-idle wait is attempted afterwards but
//! its failure only logs a warning. When every strategy fails the
//! sequencer backs off and starts the ladder again, so the worst case is
//! exactly `outer_attempts × 3` goto calls.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::driver::PageDriver;
use crate::result::{HealError, HealResult};
use crate::retry::{Backoff, Sleeper, TokioSleeper};
use crate::wait::{strategies_with_timeout, LoadState, DEFAULT_SETTLE_TIMEOUT_MS, DEFAULT_STRATEGY_TIMEOUT_MS};

/// Default number of passes over the strategy ladder
pub const DEFAULT_OUTER_ATTEMPTS: u32 = 3;

/// Default base delay between passes (1 second)
pub const DEFAULT_NAVIGATION_DELAY_MS: u64 = 1_000;

/// Navigation budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationPolicy {
    /// Passes over the ladder
    pub outer_attempts: u32,
    /// Timeout for each goto
    pub strategy_timeout_ms: u64,
    /// Timeout for the trailing network-idle wait
    pub settle_timeout_ms: u64,
    /// Base delay between passes
    pub base_delay_ms: u64,
    /// Growth of the delay between passes
    pub backoff: Backoff,
}

impl Default for NavigationPolicy {
    fn default() -> Self {
        Self {
            outer_attempts: DEFAULT_OUTER_ATTEMPTS,
            strategy_timeout_ms: DEFAULT_STRATEGY_TIMEOUT_MS,
            settle_timeout_ms: DEFAULT_SETTLE_TIMEOUT_MS,
            base_delay_ms: DEFAULT_NAVIGATION_DELAY_MS,
            backoff: Backoff::Linear,
        }
    }
}

impl NavigationPolicy {
    /// Set outer attempts
    #[must_use]
    pub const fn with_outer_attempts(mut self, attempts: u32) -> Self {
        self.outer_attempts = attempts;
        self
    }

    /// Set per-strategy timeout
    #[must_use]
    pub const fn with_strategy_timeout_ms(mut self, ms: u64) -> Self {
        self.strategy_timeout_ms = ms;
        self
    }

    /// Set settle timeout
    #[must_use]
    pub const fn with_settle_timeout_ms(mut self, ms: u64) -> Self {
        self.settle_timeout_ms = ms;
        self
    }

    /// Set base delay between passes
    #[must_use]
    pub const fn with_base_delay_ms(mut self, ms: u64) -> Self {
        self.base_delay_ms = ms;
        self
    }

    /// Reject budgets that can never navigate
    pub fn validate(&self) -> HealResult<()> {
        if self.outer_attempts == 0 {
            return Err(HealError::config("navigation.outer_attempts must be at least 1"));
        }
        if self.strategy_timeout_ms == 0 {
            return Err(HealError::config("navigation.strategy_timeout_ms must be positive"));
        }
        Ok(())
    }
}

/// How a navigation succeeded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationReport {
    /// URL navigated to
    pub url: String,
    /// Strategy that succeeded
    pub ready: LoadState,
    /// Outer attempt that succeeded (1-based)
    pub outer_attempt: u32,
    /// goto calls made, failed ones included
    pub goto_calls: u32,
    /// Whether the trailing network-idle wait succeeded
    pub settled: bool,
}

/// Runs the navigation ladder
#[derive(Debug, Clone)]
pub struct Navigator<S = TokioSleeper> {
    policy: NavigationPolicy,
    sleeper: S,
}

impl Navigator<TokioSleeper> {
    /// Navigator sleeping on the tokio timer
    #[must_use]
    pub const fn new(policy: NavigationPolicy) -> Self {
        Self {
            policy,
            sleeper: TokioSleeper,
        }
    }
}

impl<S: Sleeper> Navigator<S> {
    /// Navigator with a custom sleeper
    #[must_use]
    pub const fn with_sleeper(policy: NavigationPolicy, sleeper: S) -> Self {
        Self { policy, sleeper }
    }

    /// Active policy
    #[must_use]
    pub const fn policy(&self) -> &NavigationPolicy {
        &self.policy
    }

    /// Navigate to `url`, falling back through the strategy ladder
    pub async fn navigate<P>(&self, page: &P, url: &str) -> HealResult<NavigationReport>
    where
        P: PageDriver + ?Sized,
    {
        let ladder = strategies_with_timeout(self.policy.strategy_timeout_ms);
        let outer_attempts = self.policy.outer_attempts.max(1);
        let mut goto_calls = 0;
        let mut last = None;

        for outer in 1..=outer_attempts {
            for strategy in &ladder {
                goto_calls += 1;
                match page.goto(url, strategy.ready, strategy.timeout()).await {
                    Ok(()) => {
                        let settled = self.settle(page).await;
                        info!(url, ready = %strategy.ready, attempt = outer, "navigated");
                        return Ok(NavigationReport {
                            url: url.to_string(),
                            ready: strategy.ready,
                            outer_attempt: outer,
                            goto_calls,
                            settled,
                        });
                    }
                    Err(err) => {
                        debug!(url, ready = %strategy.ready, attempt = outer, error = %err, "navigation strategy failed");
                        last = Some(err);
                    }
                }
            }

            if outer < outer_attempts {
                let delay = self
                    .policy
                    .backoff
                    .delay(Duration::from_millis(self.policy.base_delay_ms), outer);
                warn!(
                    url,
                    attempt = outer,
                    delay_ms = delay.as_millis() as u64,
                    "all navigation strategies failed, retrying"
                );
                self.sleeper.sleep(delay).await;
            }
        }

        Err(HealError::NavigationExhausted {
            url: url.to_string(),
            attempts: outer_attempts,
            last: Box::new(last.unwrap_or_else(|| HealError::page("no navigation attempted"))),
        })
    }

    async fn settle<P>(&self, page: &P) -> bool
    where
        P: PageDriver + ?Sized,
    {
        let timeout = Duration::from_millis(self.policy.settle_timeout_ms);
        match page.wait_for_load_state(LoadState::NetworkIdle, timeout).await {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "network did not go idle, continuing");
                false
            }
        }
    }
}
