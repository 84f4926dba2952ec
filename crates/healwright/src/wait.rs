//! Load states and the navigation strategy ladder.
//!
//! Navigation tries progressively more lenient ready conditions. The
//! ladder is a constant table shared by the runtime sequencer and the
//! code generator:
//!
//! | # | waitUntil          |
//! |---|--------------------|
//! | 1 | `domcontentloaded` |
//! | 2 | `load`             |
//! | 3 | `networkidle`      |

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

use crate::result::HealError;

/// Default timeout for a single navigation strategy (30 seconds)
pub const DEFAULT_STRATEGY_TIMEOUT_MS: u64 = 30_000;

/// Default timeout for the trailing network-idle settle (5 seconds)
pub const DEFAULT_SETTLE_TIMEOUT_MS: u64 = 5_000;

// =============================================================================
// LOAD STATE
// =============================================================================

/// Page load states (Playwright parity)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadState {
    /// `DOMContentLoaded` has fired
    #[serde(rename = "domcontentloaded")]
    DomContentLoaded,
    /// The `load` event has fired
    Load,
    /// No network requests for 500ms
    #[serde(rename = "networkidle")]
    NetworkIdle,
}

impl LoadState {
    /// Playwright `waitUntil` value for this state
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::DomContentLoaded => "domcontentloaded",
            Self::Load => "load",
            Self::NetworkIdle => "networkidle",
        }
    }
}

impl Default for LoadState {
    fn default() -> Self {
        Self::Load
    }
}

impl std::fmt::Display for LoadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoadState {
    type Err = HealError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "domcontentloaded" => Ok(Self::DomContentLoaded),
            "load" => Ok(Self::Load),
            "networkidle" => Ok(Self::NetworkIdle),
            other => Err(HealError::config(format!("unknown load state '{other}'"))),
        }
    }
}

// =============================================================================
// NAVIGATION STRATEGY
// =============================================================================

/// One rung of the navigation ladder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationStrategy {
    /// Ready condition passed to `goto`
    pub ready: LoadState,
    /// Timeout for this strategy in milliseconds
    pub timeout_ms: u64,
}

impl NavigationStrategy {
    /// Create a strategy
    #[must_use]
    pub const fn new(ready: LoadState, timeout_ms: u64) -> Self {
        Self { ready, timeout_ms }
    }

    /// Timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// The fixed strategy order, most eager first
pub const NAVIGATION_STRATEGIES: [NavigationStrategy; 3] = [
    NavigationStrategy::new(LoadState::DomContentLoaded, DEFAULT_STRATEGY_TIMEOUT_MS),
    NavigationStrategy::new(LoadState::Load, DEFAULT_STRATEGY_TIMEOUT_MS),
    NavigationStrategy::new(LoadState::NetworkIdle, DEFAULT_STRATEGY_TIMEOUT_MS),
];

/// The ladder with every rung given the same timeout
#[must_use]
pub fn strategies_with_timeout(timeout_ms: u64) -> [NavigationStrategy; 3] {
    NAVIGATION_STRATEGIES.map(|s| NavigationStrategy::new(s.ready, timeout_ms))
}
