//! Ordered fallback over candidate selectors.
//!
//! The resolver walks a [`CandidateList`] strictly in order, giving each
//! candidate its own visibility wait. The first visible match wins; the
//! remaining candidates are never queried. The resolver never retries on
//! its own; wrap it in a [`Retrier`](crate::retry::Retrier) for that.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::candidate::{Candidate, CandidateList};
use crate::driver::{ElementHandle, PageDriver};
use crate::result::{HealError, HealResult};

/// Default per-candidate visibility wait (2 seconds)
pub const DEFAULT_CANDIDATE_TIMEOUT_MS: u64 = 2_000;

/// Outcome of probing one candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// A visible element matched
    Success,
    /// The driver reported a non-timeout failure
    NotFound,
    /// No visible match within the candidate timeout
    Timeout,
}

/// Record of one candidate probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionAttempt {
    /// Candidate probed
    pub candidate: Candidate,
    /// Rendered selector
    pub selector: String,
    /// What happened
    pub outcome: AttemptOutcome,
    /// Driver message on failure
    pub message: Option<String>,
}

/// A located element and the probes it took to find it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// The element found
    pub element: ElementHandle,
    /// Probes in order; the last one is the success
    pub attempts: Vec<ResolutionAttempt>,
}

impl Resolution {
    /// Candidate that matched
    #[must_use]
    pub fn winner(&self) -> Option<&Candidate> {
        self.attempts.last().map(|a| &a.candidate)
    }
}

/// Tries candidates in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolver {
    candidate_timeout: Duration,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_CANDIDATE_TIMEOUT_MS))
    }
}

impl Resolver {
    /// Resolver with the given per-candidate timeout
    #[must_use]
    pub const fn new(candidate_timeout: Duration) -> Self {
        Self { candidate_timeout }
    }

    /// Per-candidate timeout
    #[must_use]
    pub const fn candidate_timeout(&self) -> Duration {
        self.candidate_timeout
    }

    /// Locate the first visible candidate
    pub async fn resolve<P>(&self, page: &P, candidates: &CandidateList) -> HealResult<ElementHandle>
    where
        P: PageDriver + ?Sized,
    {
        self.resolve_traced(page, candidates).await.map(|r| r.element)
    }

    /// Locate the first visible candidate, keeping every probe
    ///
    /// On total failure the error is [`HealError::NotFound`] carrying all
    /// attempts, headlined by the last candidate's message.
    pub async fn resolve_traced<P>(&self, page: &P, candidates: &CandidateList) -> HealResult<Resolution>
    where
        P: PageDriver + ?Sized,
    {
        let mut attempts = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            let selector = candidate.selector();
            match page.wait_for_visible(&selector, self.candidate_timeout).await {
                Ok(element) => {
                    debug!(field = candidates.field(), selector = %selector, "candidate matched");
                    attempts.push(ResolutionAttempt {
                        candidate: candidate.clone(),
                        selector,
                        outcome: AttemptOutcome::Success,
                        message: None,
                    });
                    return Ok(Resolution { element, attempts });
                }
                Err(err) => {
                    let outcome = match err {
                        HealError::Timeout { .. } => AttemptOutcome::Timeout,
                        _ => AttemptOutcome::NotFound,
                    };
                    debug!(
                        field = candidates.field(),
                        selector = %selector,
                        kind = candidate.kind.label(),
                        error = %err,
                        "candidate failed"
                    );
                    attempts.push(ResolutionAttempt {
                        candidate: candidate.clone(),
                        selector,
                        outcome,
                        message: Some(err.to_string()),
                    });
                }
            }
        }

        let message = attempts
            .last()
            .and_then(|a| a.message.clone())
            .unwrap_or_else(|| "no candidates".to_string());
        Err(HealError::NotFound {
            field: candidates.field().to_string(),
            message,
            attempts,
        })
    }
}
