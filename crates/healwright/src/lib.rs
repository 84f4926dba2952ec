//! Healwright: self-healing element resolution for browser tests
//!
//! Generated browser tests break when a selector drifts. Healwright
//! addresses elements by a logical field name instead, expands the name
//! into an ordered list of candidate selectors, and takes the first one
//! that is visible. Interactions are retried with backoff and navigation
//! falls back through progressively more lenient ready conditions.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    HEALWRIGHT Architecture                       │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Candidate  │    │ Resolver   │    │ Retrier    │            │
//! │   │ List       │───►│ (ordered,  │───►│ (backoff,  │──► action  │
//! │   │ Builder    │    │ first wins)│    │ bounded)   │            │
//! │   └────────────┘    └────────────┘    └────────────┘            │
//! │                                                                 │
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Navigator  │    │ StepRunner │    │ RunReporter│            │
//! │   │ (3 rungs × │    │ (numbered, │───►│ (JSON,     │            │
//! │   │  N passes) │    │ screenshot)│    │ JUnit)     │            │
//! │   └────────────┘    └────────────┘    └────────────┘            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything talks to the browser through [`PageDriver`]; [`MockPage`]
//! implements it in memory for tests.

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

/// Candidate selector lists for a field name
pub mod candidate;

/// Run configuration
pub mod config;

/// Page driver trait and in-memory mock
pub mod driver;

/// Navigation fallback sequencer
pub mod navigation;

/// Self-healing page facade
pub mod page;

/// Ordered candidate resolution
pub mod resolver;

/// Run reporting (summary, JSON, JUnit)
pub mod reporter;

mod result;

/// Retry with backoff
pub mod retry;

/// Numbered steps and step recording
pub mod step;

/// Load states and the navigation strategy ladder
pub mod wait;

pub use candidate::{build_candidates, Candidate, CandidateKind, CandidateList, InputType};
pub use config::{BrowserKind, RunConfig};
pub use driver::{ElementHandle, MockPage, PageDriver, Screenshot};
pub use navigation::{NavigationPolicy, NavigationReport, Navigator};
pub use page::HealingPage;
pub use reporter::{FailureMode, RunReport, RunReporter, StepRecord, TestCaseResult};
pub use resolver::{AttemptOutcome, Resolution, ResolutionAttempt, Resolver};
pub use result::{HealError, HealResult};
pub use retry::{Backoff, RecordingSleeper, Retrier, RetryPhase, RetryPolicy, RetryState, Sleeper, TokioSleeper};
pub use step::{with_test_timeout, Attachment, StepRecorder, StepRunner, StepStatus};
pub use wait::{LoadState, NavigationStrategy, NAVIGATION_STRATEGIES};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::candidate::{build_candidates, Candidate, CandidateKind, CandidateList};
    pub use super::config::{BrowserKind, RunConfig};
    pub use super::driver::{ElementHandle, MockPage, PageDriver};
    pub use super::navigation::{NavigationPolicy, Navigator};
    pub use super::page::HealingPage;
    pub use super::reporter::RunReporter;
    pub use super::resolver::Resolver;
    pub use super::result::{HealError, HealResult};
    pub use super::retry::{Backoff, RecordingSleeper, Retrier, RetryPolicy, Sleeper};
    pub use super::step::{with_test_timeout, StepRecorder, StepRunner, StepStatus};
    pub use super::wait::LoadState;
}
