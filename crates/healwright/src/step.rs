//! Numbered test steps.
//!
//! A [`StepRunner`] gives each step a 1-based number, runs it under the
//! step budget, and reports start and finish to a [`StepRecorder`]. A
//! failing step is wrapped in [`HealError::StepFailed`] and, when the
//! driver can supply one, a screenshot is attached to the recorder.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use crate::driver::PageDriver;
use crate::result::{HealError, HealResult};

/// Outcome of a step or test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    /// Completed successfully
    Passed,
    /// Returned an error
    Failed,
    /// Not run
    Skipped,
}

impl StepStatus {
    /// Lowercase name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }
}

/// Binary artifact attached to a step (screenshots mostly)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// File-like name
    pub name: String,
    /// MIME type
    pub content_type: String,
    /// Raw bytes, base64 in serialized form
    #[serde(serialize_with = "encode_base64", deserialize_with = "decode_base64")]
    pub data: Vec<u8>,
}

impl Attachment {
    /// PNG attachment
    #[must_use]
    pub fn png(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: "image/png".to_string(),
            data,
        }
    }
}

fn encode_base64<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&STANDARD.encode(data))
}

fn decode_base64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
    let text = String::deserialize(deserializer)?;
    STANDARD.decode(text.as_bytes()).map_err(serde::de::Error::custom)
}

/// Sink for step lifecycle events
pub trait StepRecorder {
    /// A step is about to run
    fn step_started(&mut self, number: usize, name: &str);

    /// A step finished
    fn step_finished(
        &mut self,
        number: usize,
        name: &str,
        status: StepStatus,
        duration: Duration,
        error: Option<&HealError>,
    );

    /// Attach an artifact to the current test
    fn attach(&mut self, attachment: Attachment);
}

/// Runs numbered steps against one page
#[derive(Debug)]
pub struct StepRunner<'r, P: ?Sized, R> {
    page: &'r P,
    recorder: &'r mut R,
    step_timeout: Duration,
    completed: usize,
}

impl<'r, P: PageDriver + ?Sized, R: StepRecorder> StepRunner<'r, P, R> {
    /// Runner with the given per-step budget
    pub fn new(page: &'r P, recorder: &'r mut R, step_timeout: Duration) -> Self {
        Self {
            page,
            recorder,
            step_timeout,
            completed: 0,
        }
    }

    /// Steps run so far
    #[must_use]
    pub const fn steps_run(&self) -> usize {
        self.completed
    }

    /// Run `body` as the next numbered step
    pub async fn step<T, F, Fut>(&mut self, name: &str, body: F) -> HealResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = HealResult<T>>,
    {
        self.completed += 1;
        let number = self.completed;
        info!(step = number, name, "Step {number}: {name}");
        self.recorder.step_started(number, name);

        let start = Instant::now();
        let outcome = match tokio::time::timeout(self.step_timeout, body()).await {
            Ok(result) => result,
            Err(_) => Err(HealError::timeout(
                format!("Step {number}"),
                self.step_timeout.as_millis() as u64,
            )),
        };
        let duration = start.elapsed();

        match outcome {
            Ok(value) => {
                self.recorder
                    .step_finished(number, name, StepStatus::Passed, duration, None);
                Ok(value)
            }
            Err(err) => {
                error!(step = number, name, error = %err, "Step {number} failed");
                self.capture_failure(number).await;
                self.recorder
                    .step_finished(number, name, StepStatus::Failed, duration, Some(&err));
                Err(HealError::StepFailed {
                    number,
                    name: name.to_string(),
                    source: Box::new(err),
                })
            }
        }
    }

    async fn capture_failure(&mut self, number: usize) {
        match self.page.screenshot().await {
            Ok(shot) => self
                .recorder
                .attach(Attachment::png(format!("step-{number}-failure.png"), shot.data)),
            Err(err) => warn!(step = number, error = %err, "no failure screenshot"),
        }
    }
}

/// Run `test` under the whole-test budget
pub async fn with_test_timeout<T, Fut>(name: &str, budget: Duration, test: Fut) -> HealResult<T>
where
    Fut: Future<Output = HealResult<T>>,
{
    tokio::time::timeout(budget, test)
        .await
        .unwrap_or_else(|_| {
            Err(HealError::TestTimeout {
                name: name.to_string(),
                ms: budget.as_millis() as u64,
            })
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::driver::MockPage;

    #[derive(Debug, Default)]
    struct Log {
        events: Vec<String>,
        attachments: Vec<Attachment>,
    }

    impl StepRecorder for Log {
        fn step_started(&mut self, number: usize, name: &str) {
            self.events.push(format!("start {number} {name}"));
        }

        fn step_finished(
            &mut self,
            number: usize,
            _name: &str,
            status: StepStatus,
            _duration: Duration,
            _error: Option<&HealError>,
        ) {
            self.events.push(format!("finish {number} {}", status.as_str()));
        }

        fn attach(&mut self, attachment: Attachment) {
            self.attachments.push(attachment);
        }
    }

    #[tokio::test]
    async fn test_steps_are_numbered() {
        let page = MockPage::new();
        let mut log = Log::default();
        let mut runner = StepRunner::new(&page, &mut log, Duration::from_secs(1));

        runner.step("Navigate", || async { Ok(()) }).await.unwrap();
        let v = runner.step("Fill", || async { Ok(5) }).await.unwrap();

        assert_eq!(v, 5);
        assert_eq!(runner.steps_run(), 2);
        assert_eq!(
            log.events,
            vec!["start 1 Navigate", "finish 1 passed", "start 2 Fill", "finish 2 passed"]
        );
    }

    #[tokio::test]
    async fn test_failed_step_wraps_and_attaches_screenshot() {
        let page = MockPage::new().with_screenshot(vec![0x89, b'P', b'N', b'G']);
        let mut log = Log::default();
        let mut runner = StepRunner::new(&page, &mut log, Duration::from_secs(1));

        let err = runner
            .step("Click login", || async { Err::<(), _>(HealError::page("boom")) })
            .await
            .unwrap_err();

        match err {
            HealError::StepFailed { number, name, source } => {
                assert_eq!(number, 1);
                assert_eq!(name, "Click login");
                assert!(source.to_string().contains("boom"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(log.attachments.len(), 1);
        assert_eq!(log.attachments[0].name, "step-1-failure.png");
        assert_eq!(log.events.last().unwrap(), "finish 1 failed");
    }

    #[tokio::test]
    async fn test_failed_step_without_screenshot() {
        let page = MockPage::new();
        let mut log = Log::default();
        let mut runner = StepRunner::new(&page, &mut log, Duration::from_secs(1));
        let _ = runner
            .step("x", || async { Err::<(), _>(HealError::page("boom")) })
            .await;
        assert!(log.attachments.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_step_timeout() {
        let page = MockPage::new();
        let mut log = Log::default();
        let mut runner = StepRunner::new(&page, &mut log, Duration::from_millis(100));
        let err = runner
            .step("Slow", || async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await
            .unwrap_err();
        assert!(matches!(err.root_cause(), HealError::Timeout { ms: 100, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_whole_test_timeout() {
        let result: HealResult<()> = with_test_timeout("checkout", Duration::from_millis(90_000), async {
            tokio::time::sleep(Duration::from_secs(120)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(HealError::TestTimeout { ms: 90_000, .. })));
    }

    #[test]
    fn test_attachment_serializes_base64() {
        let json = serde_json::to_string(&Attachment::png("a.png", b"hi".to_vec())).unwrap();
        assert!(json.contains("\"aGk=\""));
        let back: Attachment = serde_json::from_str(&json).unwrap();
        assert_eq!(back.data, b"hi");
    }
}
