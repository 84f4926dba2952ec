//! Run Reporter - per-test results, plain summary, JSON and JUnit output
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │  RunReporter (implements StepRecorder)                        │
//! │                                                               │
//! │  begin_test ─► step_started / step_finished / attach ─►       │
//! │  end_test   ─► TestCaseResult { steps, error, attachments }   │
//! │                                                               │
//! │  FailureMode::CollectAll   keep running after a failure       │
//! │  FailureMode::FailFast     stop the run on first failure      │
//! └───────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use uuid::Uuid;

use crate::result::{HealError, HealResult};
use crate::step::{Attachment, StepRecorder, StepStatus};

/// What a run does after a failed test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureMode {
    /// Record the failure and carry on with the next test
    #[default]
    CollectAll,
    /// Stop after the first failed test
    FailFast,
}

/// One recorded step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    /// 1-based step number
    pub number: usize,
    /// Step name
    pub name: String,
    /// Outcome
    pub status: StepStatus,
    /// Wall time in milliseconds
    pub duration_ms: u64,
    /// Failure message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One finished test case
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCaseResult {
    /// Test name
    pub name: String,
    /// Outcome
    pub status: StepStatus,
    /// Wall time in milliseconds
    pub duration_ms: u64,
    /// Steps in order
    pub steps: Vec<StepRecord>,
    /// Failure message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Screenshots and other artifacts
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

impl TestCaseResult {
    /// Create a passed result
    #[must_use]
    pub fn passed(name: impl Into<String>, duration: Duration) -> Self {
        Self {
            name: name.into(),
            status: StepStatus::Passed,
            duration_ms: duration.as_millis() as u64,
            steps: Vec::new(),
            error: None,
            attachments: Vec::new(),
        }
    }

    /// Create a failed result
    #[must_use]
    pub fn failed(name: impl Into<String>, duration: Duration, error: impl Into<String>) -> Self {
        Self {
            status: StepStatus::Failed,
            error: Some(error.into()),
            ..Self::passed(name, duration)
        }
    }

    /// Create a skipped result
    #[must_use]
    pub fn skipped(name: impl Into<String>) -> Self {
        Self {
            status: StepStatus::Skipped,
            ..Self::passed(name, Duration::ZERO)
        }
    }
}

#[derive(Debug)]
struct OpenTest {
    name: String,
    started: Instant,
    steps: Vec<StepRecord>,
    attachments: Vec<Attachment>,
}

/// Serialized form of a whole run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Unique run id
    pub run_id: Uuid,
    /// Suite name
    pub suite: String,
    /// When the reporter was created
    pub started_at: DateTime<Utc>,
    /// When the report was rendered
    pub finished_at: DateTime<Utc>,
    /// Tests recorded
    pub total: usize,
    /// Tests passed
    pub passed: usize,
    /// Tests failed
    pub failed: usize,
    /// Per-test results
    pub tests: Vec<TestCaseResult>,
}

/// Collects results for one run
#[derive(Debug)]
pub struct RunReporter {
    run_id: Uuid,
    suite_name: String,
    started_at: DateTime<Utc>,
    failure_mode: FailureMode,
    results: Vec<TestCaseResult>,
    current: Option<OpenTest>,
}

impl Default for RunReporter {
    fn default() -> Self {
        Self::new("healwright")
    }
}

impl RunReporter {
    /// Create a reporter for `suite_name`
    #[must_use]
    pub fn new(suite_name: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            suite_name: suite_name.into(),
            started_at: Utc::now(),
            failure_mode: FailureMode::default(),
            results: Vec::new(),
            current: None,
        }
    }

    /// Set the failure mode
    #[must_use]
    pub const fn with_failure_mode(mut self, mode: FailureMode) -> Self {
        self.failure_mode = mode;
        self
    }

    /// Run id
    #[must_use]
    pub const fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Open a test case; an unfinished previous one is closed as failed
    pub fn begin_test(&mut self, name: impl Into<String>) {
        if let Some(open) = self.current.take() {
            warn!(test = %open.name, "test not finished before the next began");
            self.close(open, Some("test did not finish".to_string()));
        }
        self.current = Some(OpenTest {
            name: name.into(),
            started: Instant::now(),
            steps: Vec::new(),
            attachments: Vec::new(),
        });
    }

    /// Close the open test case with its outcome
    pub fn end_test(&mut self, outcome: Result<(), &HealError>) {
        match self.current.take() {
            Some(open) => {
                let error = outcome.err().map(ToString::to_string);
                self.close(open, error);
            }
            None => warn!("end_test called with no open test"),
        }
    }

    fn close(&mut self, open: OpenTest, error: Option<String>) {
        let status = if error.is_some() {
            StepStatus::Failed
        } else {
            StepStatus::Passed
        };
        info!(test = %open.name, status = status.as_str(), "test finished");
        self.results.push(TestCaseResult {
            name: open.name,
            status,
            duration_ms: open.started.elapsed().as_millis() as u64,
            steps: open.steps,
            error,
            attachments: open.attachments,
        });
    }

    /// Record a finished result directly
    pub fn record(&mut self, result: TestCaseResult) {
        self.results.push(result);
    }

    /// Whether the run should stop before the next test
    #[must_use]
    pub fn should_stop(&self) -> bool {
        self.failure_mode == FailureMode::FailFast && self.failed_count() > 0
    }

    /// Get number of passed tests
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.count(StepStatus::Passed)
    }

    /// Get number of failed tests
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.count(StepStatus::Failed)
    }

    fn count(&self, status: StepStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }

    /// Get total test count
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.results.len()
    }

    /// Check if all tests passed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failed_count() == 0
    }

    /// Get test results
    #[must_use]
    pub fn results(&self) -> &[TestCaseResult] {
        &self.results
    }

    /// Total duration of recorded tests
    #[must_use]
    pub fn total_duration(&self) -> Duration {
        Duration::from_millis(self.results.iter().map(|r| r.duration_ms).sum())
    }

    /// Plain-text summary, one line per failure after the headline
    #[must_use]
    pub fn summary(&self) -> String {
        let mut out = format!(
            "{}: {}/{} passed, {} failed ({:.1}s)",
            self.suite_name,
            self.passed_count(),
            self.total_count(),
            self.failed_count(),
            self.total_duration().as_secs_f64()
        );
        for failure in self.results.iter().filter(|r| r.status == StepStatus::Failed) {
            let _ = write!(
                out,
                "\n  FAILED {}: {}",
                failure.name,
                failure.error.as_deref().unwrap_or("unknown error")
            );
        }
        out
    }

    /// Snapshot as a serializable report
    #[must_use]
    pub fn report(&self) -> RunReport {
        RunReport {
            run_id: self.run_id,
            suite: self.suite_name.clone(),
            started_at: self.started_at,
            finished_at: Utc::now(),
            total: self.total_count(),
            passed: self.passed_count(),
            failed: self.failed_count(),
            tests: self.results.clone(),
        }
    }

    /// Pretty JSON report, attachments base64-encoded
    pub fn to_json(&self) -> HealResult<String> {
        Ok(serde_json::to_string_pretty(&self.report())?)
    }

    /// Write the JSON report
    pub fn write_json(&self, output_path: &Path) -> HealResult<()> {
        std::fs::write(output_path, self.to_json()?)?;
        Ok(())
    }

    /// Write JUnit XML for CI integration
    pub fn write_junit(&self, output_path: &Path) -> HealResult<()> {
        std::fs::write(output_path, self.render_junit())?;
        Ok(())
    }

    /// Render JUnit XML content
    #[must_use]
    pub fn render_junit(&self) -> String {
        let mut xml = String::new();

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        xml.push('\n');
        let _ = writeln!(
            xml,
            r#"<testsuite name="{}" tests="{}" failures="{}" skipped="{}" time="{:.3}" timestamp="{}">"#,
            escape_xml(&self.suite_name),
            self.total_count(),
            self.failed_count(),
            self.count(StepStatus::Skipped),
            self.total_duration().as_secs_f64(),
            self.started_at.format("%Y-%m-%dT%H:%M:%S")
        );

        for result in &self.results {
            let _ = write!(
                xml,
                r#"  <testcase name="{}" time="{:.3}">"#,
                escape_xml(&result.name),
                Duration::from_millis(result.duration_ms).as_secs_f64()
            );
            xml.push('\n');

            match result.status {
                StepStatus::Failed => {
                    let error = result.error.as_deref().unwrap_or_default();
                    let _ = writeln!(
                        xml,
                        r#"    <failure message="{}">{}</failure>"#,
                        escape_xml(error),
                        escape_xml(&step_trace(result))
                    );
                }
                StepStatus::Skipped => xml.push_str("    <skipped/>\n"),
                StepStatus::Passed => {}
            }

            xml.push_str("  </testcase>\n");
        }

        xml.push_str("</testsuite>\n");
        xml
    }
}

fn step_trace(result: &TestCaseResult) -> String {
    let mut trace = String::new();
    for step in &result.steps {
        let _ = writeln!(trace, "Step {} [{}] {}", step.number, step.status.as_str(), step.name);
        if let Some(error) = &step.error {
            let _ = writeln!(trace, "  {error}");
        }
    }
    trace
}

impl StepRecorder for RunReporter {
    fn step_started(&mut self, _number: usize, _name: &str) {
        if self.current.is_none() {
            warn!("step started with no open test");
        }
    }

    fn step_finished(
        &mut self,
        number: usize,
        name: &str,
        status: StepStatus,
        duration: Duration,
        error: Option<&HealError>,
    ) {
        if let Some(open) = self.current.as_mut() {
            open.steps.push(StepRecord {
                number,
                name: name.to_string(),
                status,
                duration_ms: duration.as_millis() as u64,
                error: error.map(ToString::to_string),
            });
        }
    }

    fn attach(&mut self, attachment: Attachment) {
        match self.current.as_mut() {
            Some(open) => open.attachments.push(attachment),
            None => warn!(name = %attachment.name, "attachment dropped, no open test"),
        }
    }
}

/// Escape XML special characters
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn failed_run() -> RunReporter {
        let mut reporter = RunReporter::new("login-suite");
        reporter.begin_test("valid login");
        reporter.step_finished(1, "Navigate", StepStatus::Passed, Duration::from_millis(20), None);
        reporter.end_test(Ok(()));

        reporter.begin_test("bad <password>");
        let err = HealError::page("boom & bust");
        reporter.step_finished(1, "Click login", StepStatus::Failed, Duration::from_millis(5), Some(&err));
        reporter.attach(Attachment::png("step-1-failure.png", vec![1, 2, 3]));
        reporter.end_test(Err(&err));
        reporter
    }

    mod reporter_tests {
        use super::*;

        #[test]
        fn test_counts_and_continue() {
            let reporter = failed_run();
            assert_eq!(reporter.total_count(), 2);
            assert_eq!(reporter.passed_count(), 1);
            assert_eq!(reporter.failed_count(), 1);
            assert!(!reporter.all_passed());
            assert!(!reporter.should_stop());
        }

        #[test]
        fn test_fail_fast_stops() {
            let mut reporter = RunReporter::new("s").with_failure_mode(FailureMode::FailFast);
            reporter.record(TestCaseResult::failed("t", Duration::ZERO, "nope"));
            assert!(reporter.should_stop());
        }

        #[test]
        fn test_steps_and_attachments_land_in_open_test() {
            let reporter = failed_run();
            let failed = &reporter.results()[1];
            assert_eq!(failed.steps.len(), 1);
            assert_eq!(failed.attachments.len(), 1);
            assert!(failed.error.as_deref().unwrap().contains("boom"));
        }

        #[test]
        fn test_unfinished_test_closed_as_failed() {
            let mut reporter = RunReporter::default();
            reporter.begin_test("first");
            reporter.begin_test("second");
            reporter.end_test(Ok(()));
            assert_eq!(reporter.results()[0].status, StepStatus::Failed);
            assert_eq!(reporter.results()[1].status, StepStatus::Passed);
        }

        #[test]
        fn test_summary_lists_failures() {
            let summary = failed_run().summary();
            assert!(summary.starts_with("login-suite: 1/2 passed, 1 failed"));
            assert!(summary.contains("FAILED bad <password>: Page error: boom & bust"));
        }
    }

    mod output_tests {
        use super::*;

        #[test]
        fn test_json_has_run_id_and_base64() {
            let reporter = failed_run();
            let json = reporter.to_json().unwrap();
            let report: RunReport = serde_json::from_str(&json).unwrap();
            assert_eq!(report.run_id, reporter.run_id());
            assert_eq!(report.failed, 1);
            assert!(json.contains("\"AQID\""));
        }

        #[test]
        fn test_junit_escapes() {
            let xml = failed_run().render_junit();
            assert!(xml.contains(r#"tests="2" failures="1""#));
            assert!(xml.contains("bad &lt;password&gt;"));
            assert!(xml.contains("boom &amp; bust"));
            assert!(xml.contains("Step 1 [failed] Click login"));
        }

        #[test]
        fn test_write_files() {
            let dir = tempfile::tempdir().unwrap();
            let reporter = failed_run();
            reporter.write_json(&dir.path().join("report.json")).unwrap();
            reporter.write_junit(&dir.path().join("junit.xml")).unwrap();
            let xml = std::fs::read_to_string(dir.path().join("junit.xml")).unwrap();
            assert!(xml.starts_with("<?xml"));
        }
    }

    mod escape_xml_tests {
        use super::*;

        #[test]
        fn test_escape_all() {
            assert_eq!(escape_xml(r#"<a href="x">&'"#), "&lt;a href=&quot;x&quot;&gt;&amp;&apos;");
        }
    }
}
