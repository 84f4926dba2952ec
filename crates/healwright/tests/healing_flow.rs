//! End-to-end flows over the mock page: navigation, healing fills and
//! clicks, numbered steps and the run report.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::time::Duration;

use healwright::prelude::*;
use healwright::{Attachment, NavigationReport};

fn login_page() -> MockPage {
    MockPage::new()
        .fail_goto_for(LoadState::DomContentLoaded)
        .with_visible(r#"[name="username"]"#)
        .with_visible(r#"input[type="password"][id*="password"]"#)
        .with_visible(r#"text="Sign in""#)
        .with_visible(r#"text="Dashboard""#)
        .with_screenshot(vec![0x89, b'P', b'N', b'G'])
}

fn config() -> RunConfig {
    RunConfig::default()
        .with_base_url("https://shop.test")
        .with_candidate_timeout_ms(10)
}

async fn run_login<S: Sleeper>(
    page: &MockPage,
    config: &RunConfig,
    reporter: &mut RunReporter,
    sleeper: S,
    password_field: &str,
) -> HealResult<()> {
    let healing = HealingPage::with_sleeper(page, config, sleeper);
    let mut runner = StepRunner::new(page, reporter, config.step_timeout());
    with_test_timeout("login", config.test_timeout(), async {
        let nav: NavigationReport = runner.step("Navigate to /login", || healing.goto("/login")).await?;
        assert_eq!(nav.ready, LoadState::Load);
        runner
            .step("Fill username", || healing.fill("username", "bob"))
            .await?;
        runner
            .step("Fill password", || healing.fill(password_field, "hunter2"))
            .await?;
        runner.step("Click Sign in", || healing.click("Sign in")).await?;
        runner
            .step("Expect Dashboard", || healing.expect_visible("Dashboard"))
            .await?;
        Ok(())
    })
    .await
}

#[tokio::test]
async fn login_flow_heals_and_reports() {
    let page = login_page();
    let config = config();
    let sleeper = RecordingSleeper::new();
    let mut reporter = RunReporter::new("smoke");

    reporter.begin_test("login");
    let outcome = run_login(&page, &config, &mut reporter, sleeper.clone(), "password").await;
    reporter.end_test(outcome.as_ref().map(|_| ()));

    outcome.unwrap();
    assert_eq!(page.current_url().await.unwrap(), "https://shop.test/login");
    assert_eq!(page.filled_value(r#"[name="username"]"#).as_deref(), Some("bob"));
    assert_eq!(
        page.filled_value(r#"input[type="password"][id*="password"]"#).as_deref(),
        Some("hunter2")
    );
    assert!(sleeper.durations().is_empty());

    let result = &reporter.results()[0];
    assert_eq!(result.status, StepStatus::Passed);
    assert_eq!(result.steps.len(), 5);
    assert_eq!(result.steps[4].name, "Expect Dashboard");
}

#[tokio::test]
async fn failing_step_is_recorded_and_run_continues() {
    let page = login_page();
    let config = config();
    let sleeper = RecordingSleeper::new();
    let mut reporter = RunReporter::new("smoke");

    reporter.begin_test("login with missing field");
    let outcome = run_login(&page, &config, &mut reporter, &sleeper, "one-time code").await;
    reporter.end_test(outcome.as_ref().map(|_| ()));

    let err = outcome.unwrap_err();
    assert!(matches!(err, HealError::StepFailed { number: 3, .. }));
    assert!(matches!(err.root_cause(), HealError::NotFound { .. }));
    assert_eq!(
        sleeper.durations(),
        vec![Duration::from_millis(500), Duration::from_millis(1000)]
    );

    reporter.begin_test("second test still runs");
    reporter.end_test(Ok(()));

    assert_eq!(reporter.failed_count(), 1);
    assert_eq!(reporter.passed_count(), 1);
    assert!(!reporter.should_stop());

    let failed = &reporter.results()[0];
    assert_eq!(failed.steps.len(), 3);
    assert_eq!(failed.steps[2].status, StepStatus::Failed);
    let shot: &Attachment = &failed.attachments[0];
    assert_eq!(shot.name, "step-3-failure.png");
    assert!(reporter.render_junit().contains("Step 3 [failed] Fill password"));
}

#[tokio::test]
async fn unreachable_site_exhausts_navigation() {
    let page = MockPage::new().unreachable();
    let config = config();
    let sleeper = RecordingSleeper::new();
    let healing = HealingPage::with_sleeper(&page, &config, &sleeper);

    let err = healing.goto("/").await.unwrap_err();

    assert!(matches!(err, HealError::NavigationExhausted { attempts: 3, .. }));
    assert_eq!(page.count_calls("goto:"), 9);
}
