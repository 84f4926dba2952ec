//! Self-healing page facade.
//!
//! [`HealingPage`] pairs a driver with a [`RunConfig`] and exposes the
//! operations a generated test performs, addressed by field name instead
//! of selector. Every interaction is resolve-then-act inside the retrier,
//! so a stale or late element is re-resolved on the next attempt.

use std::time::Duration;

use crate::candidate::build_candidates;
use crate::config::RunConfig;
use crate::driver::{ElementHandle, PageDriver};
use crate::navigation::{NavigationReport, Navigator};
use crate::resolver::Resolution;
use crate::result::HealResult;
use crate::retry::{Retrier, Sleeper, TokioSleeper};

/// Driver plus configuration, addressed by field name
#[derive(Debug)]
pub struct HealingPage<'p, P: ?Sized, S = TokioSleeper> {
    page: &'p P,
    config: &'p RunConfig,
    sleeper: S,
}

impl<'p, P: PageDriver + ?Sized> HealingPage<'p, P, TokioSleeper> {
    /// Facade sleeping on the tokio timer
    #[must_use]
    pub const fn new(page: &'p P, config: &'p RunConfig) -> Self {
        Self {
            page,
            config,
            sleeper: TokioSleeper,
        }
    }
}

impl<'p, P: PageDriver + ?Sized, S: Sleeper> HealingPage<'p, P, S> {
    /// Facade with a custom sleeper
    #[must_use]
    pub const fn with_sleeper(page: &'p P, config: &'p RunConfig, sleeper: S) -> Self {
        Self { page, config, sleeper }
    }

    /// Underlying driver
    #[must_use]
    pub const fn driver(&self) -> &'p P {
        self.page
    }

    /// Active configuration
    #[must_use]
    pub const fn config(&self) -> &'p RunConfig {
        self.config
    }

    fn retrier(&self) -> Retrier<&S> {
        Retrier::with_sleeper(self.config.retry, &self.sleeper)
    }

    /// Navigate to `target`, relative to the base URL unless absolute
    pub async fn goto(&self, target: &str) -> HealResult<NavigationReport> {
        let url = self.config.resolve_url(target);
        Navigator::with_sleeper(self.config.navigation, &self.sleeper)
            .navigate(self.page, &url)
            .await
    }

    /// Resolve `field` once, without retry
    pub async fn locate(&self, field: &str) -> HealResult<Resolution> {
        self.config
            .resolver()
            .resolve_traced(self.page, &build_candidates(field))
            .await
    }

    /// Resolve `field` and fill it with `value`
    pub async fn fill(&self, field: &str, value: &str) -> HealResult<ElementHandle> {
        let page = self.page;
        let resolver = self.config.resolver();
        self.retrier()
            .run(&format!("fill {field}"), |_| async move {
                let element = resolver.resolve(page, &build_candidates(field)).await?;
                page.fill(&element, value).await?;
                Ok(element)
            })
            .await
    }

    /// Resolve `field` and click it
    pub async fn click(&self, field: &str) -> HealResult<ElementHandle> {
        let page = self.page;
        let resolver = self.config.resolver();
        self.retrier()
            .run(&format!("click {field}"), |_| async move {
                let element = resolver.resolve(page, &build_candidates(field)).await?;
                page.click(&element).await?;
                Ok(element)
            })
            .await
    }

    /// Wait until `field` resolves to a visible element
    pub async fn expect_visible(&self, field: &str) -> HealResult<ElementHandle> {
        let page = self.page;
        let resolver = self.config.resolver();
        self.retrier()
            .run(&format!("expect {field} visible"), |_| async move {
                resolver.resolve(page, &build_candidates(field)).await
            })
            .await
    }

    /// Pause for `ms` milliseconds
    pub async fn wait(&self, ms: u64) {
        self.sleeper.sleep(Duration::from_millis(ms)).await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::driver::MockPage;
    use crate::result::HealError;
    use crate::retry::RecordingSleeper;

    fn config() -> RunConfig {
        RunConfig::default()
            .with_base_url("https://app.test")
            .with_candidate_timeout_ms(5)
    }

    #[tokio::test]
    async fn test_fill_heals_to_name_attribute() {
        let page = MockPage::new().with_visible(r#"[name="username"]"#);
        let config = config();
        let sleeper = RecordingSleeper::new();
        let healing = HealingPage::with_sleeper(&page, &config, sleeper.clone());

        let el = healing.fill("username", "bob").await.unwrap();

        assert_eq!(el.selector, r#"[name="username"]"#);
        assert_eq!(page.filled_value(r#"[name="username"]"#).as_deref(), Some("bob"));
        assert!(sleeper.durations().is_empty());
    }

    #[tokio::test]
    async fn test_click_retries_after_action_failure() {
        let page = MockPage::new().with_visible(r#"text="Login""#).fail_next_actions(2);
        let config = config();
        let sleeper = RecordingSleeper::new();
        let healing = HealingPage::with_sleeper(&page, &config, sleeper.clone());

        healing.click("Login").await.unwrap();

        assert_eq!(page.count_calls("click:"), 3);
        assert_eq!(
            sleeper.durations(),
            vec![Duration::from_millis(500), Duration::from_millis(1000)]
        );
    }

    #[tokio::test]
    async fn test_late_element_found_on_retry() {
        let page = MockPage::new().with_delayed(r#"text="Dashboard""#, 1);
        let config = config();
        let sleeper = RecordingSleeper::new();
        let healing = HealingPage::with_sleeper(&page, &config, sleeper.clone());

        healing.expect_visible("Dashboard").await.unwrap();
        assert_eq!(sleeper.durations().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_field_exhausts_retries() {
        let page = MockPage::new();
        let config = config();
        let healing = HealingPage::with_sleeper(&page, &config, RecordingSleeper::new());

        let err = healing.click("Ghost").await.unwrap_err();

        assert!(matches!(err, HealError::RetryExhausted { attempts: 3, .. }));
        assert!(matches!(err.root_cause(), HealError::NotFound { .. }));
        assert_eq!(page.count_calls("wait_for_visible"), 27);
    }

    #[tokio::test]
    async fn test_goto_joins_base_url() {
        let page = MockPage::new();
        let config = config();
        let healing = HealingPage::with_sleeper(&page, &config, RecordingSleeper::new());

        let report = healing.goto("/login").await.unwrap();

        assert_eq!(report.url, "https://app.test/login");
        assert_eq!(healing.driver().current_url().await.unwrap(), "https://app.test/login");
    }

    #[tokio::test]
    async fn test_locate_reports_attempts() {
        let page = MockPage::new().with_visible("#email");
        let config = config();
        let healing = HealingPage::new(&page, &config);
        let res = healing.locate("email").await.unwrap();
        assert_eq!(res.attempts.len(), 3);
    }

    #[tokio::test]
    async fn test_wait_uses_sleeper() {
        let page = MockPage::new();
        let config = config();
        let sleeper = RecordingSleeper::new();
        HealingPage::with_sleeper(&page, &config, sleeper.clone()).wait(250).await;
        assert_eq!(sleeper.durations(), vec![Duration::from_millis(250)]);
    }
}
