//! Run configuration.
//!
//! A [`RunConfig`] is built once (from defaults, a YAML/JSON file, or
//! builder calls), validated, and then threaded by reference into the
//! resolver, retrier and navigator. Nothing reads configuration from
//! globals.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::navigation::NavigationPolicy;
use crate::resolver::{Resolver, DEFAULT_CANDIDATE_TIMEOUT_MS};
use crate::result::{HealError, HealResult};
use crate::retry::RetryPolicy;

/// Default whole-test budget (90 seconds)
pub const DEFAULT_TEST_TIMEOUT_MS: u64 = 90_000;

/// Default per-step budget (30 seconds)
pub const DEFAULT_STEP_TIMEOUT_MS: u64 = 30_000;

/// Browser engine the generated tests target
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserKind {
    /// Chromium
    #[default]
    Chromium,
    /// Firefox
    Firefox,
    /// WebKit
    Webkit,
}

impl BrowserKind {
    /// Playwright project name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Chromium => "chromium",
            Self::Firefox => "firefox",
            Self::Webkit => "webkit",
        }
    }
}

impl std::fmt::Display for BrowserKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BrowserKind {
    type Err = HealError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "chromium" | "chrome" => Ok(Self::Chromium),
            "firefox" => Ok(Self::Firefox),
            "webkit" | "safari" => Ok(Self::Webkit),
            other => Err(HealError::config(format!("unknown browser '{other}'"))),
        }
    }
}

/// Immutable configuration for one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Base URL relative paths are joined to
    pub base_url: String,
    /// Target browser
    pub browser: BrowserKind,
    /// Run headless
    pub headless: bool,
    /// Whole-test budget in milliseconds
    pub test_timeout_ms: u64,
    /// Per-step budget in milliseconds
    pub step_timeout_ms: u64,
    /// Per-candidate visibility wait in milliseconds
    pub candidate_timeout_ms: u64,
    /// Interaction retry budget
    pub retry: RetryPolicy,
    /// Navigation budget
    pub navigation: NavigationPolicy,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            browser: BrowserKind::Chromium,
            headless: true,
            test_timeout_ms: DEFAULT_TEST_TIMEOUT_MS,
            step_timeout_ms: DEFAULT_STEP_TIMEOUT_MS,
            candidate_timeout_ms: DEFAULT_CANDIDATE_TIMEOUT_MS,
            retry: RetryPolicy::default(),
            navigation: NavigationPolicy::default(),
        }
    }
}

impl RunConfig {
    /// Create a configuration with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a `.json`, `.yaml` or `.yml` file and validate
    pub fn load(path: impl AsRef<Path>) -> HealResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&text)
        } else {
            Self::from_yaml_str(&text)
        }
    }

    /// Parse YAML and validate
    pub fn from_yaml_str(text: &str) -> HealResult<Self> {
        let config: Self = serde_yaml_ng::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse JSON and validate
    pub fn from_json_str(text: &str) -> HealResult<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Render as YAML
    pub fn to_yaml(&self) -> HealResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Check budgets are consistent
    pub fn validate(&self) -> HealResult<()> {
        if self.base_url.trim().is_empty() {
            return Err(HealError::config("base_url must not be empty"));
        }
        if self.candidate_timeout_ms == 0 {
            return Err(HealError::config("candidate_timeout_ms must be positive"));
        }
        if self.candidate_timeout_ms > self.step_timeout_ms {
            return Err(HealError::config(format!(
                "candidate_timeout_ms ({}) exceeds step_timeout_ms ({})",
                self.candidate_timeout_ms, self.step_timeout_ms
            )));
        }
        if self.step_timeout_ms > self.test_timeout_ms {
            return Err(HealError::config(format!(
                "step_timeout_ms ({}) exceeds test_timeout_ms ({})",
                self.step_timeout_ms, self.test_timeout_ms
            )));
        }
        self.retry.validate()?;
        self.navigation.validate()
    }

    /// Set base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set browser
    #[must_use]
    pub const fn with_browser(mut self, browser: BrowserKind) -> Self {
        self.browser = browser;
        self
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set test timeout
    #[must_use]
    pub const fn with_test_timeout_ms(mut self, ms: u64) -> Self {
        self.test_timeout_ms = ms;
        self
    }

    /// Set step timeout
    #[must_use]
    pub const fn with_step_timeout_ms(mut self, ms: u64) -> Self {
        self.step_timeout_ms = ms;
        self
    }

    /// Set candidate timeout
    #[must_use]
    pub const fn with_candidate_timeout_ms(mut self, ms: u64) -> Self {
        self.candidate_timeout_ms = ms;
        self
    }

    /// Set retry policy
    #[must_use]
    pub const fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set navigation policy
    #[must_use]
    pub const fn with_navigation(mut self, navigation: NavigationPolicy) -> Self {
        self.navigation = navigation;
        self
    }

    /// Whole-test budget
    #[must_use]
    pub const fn test_timeout(&self) -> Duration {
        Duration::from_millis(self.test_timeout_ms)
    }

    /// Per-step budget
    #[must_use]
    pub const fn step_timeout(&self) -> Duration {
        Duration::from_millis(self.step_timeout_ms)
    }

    /// Resolver using the configured candidate timeout
    #[must_use]
    pub const fn resolver(&self) -> Resolver {
        Resolver::new(Duration::from_millis(self.candidate_timeout_ms))
    }

    /// Join `target` onto the base URL unless it is already absolute
    #[must_use]
    pub fn resolve_url(&self, target: &str) -> String {
        if target.starts_with("http://") || target.starts_with("https://") || target.starts_with("file://") {
            return target.to_string();
        }
        let base = self.base_url.trim_end_matches('/');
        let path = target.trim_start_matches('/');
        if path.is_empty() {
            format!("{base}/")
        } else {
            format!("{base}/{path}")
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::retry::Backoff;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = RunConfig::default();
        assert_eq!(config.test_timeout_ms, 90_000);
        assert_eq!(config.step_timeout_ms, 30_000);
        assert_eq!(config.candidate_timeout_ms, 2_000);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.navigation.outer_attempts, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml_partial_overrides() {
        let yaml = "base_url: https://shop.test\nbrowser: firefox\nretry:\n  backoff: exponential\n";
        let config = RunConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.base_url, "https://shop.test");
        assert_eq!(config.browser, BrowserKind::Firefox);
        assert_eq!(config.retry.backoff, Backoff::Exponential);
        assert_eq!(config.retry.base_delay_ms, 500);
    }

    #[test]
    fn test_json_parse() {
        let config = RunConfig::from_json_str(r#"{"headless": false, "candidate_timeout_ms": 1000}"#).unwrap();
        assert!(!config.headless);
        assert_eq!(config.resolver().candidate_timeout(), Duration::from_millis(1000));
    }

    #[test]
    fn test_candidate_timeout_bounded_by_step() {
        let config = RunConfig::default()
            .with_step_timeout_ms(1_000)
            .with_candidate_timeout_ms(2_000);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("candidate_timeout_ms"));
    }

    #[test]
    fn test_zero_retry_rejected() {
        let config = RunConfig::default().with_retry(RetryPolicy::default().with_max_attempts(0));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "base_url: http://example.test").unwrap();
        let config = RunConfig::load(file.path()).unwrap();
        assert_eq!(config.base_url, "http://example.test");

        let mut json = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        writeln!(json, r#"{{"browser": "webkit"}}"#).unwrap();
        assert_eq!(RunConfig::load(json.path()).unwrap().browser, BrowserKind::Webkit);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = RunConfig::load("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, HealError::Io(_)));
    }

    #[test]
    fn test_resolve_url() {
        let config = RunConfig::default().with_base_url("https://app.test/");
        assert_eq!(config.resolve_url("/login"), "https://app.test/login");
        assert_eq!(config.resolve_url("login"), "https://app.test/login");
        assert_eq!(config.resolve_url("/"), "https://app.test/");
        assert_eq!(config.resolve_url("http://other/x"), "http://other/x");
    }

    #[test]
    fn test_browser_parse() {
        assert_eq!("Chrome".parse::<BrowserKind>().unwrap(), BrowserKind::Chromium);
        assert!("edge".parse::<BrowserKind>().is_err());
    }

    #[test]
    fn test_yaml_round_trip_keeps_defaults() {
        let config = RunConfig::default();
        let back = RunConfig::from_yaml_str(&config.to_yaml().unwrap()).unwrap();
        assert_eq!(back, config);
    }
}
