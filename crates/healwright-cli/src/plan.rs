//! Test plans written as plain sentences.
//!
//! ```yaml
//! base_url: http://localhost:3000
//! tests:
//!   - name: Login flow
//!     start_url: /login
//!     prompts:
//!       - enter "bob" in username
//!       - type secret into password
//!       - click login
//!       - should see dashboard
//! ```
//!
//! Each prompt is matched against a fixed set of rules, first match wins.
//! A prompt that matches nothing is an error naming the prompt.

use std::collections::HashSet;
use std::path::Path;

use healwright_gen::{StepDescriptor, TestScript};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CliError, CliResult};

/// A plan file
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TestPlan {
    /// Overrides the configured base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Tests in the plan
    #[serde(default)]
    pub tests: Vec<PlannedTest>,
}

/// One test in a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedTest {
    /// Test title
    pub name: String,
    /// Page opened before the first prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_url: Option<String>,
    /// Plain-language steps
    #[serde(default)]
    pub prompts: Vec<String>,
}

impl TestPlan {
    /// Read a YAML plan
    pub fn load(path: &Path) -> CliResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Parse a YAML plan
    pub fn from_yaml_str(text: &str) -> CliResult<Self> {
        let plan: Self = serde_yaml_ng::from_str(text)?;
        plan.validate()?;
        Ok(plan)
    }

    /// Reject empty plans and tests that would write the same file
    pub fn validate(&self) -> CliResult<()> {
        if self.tests.is_empty() {
            return Err(CliError::plan("plan contains no tests"));
        }
        let mut files = HashSet::new();
        for test in &self.tests {
            if test.name.trim().is_empty() {
                return Err(CliError::plan("every test needs a name"));
            }
            let file = TestScript::new(&test.name).file_name();
            if !files.insert(file.clone()) {
                return Err(CliError::plan(format!(
                    "test '{}' would overwrite {file}; rename it",
                    test.name
                )));
            }
        }
        Ok(())
    }

    /// Convert every test to a script
    pub fn to_scripts(&self, parser: &PromptParser) -> CliResult<Vec<TestScript>> {
        self.tests.iter().map(|t| parser.script(t)).collect()
    }
}

#[derive(Debug, Clone, Copy)]
enum Rule {
    Navigate,
    FillInto,
    FillWith,
    Wait,
    Expect,
    Click,
}

/// Rule-based prompt to step conversion
#[derive(Debug)]
pub struct PromptParser {
    rules: Vec<(Rule, Regex)>,
}

const VALUE: &str = r#"(?:"(?P<dq>[^"]*)"|'(?P<sq>[^']*)'|(?P<bare>\S+))"#;
const FIELD_TAIL: &str = r"(?:the\s+)?(?P<field>.+?)(?:\s+(?:field|input|box|button|link))?";

impl PromptParser {
    /// Compile the rule set
    pub fn new() -> CliResult<Self> {
        let rules = vec![
            (
                Rule::Navigate,
                r"(?i)^(?:go\s+to|navigate\s+to|open|visit)\s+(?:the\s+)?(?P<url>\S+)(?:\s+page)?$".to_string(),
            ),
            (
                Rule::FillInto,
                format!(r"(?i)^(?:enter|type|input|fill\s+in|put)\s+{VALUE}\s+(?:in|into|on)\s+{FIELD_TAIL}$"),
            ),
            (
                Rule::FillWith,
                format!(r"(?i)^(?:fill(?:\s+in)?|set)\s+{FIELD_TAIL}\s+(?:with|to)\s+{VALUE}$"),
            ),
            (
                Rule::Wait,
                r"(?i)^(?:wait|pause)\s+(?:for\s+)?(?P<amount>\d+(?:\.\d+)?)\s*(?P<unit>ms|milliseconds?|s|secs?|seconds?)?$".to_string(),
            ),
            (
                Rule::Expect,
                format!(r"(?i)^(?:(?:i\s+)?should\s+see|expect|verify|assert)\s+{FIELD_TAIL}(?:\s+(?:is|to\s+be)\s+visible)?$"),
            ),
            (
                Rule::Click,
                format!(r"(?i)^(?:click|press|tap|submit)(?:\s+on)?\s+{FIELD_TAIL}$"),
            ),
        ];
        let rules = rules
            .into_iter()
            .map(|(rule, pattern)| Ok((rule, Regex::new(&pattern)?)))
            .collect::<CliResult<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// Convert one prompt, or `None` when no rule matches
    #[must_use]
    pub fn parse(&self, prompt: &str) -> Option<StepDescriptor> {
        let prompt = prompt.trim().trim_end_matches(&['.', '!'][..]);
        self.rules.iter().find_map(|(rule, re)| {
            let caps = re.captures(prompt)?;
            let step = build(*rule, &caps)?;
            debug!(prompt, ?step, "prompt matched");
            Some(step)
        })
    }

    /// Convert a planned test, failing on the first unrecognised prompt
    pub fn script(&self, test: &PlannedTest) -> CliResult<TestScript> {
        let mut script = TestScript::new(test.name.trim());
        if let Some(url) = &test.start_url {
            script = script.with_start_url(url);
        }
        for prompt in &test.prompts {
            let step = self.parse(prompt).ok_or_else(|| CliError::UnrecognisedPrompt {
                test: test.name.clone(),
                prompt: prompt.clone(),
            })?;
            script = script.step(step);
        }
        script.validate()?;
        Ok(script)
    }
}

fn field(caps: &Captures<'_>) -> Option<String> {
    let raw = caps.name("field")?.as_str().trim();
    let unquoted = raw.trim_matches(|c: char| c == '"' || c == '\'').trim();
    (!unquoted.is_empty()).then(|| unquoted.to_string())
}

fn value(caps: &Captures<'_>) -> Option<String> {
    ["dq", "sq", "bare"]
        .iter()
        .find_map(|name| caps.name(name))
        .map(|m| m.as_str().to_string())
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn wait_ms(caps: &Captures<'_>) -> Option<u64> {
    let amount: f64 = caps.name("amount")?.as_str().parse().ok()?;
    let unit = caps.name("unit").map_or("s", |m| m.as_str()).to_ascii_lowercase();
    let ms = if unit.starts_with("ms") || unit.starts_with("milli") {
        amount
    } else {
        amount * 1000.0
    };
    Some(ms.round() as u64)
}

fn build(rule: Rule, caps: &Captures<'_>) -> Option<StepDescriptor> {
    Some(match rule {
        Rule::Navigate => StepDescriptor::Navigate {
            url: caps.name("url")?.as_str().to_string(),
        },
        Rule::FillInto | Rule::FillWith => StepDescriptor::Fill {
            field: field(caps)?,
            value: value(caps)?,
        },
        Rule::Wait => StepDescriptor::Wait { ms: wait_ms(caps)? },
        Rule::Expect => StepDescriptor::ExpectVisible { field: field(caps)? },
        Rule::Click => StepDescriptor::Click { field: field(caps)? },
    })
}
