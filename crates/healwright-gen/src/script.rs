//! Playwright test files from structured step descriptors.
//!
//! A [`TestScript`] is lowered to a [`JsModule`] containing the healing
//! helpers (`sleep`, `resolveField`, `withRetry`, `gotoWithFallback`) and
//! one `test(...)` whose steps each run inside `test.step`. Candidate
//! arrays are produced by [`healwright::build_candidates`], so generated
//! files and the Rust runtime resolve fields in the same order.

use std::path::{Path, PathBuf};

use chrono::Utc;
use healwright::{build_candidates, Backoff, RunConfig, NAVIGATION_STRATEGIES};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::builder::{JsFunctionBuilder, JsModuleBuilder};
use crate::codegen::generate;
use crate::error::{GenError, GenResult};
use crate::hir::*;
use crate::manifest::write_with_manifest;

/// One step of a test, independent of how it is rendered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum StepDescriptor {
    /// Open a URL (relative URLs are joined onto the base URL)
    Navigate {
        /// Target URL or path
        url: String,
    },
    /// Type a value into a field
    Fill {
        /// Logical field name
        field: String,
        /// Text to enter
        value: String,
    },
    /// Click a field
    Click {
        /// Logical field name
        field: String,
    },
    /// Assert a field is visible
    ExpectVisible {
        /// Logical field name
        field: String,
    },
    /// Fixed pause
    Wait {
        /// Milliseconds
        ms: u64,
    },
}

impl StepDescriptor {
    /// Human-readable step title used in `Step N: ...`
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Navigate { url } => format!("Navigate to {url}"),
            Self::Fill { field, .. } => format!("Fill {field}"),
            Self::Click { field } => format!("Click {field}"),
            Self::ExpectVisible { field } => format!("Expect {field} to be visible"),
            Self::Wait { ms } => format!("Wait {ms}ms"),
        }
    }
}

/// A named test and its steps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestScript {
    /// Test title
    pub name: String,
    /// Page opened before the first step
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_url: Option<String>,
    /// Steps in order
    #[serde(default)]
    pub steps: Vec<StepDescriptor>,
}

impl TestScript {
    /// Create an empty script
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start_url: None,
            steps: Vec::new(),
        }
    }

    /// Set the start URL
    #[must_use]
    pub fn with_start_url(mut self, url: impl Into<String>) -> Self {
        self.start_url = Some(url.into());
        self
    }

    /// Append a step
    #[must_use]
    pub fn step(mut self, step: StepDescriptor) -> Self {
        self.steps.push(step);
        self
    }

    /// Steps as rendered: the start URL, when set, becomes step 1
    #[must_use]
    pub fn effective_steps(&self) -> Vec<StepDescriptor> {
        let mut steps = Vec::with_capacity(self.steps.len() + 1);
        if let Some(url) = &self.start_url {
            steps.push(StepDescriptor::Navigate { url: url.clone() });
        }
        steps.extend(self.steps.iter().cloned());
        steps
    }

    /// File-name stem derived from the test name
    #[must_use]
    pub fn slug(&self) -> String {
        slug(&self.name)
    }

    /// `<slug>.spec.ts`
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}.spec.ts", self.slug())
    }

    /// Reject scripts that cannot produce a meaningful test
    pub fn validate(&self) -> GenResult<()> {
        if self.name.trim().is_empty() {
            return Err(GenError::script(&self.name, "test name is empty"));
        }
        if self.start_url.is_none() && self.steps.is_empty() {
            return Err(GenError::script(&self.name, "no steps"));
        }
        Ok(())
    }
}

/// Lowercase, dash-separated file stem; `test` when nothing usable remains
#[must_use]
pub fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.is_empty() && !out.ends_with('-') {
            out.push('-');
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    if out.is_empty() {
        "test".to_string()
    } else {
        out
    }
}

/// Values baked into a generated file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOptions {
    /// Timeouts, retry and navigation budgets, base URL
    pub config: RunConfig,
    /// Version written into the header and manifest
    pub tool_version: String,
    /// Command that reproduces the file
    pub regenerate_cmd: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::from_config(&RunConfig::default())
    }
}

impl RenderOptions {
    /// Options for `config` with this crate's version
    #[must_use]
    pub fn from_config(config: &RunConfig) -> Self {
        Self {
            config: config.clone(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            regenerate_cmd: "healwright generate".to_string(),
        }
    }

    /// Set the regenerate command recorded in the header
    #[must_use]
    pub fn with_regenerate_cmd(mut self, cmd: impl Into<String>) -> Self {
        self.regenerate_cmd = cmd.into();
        self
    }
}

fn id(name: &str) -> GenResult<Expr> {
    Expr::ident(name)
}

fn text(s: &str) -> TemplatePart {
    TemplatePart::text(s)
}

fn error_message() -> GenResult<TemplatePart> {
    Ok(TemplatePart::expr(id("error")?.dot("message")?))
}

/// `attempt * BASE` or `2 ** (attempt - 1) * BASE`
fn backoff_expr(backoff: Backoff, base: &str) -> GenResult<Expr> {
    let factor = match backoff {
        Backoff::Linear => id("attempt")?,
        Backoff::Exponential => Expr::num(2).pow(id("attempt")?.sub(Expr::num(1))),
    };
    Ok(factor.mul(id(base)?))
}

fn constants(config: &RunConfig) -> GenResult<Vec<Stmt>> {
    let strategies = NAVIGATION_STRATEGIES
        .iter()
        .map(|s| Expr::object(vec![("waitUntil", Expr::str(s.ready.as_str()))]))
        .collect();
    Ok(vec![
        Stmt::const_decl("BASE_DELAY", Expr::millis(config.retry.base_delay_ms))?,
        Stmt::const_decl("CANDIDATE_TIMEOUT", Expr::millis(config.candidate_timeout_ms))?,
        Stmt::const_decl("NAVIGATION_TIMEOUT", Expr::millis(config.navigation.strategy_timeout_ms))?,
        Stmt::const_decl("SETTLE_TIMEOUT", Expr::millis(config.navigation.settle_timeout_ms))?,
        Stmt::const_decl("NAVIGATION_DELAY", Expr::millis(config.navigation.base_delay_ms))?,
        Stmt::const_decl("NAVIGATION_STRATEGIES", Expr::array(strategies))?,
    ])
}

fn sleep_fn() -> GenResult<JsFunction> {
    let timer = id("setTimeout")?.call(vec![id("resolve")?, id("ms")?]);
    let promise = id("Promise")?.new_expr(vec![Expr::arrow(&["resolve"], timer)?]);
    Ok(JsFunctionBuilder::new("sleep")?
        .params(&["ms"])?
        .stmt(Stmt::ret_val(promise))
        .build())
}

fn resolve_field_fn() -> GenResult<JsFunction> {
    let locate = id("page")?
        .method("locator", vec![id("selector")?])?
        .method("first", vec![])?;
    let wait = id("element")?
        .method(
            "waitFor",
            vec![Expr::object(vec![
                ("state", Expr::str("visible")),
                ("timeout", id("CANDIDATE_TIMEOUT")?),
            ])],
        )?
        .await_expr();
    let miss = Expr::template(vec![
        TemplatePart::expr(id("selector")?),
        text(": "),
        error_message()?,
    ]);
    let attempt = Stmt::try_catch(
        vec![
            Stmt::const_decl("element", locate)?,
            Stmt::expr(wait),
            Stmt::ret_val(id("element")?),
        ],
        "error",
        vec![
            Stmt::assign("lastError", id("error")?)?,
            Stmt::expr(id("tried")?.method("push", vec![miss])?),
            Stmt::expr(id("console")?.method(
                "debug",
                vec![Expr::template(vec![
                    text("Candidate "),
                    TemplatePart::expr(id("selector")?),
                    text(" not found: "),
                    error_message()?,
                ])],
            )?),
        ],
    )?;
    let failure = id("Error")?.new_expr(vec![
        Expr::template(vec![
            text("Element not found after "),
            TemplatePart::expr(id("selectors")?.dot("length")?),
            text(" candidates: "),
            TemplatePart::expr(id("lastError")?.dot("message")?),
            text(" (tried "),
            TemplatePart::expr(id("tried")?.method("join", vec![Expr::str("; ")])?),
            text(")"),
        ]),
        Expr::object(vec![("cause", id("lastError")?)]),
    ]);
    Ok(JsFunctionBuilder::new_async("resolveField")?
        .params(&["page", "selectors"])?
        .stmt(Stmt::let_decl("lastError", Expr::null())?)
        .stmt(Stmt::const_decl("tried", Expr::array(vec![]))?)
        .stmt(Stmt::for_of("selector", id("selectors")?, vec![attempt])?)
        .stmt(Stmt::throw(failure))
        .build())
}

fn with_retry_fn(config: &RunConfig) -> GenResult<JsFunction> {
    let max = Expr::num(config.retry.max_attempts);
    let warn = id("console")?.method(
        "warn",
        vec![Expr::template(vec![
            TemplatePart::expr(id("label")?),
            text(": attempt "),
            TemplatePart::expr(id("attempt")?),
            text(" failed, retrying: "),
            error_message()?,
        ])],
    )?;
    let pause = id("sleep")?
        .call(vec![backoff_expr(config.retry.backoff, "BASE_DELAY")?])
        .await_expr();
    let body = Stmt::try_catch(
        vec![Stmt::ret_val(id("action")?.call(vec![]).await_expr())],
        "error",
        vec![
            Stmt::assign("lastError", id("error")?)?,
            Stmt::if_then(
                id("attempt")?.lt(max.clone()),
                vec![Stmt::expr(warn), Stmt::expr(pause)],
            ),
        ],
    )?;
    let exhausted = id("Error")?.new_expr(vec![
        Expr::template(vec![
            TemplatePart::expr(id("label")?),
            text(&format!(" failed after {} attempts: ", config.retry.max_attempts)),
            TemplatePart::expr(id("lastError")?.dot("message")?),
        ]),
        Expr::object(vec![("cause", id("lastError")?)]),
    ]);
    Ok(JsFunctionBuilder::new_async("withRetry")?
        .params(&["label", "action"])?
        .stmt(Stmt::let_decl("lastError", Expr::null())?)
        .stmt(Stmt::for_inclusive("attempt", Expr::num(1), max, vec![body])?)
        .stmt(Stmt::throw(exhausted))
        .build())
}

fn goto_with_fallback_fn(config: &RunConfig) -> GenResult<JsFunction> {
    let attempts = Expr::num(config.navigation.outer_attempts);
    let goto = id("page")?
        .method(
            "goto",
            vec![
                id("url")?,
                Expr::object(vec![
                    ("waitUntil", id("strategy")?.dot("waitUntil")?),
                    ("timeout", id("NAVIGATION_TIMEOUT")?),
                ]),
            ],
        )?
        .await_expr();
    let settle = id("page")?
        .method(
            "waitForLoadState",
            vec![
                Expr::str("networkidle"),
                Expr::object(vec![("timeout", id("SETTLE_TIMEOUT")?)]),
            ],
        )?
        .await_expr();
    let settle_warning = id("console")?.method(
        "warn",
        vec![Expr::template(vec![
            text("Network idle not reached for "),
            TemplatePart::expr(id("url")?),
            text(": "),
            error_message()?,
        ])],
    )?;
    let per_strategy = Stmt::try_catch(
        vec![
            Stmt::expr(goto),
            Stmt::try_catch(vec![Stmt::expr(settle)], "error", vec![Stmt::expr(settle_warning)])?,
            Stmt::ret(),
        ],
        "error",
        vec![Stmt::assign("lastError", id("error")?)?],
    )?;
    let pause = id("sleep")?
        .call(vec![backoff_expr(config.navigation.backoff, "NAVIGATION_DELAY")?])
        .await_expr();
    let outer = Stmt::for_inclusive(
        "attempt",
        Expr::num(1),
        attempts.clone(),
        vec![
            Stmt::for_of("strategy", id("NAVIGATION_STRATEGIES")?, vec![per_strategy])?,
            Stmt::if_then(id("attempt")?.lt(attempts), vec![Stmt::expr(pause)]),
        ],
    )?;
    let failure = id("Error")?.new_expr(vec![Expr::template(vec![
        text("Navigation to "),
        TemplatePart::expr(id("url")?),
        text(&format!(" failed after {} attempts: ", config.navigation.outer_attempts)),
        TemplatePart::expr(id("lastError")?.dot("message")?),
    ])]);
    Ok(JsFunctionBuilder::new_async("gotoWithFallback")?
        .params(&["page", "url"])?
        .stmt(Stmt::let_decl("lastError", Expr::null())?)
        .stmt(outer)
        .stmt(Stmt::throw(failure))
        .build())
}

/// `await withRetry('<label>', async () => { const field = await resolveField(...); <act>; })`
fn heal(label: &str, field: &str, act: Expr) -> GenResult<Vec<Stmt>> {
    let candidates = build_candidates(field);
    let resolve = id("resolveField")?
        .call(vec![id("page")?, Expr::str_array(&candidates.selectors())])
        .await_expr();
    let action = Expr::async_arrow(
        vec![],
        vec![Stmt::const_decl("field", resolve)?, Stmt::expr(act.await_expr())],
    );
    Ok(vec![Stmt::expr(id("withRetry")?.call(vec![Expr::str(label), action]).await_expr())])
}

fn step_body(step: &StepDescriptor, config: &RunConfig) -> GenResult<Vec<Stmt>> {
    match step {
        StepDescriptor::Navigate { url } => Ok(vec![Stmt::expr(
            id("gotoWithFallback")?
                .call(vec![id("page")?, Expr::str(config.resolve_url(url))])
                .await_expr(),
        )]),
        StepDescriptor::Fill { field, value } => heal(
            &step.describe(),
            field,
            id("field")?.method("fill", vec![Expr::str(value)])?,
        ),
        StepDescriptor::Click { field } => {
            heal(&step.describe(), field, id("field")?.method("click", vec![])?)
        }
        StepDescriptor::ExpectVisible { field } => heal(
            &step.describe(),
            field,
            id("expect")?.call(vec![id("field")?]).method("toBeVisible", vec![])?,
        ),
        StepDescriptor::Wait { ms } => Ok(vec![Stmt::expr(
            id("page")?.method("waitForTimeout", vec![Expr::millis(*ms)])?.await_expr(),
        )]),
    }
}

/// `await test.step('Step N: ...', async () => { try { ... } catch (error) { ... } });`
fn test_step(number: usize, step: &StepDescriptor, config: &RunConfig) -> GenResult<Stmt> {
    let report = id("console")?.method(
        "error",
        vec![Expr::template(vec![
            text(&format!("Step {number} failed: ")),
            error_message()?,
        ])],
    )?;
    let guarded = Stmt::try_catch(
        step_body(step, config)?,
        "error",
        vec![Stmt::expr(report), Stmt::throw(id("error")?)],
    )?;
    let title = format!("Step {number}: {}", step.describe());
    Ok(Stmt::expr(
        id("test")?
            .method("step", vec![Expr::str(title), Expr::async_arrow(vec![], vec![guarded])])?
            .await_expr(),
    ))
}

fn test_case(script: &TestScript, config: &RunConfig) -> GenResult<Expr> {
    let mut body = vec![Stmt::expr(
        id("test")?.method("setTimeout", vec![Expr::millis(config.test_timeout_ms)])?,
    )];
    for (index, step) in script.effective_steps().iter().enumerate() {
        body.push(test_step(index + 1, step, config)?);
    }
    Ok(id("test")?.call(vec![
        Expr::str(&script.name),
        Expr::async_arrow(vec![Param::destructure(&["page"])?], body),
    ]))
}

/// Blake3 over the script and the options that shape the output
pub fn input_hash(script: &TestScript, options: &RenderOptions) -> GenResult<String> {
    let input = serde_json::to_vec(&(script, &options.config))?;
    Ok(blake3::hash(&input).to_hex().to_string())
}

/// Lower a script to a module
pub fn render_test_file(script: &TestScript, options: &RenderOptions) -> GenResult<JsModule> {
    script.validate()?;
    let config = &options.config;

    let metadata = GenerationMetadata {
        tool: "healwright".to_string(),
        version: options.tool_version.clone(),
        input_hash: input_hash(script, options)?,
        timestamp: Utc::now().to_rfc3339(),
        regenerate_cmd: options.regenerate_cmd.clone(),
    };

    let module = JsModuleBuilder::new()
        .metadata(metadata)
        .comment(format!("Generated by healwright {} - DO NOT EDIT", options.tool_version))
        .comment(format!("Test: {}", script.name))
        .comment(format!("Regenerate: {}", options.regenerate_cmd))
        .import(&["test", "expect"], "@playwright/test")?
        .blank()
        .stmts(constants(config)?)
        .blank()
        .function(sleep_fn()?)
        .blank()
        .function(resolve_field_fn()?)
        .blank()
        .function(with_retry_fn(config)?)
        .blank()
        .function(goto_with_fallback_fn(config)?)
        .blank()
        .expr(test_case(script, config)?)
        .build();

    debug!(test = %script.name, steps = script.effective_steps().len(), "rendered test module");
    Ok(module)
}

/// Render, emit and write `<out_dir>/<slug>.spec.ts` plus its manifest
pub fn write_test_file(script: &TestScript, options: &RenderOptions, out_dir: &Path) -> GenResult<PathBuf> {
    let module = render_test_file(script, options)?;
    let source = generate(&module);
    let metadata = module
        .metadata
        .ok_or_else(|| GenError::script(&script.name, "missing generation metadata"))?;

    std::fs::create_dir_all(out_dir)?;
    let path = out_dir.join(script.file_name());
    write_with_manifest(&path, &source, metadata)?;
    info!(test = %script.name, path = %path.display(), "generated test file");
    Ok(path)
}
