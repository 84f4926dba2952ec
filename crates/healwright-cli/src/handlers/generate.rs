//! Generate command handler

use std::path::{Path, PathBuf};

use healwright::RunConfig;
use healwright_gen::{write_test_file, RenderOptions};
use tracing::info;

use crate::commands::GenerateArgs;
use crate::error::CliResult;
use crate::handlers::config::effective_config;
use crate::output::Reporter;
use crate::plan::{PromptParser, TestPlan};

/// Command line recorded in generated headers and manifests
#[must_use]
pub fn regenerate_command(plan: &Path, out: &Path) -> String {
    format!("healwright generate --plan {} --out {}", plan.display(), out.display())
}

/// Parse every test first, then write one file per test
///
/// A plan with any unrecognised prompt writes nothing.
pub fn generate_plan(plan: &TestPlan, config: &RunConfig, options_cmd: &str, out: &Path) -> CliResult<Vec<PathBuf>> {
    let parser = PromptParser::new()?;
    let scripts = plan.to_scripts(&parser)?;
    let options = RenderOptions::from_config(config).with_regenerate_cmd(options_cmd);
    scripts
        .iter()
        .map(|script| Ok(write_test_file(script, &options, out)?))
        .collect()
}

/// Execute the generate command
pub fn execute_generate(reporter: &Reporter, args: &GenerateArgs) -> CliResult<()> {
    let plan = TestPlan::load(&args.plan)?;
    let mut config = effective_config(&args.source)?;
    // Plan base URL applies unless the flag or env var set one.
    if let (None, Some(url)) = (&args.source.base_url, &plan.base_url) {
        config = config.with_base_url(url);
        config.validate()?;
    }

    let cmd = regenerate_command(&args.plan, &args.out);
    let written = generate_plan(&plan, &config, &cmd, &args.out)?;
    for path in &written {
        reporter.success(&format!("wrote {}", path.display()));
    }
    info!(count = written.len(), out = %args.out.display(), "generation complete");
    reporter.summary("generated", written.len(), 0);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::commands::ConfigSource;
    use crate::error::CliError;

    const PLAN: &str = "base_url: http://plan.example\ntests:\n  - name: Login flow\n    start_url: /login\n    prompts:\n      - enter \"bob\" in username\n      - click login\n";

    fn args(dir: &Path, base_url: Option<&str>) -> GenerateArgs {
        let plan = dir.join("plan.yaml");
        std::fs::write(&plan, PLAN).unwrap();
        GenerateArgs {
            plan,
            out: dir.join("e2e"),
            source: ConfigSource {
                config: None,
                base_url: base_url.map(str::to_string),
            },
        }
    }

    #[test]
    fn test_generates_file_with_plan_base_url() {
        let dir = tempfile::tempdir().unwrap();
        let args = args(dir.path(), None);
        execute_generate(&Reporter::new(false, true), &args).unwrap();

        let src = std::fs::read_to_string(args.out.join("login-flow.spec.ts")).unwrap();
        assert!(src.contains("await gotoWithFallback(page, 'http://plan.example/login');"));
        assert!(src.contains("// Regenerate: healwright generate --plan"));
        healwright_gen::verify(&args.out.join("login-flow.spec.ts")).unwrap();
    }

    #[test]
    fn test_flag_base_url_beats_plan() {
        let dir = tempfile::tempdir().unwrap();
        let args = args(dir.path(), Some("http://flag.example"));
        execute_generate(&Reporter::new(false, true), &args).unwrap();
        let src = std::fs::read_to_string(args.out.join("login-flow.spec.ts")).unwrap();
        assert!(src.contains("'http://flag.example/login'"));
    }

    #[test]
    fn test_bad_prompt_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let plan = TestPlan::from_yaml_str(
            "tests:\n  - name: first\n    prompts: [click ok]\n  - name: second\n    prompts: [moonwalk]\n",
        )
        .unwrap();
        let out = dir.path().join("e2e");
        let err = generate_plan(&plan, &RunConfig::default(), "cmd", &out).unwrap_err();
        match err {
            CliError::UnrecognisedPrompt { prompt, .. } => assert_eq!(prompt, "moonwalk"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(!out.exists());
    }
}
