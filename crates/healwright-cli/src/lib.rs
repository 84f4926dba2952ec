//! Healwright CLI library
//!
//! Turns plain-language test plans into self-healing Playwright test
//! files, prints candidate selectors, and verifies generated files.

#![warn(missing_docs)]

mod commands;
mod config;
mod error;
pub mod handlers;
pub mod logging;
mod output;
pub mod plan;

pub use commands::{
    CandidatesArgs, Cli, ColorArg, Commands, ConfigArgs, ConfigSource, GenerateArgs, VerifyArgs,
};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use output::Reporter;
pub use plan::{PlannedTest, PromptParser, TestPlan};

/// Build the CLI configuration from global flags
#[must_use]
pub fn build_config(cli: &Cli) -> CliConfig {
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(cli.color.clone().into())
        .with_log_json(cli.log_json)
}

/// Dispatch a parsed command line
pub fn run(cli: &Cli) -> CliResult<()> {
    let config = build_config(cli);
    logging::init(&config);
    let reporter = Reporter::new(config.color.should_color(), config.verbosity.is_quiet());

    match &cli.command {
        Commands::Generate(args) => handlers::execute_generate(&reporter, args),
        Commands::Candidates(args) => handlers::execute_candidates(&reporter, args),
        Commands::Verify(args) => handlers::execute_verify(&reporter, args),
        Commands::Config(args) => handlers::execute_config(&reporter, args),
    }
}
