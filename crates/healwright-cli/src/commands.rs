//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::ColorChoice;

/// Healwright: generate self-healing Playwright tests from plain-language plans
#[derive(Parser, Debug)]
#[command(name = "healwright")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate Playwright test files from a plan
    Generate(GenerateArgs),

    /// Print the ordered candidate selectors for a field name
    Candidates(CandidatesArgs),

    /// Check generated files against their manifests
    Verify(VerifyArgs),

    /// Show the effective run configuration
    Config(ConfigArgs),
}

/// Arguments shared by commands that read a run configuration
#[derive(Parser, Debug, Default)]
pub struct ConfigSource {
    /// Run configuration file (YAML or JSON)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Base URL relative navigation targets are joined to
    #[arg(long, env = "HEALWRIGHT_BASE_URL")]
    pub base_url: Option<String>,
}

/// Arguments for the generate command
#[derive(Parser, Debug)]
pub struct GenerateArgs {
    /// Test plan (YAML)
    #[arg(short, long)]
    pub plan: PathBuf,

    /// Output directory for `<test>.spec.ts` files
    #[arg(short, long, default_value = "tests/generated")]
    pub out: PathBuf,

    /// Configuration source
    #[command(flatten)]
    pub source: ConfigSource,
}

/// Arguments for the candidates command
#[derive(Parser, Debug)]
pub struct CandidatesArgs {
    /// Logical field name, e.g. "username"
    pub field: String,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the verify command
#[derive(Parser, Debug)]
pub struct VerifyArgs {
    /// Generated files to check
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Configuration source
    #[command(flatten)]
    pub source: ConfigSource,

    /// Print JSON instead of YAML
    #[arg(long)]
    pub json: bool,
}

/// Color argument for CLI
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum ColorArg {
    /// Auto-detect
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}
