//! Config command handler

use healwright::RunConfig;

use crate::commands::{ConfigArgs, ConfigSource};
use crate::error::CliResult;
use crate::output::Reporter;

/// Load the configuration file (or defaults) and apply CLI overrides
pub fn effective_config(source: &ConfigSource) -> CliResult<RunConfig> {
    let mut config = match &source.config {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };
    if let Some(url) = &source.base_url {
        config = config.with_base_url(url);
    }
    config.validate()?;
    Ok(config)
}

/// Execute the config command
pub fn execute_config(reporter: &Reporter, args: &ConfigArgs) -> CliResult<()> {
    let config = effective_config(&args.source)?;
    let rendered = if args.json {
        serde_json::to_string_pretty(&config)?
    } else {
        config.to_yaml()?
    };
    reporter.data(&rendered);
    Ok(())
}
