//! `escenario config`: show the resolved suite configuration

use crate::commands::ConfigArgs;
use crate::error::CliResult;
use crate::handlers::resolve_config;
use escenario::SuiteConfig;

/// Configuration as YAML, keys as they appear in configuration files
pub fn render(config: &SuiteConfig) -> CliResult<String> {
    Ok(serde_yaml_ng::to_string(config)?)
}

/// Print the configuration; with `--check`, fail when it cannot run
pub fn execute_config(args: &ConfigArgs) -> CliResult<()> {
    let config = resolve_config(args.config.as_deref())?;
    print!("{}", render(&config)?);
    if args.check {
        config.validate()?;
    }
    Ok(())
}
