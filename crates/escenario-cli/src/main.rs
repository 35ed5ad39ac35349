//! Escenario CLI: run declarative browser scenarios
//!
//! ## Usage
//!
//! ```bash
//! escenario run                          # Whole built-in catalog
//! escenario run --suite login -j 2       # One suite, two browser contexts
//! escenario run --file extra.yaml        # Scenarios from a file
//! escenario list --filter TC12           # What would run
//! escenario config --config shop.yaml    # Resolved configuration
//! ```

use clap::Parser;
use escenario_cli::{
    handlers, init_tracing, Cli, CliConfig, CliResult, ColorChoice, Commands, Verbosity,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let config = build_config(&cli);
    init_tracing(&config);

    match cli.command {
        Commands::Run(args) => handlers::run::execute_run(&config, &args),
        Commands::List(args) => handlers::list::execute_list(&args),
        Commands::Validate(args) => handlers::validate::execute_validate(&args),
        Commands::Config(args) => handlers::config::execute_config(&args),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let color: ColorChoice = cli.color.clone().into();
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(color)
        .with_log_json(cli.log_json)
}
