//! `escenario run`: execute scenarios in Chromium

use crate::commands::RunArgs;
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::handlers::{resolve_config, select_suites};
use crate::output::ProgressReporter;
use escenario::{Report, Suite, SuiteConfig};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// File name of the JSON report inside the output directory
pub const REPORT_FILE: &str = "report.json";

/// Apply command-line overrides on top of the file and environment
pub fn apply_overrides(mut config: SuiteConfig, args: &RunArgs) -> SuiteConfig {
    if let Some(ref url) = args.base_url {
        config.base_url.clone_from(url);
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    if let Some(ref dir) = args.output {
        config.output_dir.clone_from(dir);
    }
    if args.headed {
        config.headless = false;
    }
    config
}

/// Run the selected scenarios and write the report
pub fn execute_run(cli: &CliConfig, args: &RunArgs) -> CliResult<()> {
    let config = apply_overrides(resolve_config(args.selection.config.as_deref())?, args);
    config.validate()?;
    let suites = select_suites(&args.selection, &config)?;
    let total: usize = suites.iter().map(|s| s.scenarios.len()).sum();
    if total == 0 {
        return Err(CliError::invalid_argument("no scenarios match the selection"));
    }

    let mut reporter = ProgressReporter::new(cli.color.should_color(), cli.verbosity.is_quiet());
    reporter.header(&format!("Running {total} scenario(s) against {}", config.base_url));
    reporter.start_progress(total as u64, "starting");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let reporter = std::sync::Arc::new(reporter);
    let report = runtime.block_on(run_in_browser(&config, &suites, reporter.clone()))?;
    reporter.finish();

    let path = report_path(&config);
    report.write_json(&path)?;
    info!(path = %path.display(), "report written");

    let summary = report.summary();
    reporter.summary(&summary, Duration::from_millis(report.duration_ms));
    reporter.info(&format!("Report: {}", path.display()));

    let unexpected = report.unexpected();
    if unexpected.is_empty() {
        Ok(())
    } else {
        for entry in &unexpected {
            reporter.failure(&format!("{} {}", entry.id, entry.title));
        }
        Err(CliError::RunFailed {
            unexpected: unexpected.len(),
        })
    }
}

/// Where the JSON report goes
#[must_use]
pub fn report_path(config: &SuiteConfig) -> PathBuf {
    config.output_dir.join(REPORT_FILE)
}

#[cfg(feature = "browser")]
async fn run_in_browser(
    config: &SuiteConfig,
    suites: &[Suite],
    reporter: std::sync::Arc<ProgressReporter>,
) -> CliResult<Report> {
    let factory = escenario::CdpFactory::launch(config).await?;
    let runner = escenario::ScenarioRunner::new(config.clone()).with_observer(reporter);
    let report = runner.run_parallel(&factory, suites).await;
    if let Err(e) = factory.shutdown().await {
        tracing::warn!(error = %e, "chromium did not shut down cleanly");
    }
    Ok(report)
}

#[cfg(not(feature = "browser"))]
async fn run_in_browser(
    _config: &SuiteConfig,
    _suites: &[Suite],
    _reporter: std::sync::Arc<ProgressReporter>,
) -> CliResult<Report> {
    Err(CliError::BrowserUnavailable)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::commands::{Cli, Commands};
    use clap::Parser;

    fn run_args(argv: &[&str]) -> RunArgs {
        let mut full = vec!["escenario", "run"];
        full.extend_from_slice(argv);
        match Cli::parse_from(full).command {
            Commands::Run(args) => args,
            other => panic!("expected Run, got {other:?}"),
        }
    }

    #[test]
    fn test_overrides_win() {
        let args = run_args(&[
            "--base-url",
            "http://localhost:8080/",
            "-j",
            "2",
            "-o",
            "out",
            "--headed",
        ]);
        let config = apply_overrides(SuiteConfig::default(), &args);
        assert_eq!(config.base_url, "http://localhost:8080/");
        assert_eq!(config.workers, 2);
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert!(!config.headless);
        assert_eq!(report_path(&config), PathBuf::from("out/report.json"));
    }

    #[test]
    fn test_no_overrides_keep_config() {
        let config = apply_overrides(SuiteConfig::default(), &run_args(&[]));
        assert_eq!(config, SuiteConfig::default());
    }

    #[test]
    fn test_invalid_config_stops_before_launch() {
        let args = run_args(&["-j", "0"]);
        let err = execute_run(&CliConfig::default(), &args).unwrap_err();
        assert!(err.to_string().contains("workers"));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_empty_selection_is_rejected() {
        let args = run_args(&["--filter", "no-such-scenario"]);
        let err = execute_run(&CliConfig::default(), &args).unwrap_err();
        assert!(matches!(err, CliError::InvalidArgument { .. }));
    }
}
