//! Command handlers
//!
//! Each submodule implements one subcommand; the helpers here resolve the
//! suite configuration and the scenario selection they share.

pub mod config;
pub mod list;
pub mod run;
pub mod validate;

use crate::commands::{SelectionArgs, SuiteArg};
use crate::error::{CliError, CliResult};
use escenario::{catalog, Suite, SuiteConfig};
use std::path::Path;
use tracing::debug;

/// Load the configuration file (if any), then apply environment overrides
pub fn resolve_config(path: Option<&Path>) -> CliResult<SuiteConfig> {
    let config = match path {
        Some(path) => {
            debug!(path = %path.display(), "loading configuration");
            SuiteConfig::load(path)?
        }
        None => SuiteConfig::default(),
    };
    Ok(config.with_env())
}

/// Built-in suites and scenario files named by the selection, filtered
pub fn select_suites(selection: &SelectionArgs, config: &SuiteConfig) -> CliResult<Vec<Suite>> {
    let builtin = match (selection.suite, selection.files.is_empty()) {
        (Some(choice), _) => choice.names(),
        (None, true) => SuiteArg::All.names(),
        (None, false) => &[],
    };

    let mut suites = Vec::new();
    for name in builtin {
        let suite = catalog::suite_by_name(name, config)
            .ok_or_else(|| CliError::invalid_argument(format!("unknown suite '{name}'")))?;
        suites.push(suite);
    }
    for path in &selection.files {
        let suite = Suite::load(path)?;
        suite.validate()?;
        suites.push(suite);
    }

    if let Some(ref pattern) = selection.filter {
        suites = suites
            .into_iter()
            .map(|suite| suite.filtered(pattern))
            .filter(|suite| !suite.scenarios.is_empty())
            .collect();
    }
    Ok(suites)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Write;

    fn selection() -> SelectionArgs {
        SelectionArgs::default()
    }

    #[test]
    fn test_default_selection_is_whole_catalog() {
        let suites = select_suites(&selection(), &SuiteConfig::default()).unwrap();
        let names: Vec<&str> = suites.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["login", "checkout", "customer-info"]);
    }

    #[test]
    fn test_filter_drops_empty_suites() {
        let args = SelectionArgs {
            filter: Some("TC12".to_string()),
            ..selection()
        };
        let suites = select_suites(&args, &SuiteConfig::default()).unwrap();
        let ids: Vec<&str> = suites
            .iter()
            .flat_map(|s| s.scenarios.iter().map(|sc| sc.id()))
            .collect();
        assert!(suites.iter().all(|s| s.name != "login"));
        assert!(ids.contains(&"TC120"));
        assert!(ids.contains(&"TC125"));
    }

    #[test]
    fn test_files_replace_default_catalog() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "name: extra\nscenarios:\n  - id: X1\n    title: home\n    steps:\n      - action: goto_site"
        )
        .unwrap();
        let args = SelectionArgs {
            files: vec![file.path().to_path_buf()],
            ..selection()
        };

        let suites = select_suites(&args, &SuiteConfig::default()).unwrap();
        assert_eq!(suites.len(), 1);
        assert_eq!(suites[0].name, "extra");

        let args = SelectionArgs {
            suite: Some(SuiteArg::Login),
            ..args
        };
        let suites = select_suites(&args, &SuiteConfig::default()).unwrap();
        assert_eq!(suites.len(), 2);
    }

    #[test]
    fn test_config_file_loads() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "baseUrl: http://localhost:3000/\nworkers: 3").unwrap();
        let config = resolve_config(Some(file.path())).unwrap();
        assert_eq!(config.workers, 3);
    }
}
