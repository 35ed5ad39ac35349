//! `escenario list`: print scenarios without running them

use crate::commands::{ListArgs, ListFormat};
use crate::error::CliResult;
use crate::handlers::{resolve_config, select_suites};
use escenario::{Expectation, Scenario, Suite};
use std::fmt::Write as _;

/// One line per scenario: id, title and any declared expectation
#[must_use]
pub fn render_text(suites: &[Suite]) -> String {
    let mut out = String::new();
    for suite in suites {
        let _ = writeln!(out, "{} ({} scenarios)", suite.name, suite.scenarios.len());
        for scenario in &suite.scenarios {
            let _ = writeln!(out, "  {}", describe(scenario));
        }
    }
    out
}

fn describe(scenario: &Scenario) -> String {
    let mut line = format!("{:<7} {}", scenario.id(), scenario.title());
    if let Expectation::Fail { reason } = scenario.expectation() {
        let _ = write!(line, " [expected to fail: {reason}]");
    }
    if let Some(reason) = scenario.skip_reason() {
        let _ = write!(line, " [skipped: {reason}]");
    }
    line
}

/// List the selected scenarios on stdout
pub fn execute_list(args: &ListArgs) -> CliResult<()> {
    let config = resolve_config(args.selection.config.as_deref())?;
    let suites = select_suites(&args.selection, &config)?;
    match args.format {
        ListFormat::Text => print!("{}", render_text(&suites)),
        ListFormat::Json => println!("{}", serde_json::to_string_pretty(&suites)?),
    }
    Ok(())
}
