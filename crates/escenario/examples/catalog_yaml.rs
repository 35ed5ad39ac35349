//! Export the built-in catalog as YAML scenario files
//!
//! Run with: `cargo run --example catalog_yaml -- <dir>`
//!
//! Each suite lands in `<dir>/<suite>.yaml`, ready to be edited and passed
//! back with `escenario run --file`.

use escenario::{catalog, ScenarioResult, SuiteConfig};
use std::path::PathBuf;

fn main() -> ScenarioResult<()> {
    let dir = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from("scenarios"), PathBuf::from);
    std::fs::create_dir_all(&dir)?;

    let config = SuiteConfig::default().with_env();
    for suite in catalog::all_suites(&config) {
        let path = dir.join(format!("{}.yaml", suite.name));
        let yaml = serde_yaml_ng::to_string(&suite)?;
        std::fs::write(&path, yaml)?;
        println!(
            "{:<14} {:>3} scenarios -> {}",
            suite.name,
            suite.scenarios.len(),
            path.display()
        );
    }
    Ok(())
}
