//! `escenario validate`: check scenario files

use crate::commands::ValidateArgs;
use crate::error::{CliError, CliResult};
use escenario::{ScenarioResult, Suite};
use std::path::Path;

/// Parse and validate one file, returning its scenario count
pub fn check_file(path: &Path) -> ScenarioResult<usize> {
    let suite = Suite::load(path)?;
    suite.validate()?;
    Ok(suite.scenarios.len())
}

/// Validate every file, reporting each result on stdout
pub fn execute_validate(args: &ValidateArgs) -> CliResult<()> {
    let mut failed = 0;
    for path in &args.files {
        match check_file(path) {
            Ok(count) => println!("ok      {} ({count} scenarios)", path.display()),
            Err(e) => {
                failed += 1;
                println!("invalid {}: {e}", path.display());
            }
        }
    }
    if failed == 0 {
        Ok(())
    } else {
        Err(CliError::InvalidFiles { failed })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Write;

    fn yaml(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_valid_file() {
        let file = yaml(
            "name: s\nscenarios:\n  - id: A\n    title: a\n    steps:\n      - action: assert\n        matcher: { is: url_contains, fragment: /items }\n",
        );
        assert_eq!(check_file(file.path()).unwrap(), 1);
    }

    #[test]
    fn test_page_matcher_with_target_is_rejected() {
        let file = yaml(
            "name: s\nscenarios:\n  - id: A\n    title: a\n    steps:\n      - action: assert\n        target: { by: id, id: x }\n        matcher: { is: url_contains, fragment: /items }\n",
        );
        assert!(check_file(file.path()).is_err());
    }

    #[test]
    fn test_failures_are_counted() {
        let good = yaml("name: s\nscenarios: []\n");
        let bad = yaml("name: [unclosed\n");
        let args = ValidateArgs {
            files: vec![good.path().to_path_buf(), bad.path().to_path_buf()],
        };
        let err = execute_validate(&args).unwrap_err();
        assert!(matches!(err, CliError::InvalidFiles { failed: 1 }));
    }
}
