//! CLI command definitions using clap

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Escenario: run declarative browser scenarios against a live site
#[derive(Parser, Debug)]
#[command(name = "escenario")]
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
    /// Run scenarios in Chromium and write report.json
    Run(RunArgs),

    /// List scenarios without running them
    List(ListArgs),

    /// Check scenario files for errors
    Validate(ValidateArgs),

    /// Show the resolved configuration
    Config(ConfigArgs),
}

/// Which scenarios to load
#[derive(Args, Debug, Clone, Default)]
pub struct SelectionArgs {
    /// Built-in suite (default: all, unless --file is given)
    #[arg(short, long)]
    pub suite: Option<SuiteArg>,

    /// Scenario file (YAML or JSON); repeatable
    #[arg(long = "file", value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Only scenarios whose id or title contains this
    #[arg(long)]
    pub filter: Option<String>,

    /// Suite configuration file (YAML or JSON)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Built-in suites
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SuiteArg {
    /// Every built-in suite
    All,
    /// Login form
    Login,
    /// Product selection and checkout
    Checkout,
    /// Customer information popup
    CustomerInfo,
}

impl SuiteArg {
    /// Catalog names covered by this choice
    #[must_use]
    pub const fn names(self) -> &'static [&'static str] {
        match self {
            Self::All => &["login", "checkout", "customer-info"],
            Self::Login => &["login"],
            Self::Checkout => &["checkout"],
            Self::CustomerInfo => &["customer-info"],
        }
    }
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Scenario selection
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Parallel browser contexts
    #[arg(short = 'j', long)]
    pub workers: Option<usize>,

    /// Site under test (overrides baseUrl and ESCENARIO_BASE_URL)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Output directory for report.json and screenshots
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,
}

/// Arguments for the list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Scenario selection
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Output format
    #[arg(long, default_value = "text")]
    pub format: ListFormat,
}

/// List output format
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ListFormat {
    /// One line per scenario
    #[default]
    Text,
    /// Suites as JSON
    Json,
}

/// Arguments for the validate command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Scenario files to check
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Suite configuration file (YAML or JSON)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Check the configuration and exit non-zero when it cannot run
    #[arg(long)]
    pub check: bool,
}

/// Color argument
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}
