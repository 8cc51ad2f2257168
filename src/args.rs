//! These structs provide the CLI interface for the cost-report CLI.

use crate::api::{CreditsFilter, Source};
use crate::Settings;
use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// cost-report: monthly cost pivot tables from a billing API.
///
/// Queries twelve months of cost and usage grouped by service, account, region and any cost
/// allocation tags you configure, and writes each grouping as a table with one row per service,
/// account, region or tag value and one column per month. Each table also gets a companion table
/// showing the month-over-month change.
///
/// Run `cost-report init` once to create the home directory, then `cost-report run`.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the home directory and a config.json with default settings.
    Init,
    /// Build every report and export it to $COST_REPORT_HOME/reports/<today>/.
    ///
    /// Without --fixture the live billing API is queried, which needs a build with the `aws`
    /// feature and credentials in the environment.
    Run(RunArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where the configuration and exported reports are held. Defaults to
    /// ~/cost-report
    #[arg(long, env = "COST_REPORT_HOME", default_value_t = default_home())]
    home: DisplayPath,
}

impl Common {
    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn home(&self) -> &DisplayPath {
        &self.home
    }
}

/// (Not shown): Args for the `cost-report run` command.
#[derive(Debug, Parser, Clone, Default)]
pub struct RunArgs {
    /// Replay recorded billing responses from this JSON file instead of calling the billing API.
    #[arg(long)]
    fixture: Option<PathBuf>,

    /// Include the current, still-open month as the last column. `--current-period=false` turns
    /// it off when the config file turns it on.
    #[arg(
        long,
        env = "COST_REPORT_CURRENT_PERIOD",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    current_period: Option<bool>,

    /// The account field shown in place of an account ID, e.g. Email or Name.
    #[arg(long, env = "COST_REPORT_LABEL_FIELD")]
    label_field: Option<String>,

    /// Comma separated cost allocation tag keys that each get a total and a change report.
    #[arg(long, env = "COST_TAGS", value_delimiter = ',')]
    cost_tags: Option<Vec<String>>,

    /// How credits, refunds and upfront fees are counted in reports that do not set their own.
    #[arg(long, value_enum)]
    credits_filter: Option<CreditsFilter>,
}

impl RunArgs {
    pub fn fixture(&self) -> Option<&Path> {
        self.fixture.as_deref()
    }

    pub fn current_period(&self) -> Option<bool> {
        self.current_period
    }

    pub fn label_field(&self) -> Option<&str> {
        self.label_field.as_deref()
    }

    pub fn cost_tags(&self) -> Option<&[String]> {
        self.cost_tags.as_deref()
    }

    pub fn credits_filter(&self) -> Option<CreditsFilter> {
        self.credits_filter
    }

    pub fn source(&self) -> Source {
        match &self.fixture {
            Some(path) => Source::Fixture(path.clone()),
            None => Source::Aws,
        }
    }

    /// Applies the options given on the command line to the `settings` from the config file.
    pub fn apply(&self, mut settings: Settings) -> Settings {
        if let Some(current_period) = self.current_period {
            settings = settings.with_current_period(current_period);
        }
        if let Some(label_field) = &self.label_field {
            settings = settings.with_label_field(label_field.as_str());
        }
        if let Some(cost_tags) = &self.cost_tags {
            let tags = cost_tags
                .iter()
                .map(|t| t.trim())
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect();
            settings = settings.with_cost_tags(tags);
        }
        if let Some(credits_filter) = self.credits_filter {
            settings = settings.with_credits_filter(credits_filter);
        }
        settings
    }
}

fn default_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("cost-report"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --home or COST_REPORT_HOME instead of relying on the default \
                home directory. If you continue using the program right now, you may have \
                problems!",
            );
            PathBuf::from("cost-report")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run() {
        let args = Args::parse_from([
            "cost-report",
            "--home",
            "/tmp/cr",
            "run",
            "--fixture",
            "f.json",
            "--current-period",
            "--cost-tags",
            "user:team, project",
            "--credits-filter",
            "include",
        ]);
        assert_eq!(args.common().home().path(), Path::new("/tmp/cr"));
        let Command::Run(run) = args.command() else {
            panic!("expected run");
        };
        assert_eq!(run.source(), Source::Fixture(PathBuf::from("f.json")));

        let settings = run.apply(Settings::default());
        assert!(settings.use_current_period());
        assert_eq!(settings.cost_tags(), ["user:team", "project"]);
        assert_eq!(settings.credits_filter(), CreditsFilter::Include);
        assert_eq!(settings.label_field(), "Email");
    }

    #[test]
    fn test_current_period_can_be_turned_off() {
        let from_config = Settings::default().with_current_period(true);
        let args = Args::parse_from(["cost-report", "run", "--current-period=false"]);
        let Command::Run(run) = args.command() else {
            panic!("expected run");
        };
        assert_eq!(run.current_period(), Some(false));
        assert!(!run.apply(from_config.clone()).use_current_period());

        let args = Args::parse_from(["cost-report", "run"]);
        let Command::Run(run) = args.command() else {
            panic!("expected run");
        };
        assert!(run.apply(from_config).use_current_period());
    }

    #[test]
    fn test_no_overrides_keep_settings() {
        let settings = Settings::default().with_cost_tags(vec!["team".to_string()]);
        let applied = RunArgs::default().apply(settings.clone());
        assert_eq!(applied, settings);
        assert_eq!(RunArgs::default().source(), Source::Aws);
    }

    #[test]
    fn test_log_level() {
        let args = Args::parse_from(["cost-report", "--log-level", "debug", "init"]);
        assert_eq!(args.common().log_level(), LevelFilter::DEBUG);
    }
}
