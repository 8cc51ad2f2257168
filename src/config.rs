//! Configuration file handling for cost-report.
//!
//! The configuration file is stored at `$COST_REPORT_HOME/config.json`. It holds the defaults for
//! a run: whether the still-open month is included, which account field names the accounts, how
//! credits are treated, which metric is read and which cost allocation tags get their own reports.
//! The command line can override some of these per run; the merged values form a `Settings`.

use crate::api::CreditsFilter;
use crate::model::DEFAULT_LABEL_FIELD;
use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_NAME: &str = "cost-report";
const CONFIG_VERSION: u8 = 1;
const CONFIG_JSON: &str = "config.json";
const REPORTS: &str = "reports";
const DEFAULT_METRIC: &str = "UnblendedCost";

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$COST_REPORT_HOME` and from there it loads `$COST_REPORT_HOME/config.json`.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    reports: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
}

impl Config {
    /// Creates the home directory, its `reports` subdirectory and a `config.json` with default
    /// settings.
    ///
    /// # Errors
    /// - Returns an error if a `config.json` already exists in `dir`.
    /// - Returns an error if any file operations fail.
    pub async fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the cost-report home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let config_path = root.join(CONFIG_JSON);
        if config_path.exists() {
            bail!(
                "A config file already exists at '{}'",
                config_path.display()
            )
        }
        let reports = root.join(REPORTS);
        utils::make_dir(&reports).await?;

        let config_file = ConfigFile::default();
        config_file.save(&config_path).await?;

        Ok(Self {
            root,
            reports,
            config_path,
            config_file,
        })
    }

    /// This will
    /// - validate that the home directory and the config file exist
    /// - load and validate the config file
    /// - return the loaded configuration object
    pub async fn load(home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = home.into();
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("The cost-report home directory is missing")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;

        Ok(Self {
            reports: root.join(REPORTS),
            root,
            config_path,
            config_file,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Where exported reports are written, one subdirectory per run date.
    pub fn reports(&self) -> &Path {
        &self.reports
    }

    /// The settings from the config file, before any per-run overrides.
    pub fn settings(&self) -> Settings {
        let file = &self.config_file;
        Settings {
            use_current_period: file.use_current_period,
            label_field: file.label_field.clone(),
            credits_filter: file.credits_filter,
            metric: file.metric.clone(),
            cost_tags: file.cost_tags.clone(),
        }
    }
}

/// The options of one run. Built from the config file and the command line, then handed to the
/// report pipeline; nothing downstream reads the environment.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Settings {
    use_current_period: bool,
    label_field: String,
    credits_filter: CreditsFilter,
    metric: String,
    cost_tags: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            use_current_period: false,
            label_field: DEFAULT_LABEL_FIELD.to_string(),
            credits_filter: CreditsFilter::default(),
            metric: DEFAULT_METRIC.to_string(),
            cost_tags: Vec::new(),
        }
    }
}

impl Settings {
    /// Include the current, still-open month as the last column.
    pub fn use_current_period(&self) -> bool {
        self.use_current_period
    }

    /// The account field shown in place of an account ID.
    pub fn label_field(&self) -> &str {
        &self.label_field
    }

    /// The credits filter for reports that do not name their own.
    pub fn credits_filter(&self) -> CreditsFilter {
        self.credits_filter
    }

    pub fn metric(&self) -> &str {
        &self.metric
    }

    pub fn cost_tags(&self) -> &[String] {
        &self.cost_tags
    }

    pub fn with_current_period(mut self, value: bool) -> Self {
        self.use_current_period = value;
        self
    }

    pub fn with_label_field(mut self, value: impl Into<String>) -> Self {
        self.label_field = value.into();
        self
    }

    pub fn with_credits_filter(mut self, value: CreditsFilter) -> Self {
        self.credits_filter = value;
        self
    }

    pub fn with_cost_tags(mut self, value: Vec<String>) -> Self {
        self.cost_tags = value;
        self
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "cost-report",
///   "config_version": 1,
///   "use_current_period": false,
///   "label_field": "Email",
///   "credits_filter": "exclude",
///   "metric": "UnblendedCost",
///   "cost_tags": ["user:team"]
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "cost-report"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    #[serde(default)]
    use_current_period: bool,

    #[serde(default = "default_label_field")]
    label_field: String,

    #[serde(default)]
    credits_filter: CreditsFilter,

    /// The cost metric to report, e.g. "UnblendedCost" or "AmortizedCost"
    #[serde(default = "default_metric")]
    metric: String,

    /// Cost allocation tag keys that each get a total and a change report
    #[serde(default)]
    cost_tags: Vec<String>,
}

fn default_label_field() -> String {
    DEFAULT_LABEL_FIELD.to_string()
}

fn default_metric() -> String {
    DEFAULT_METRIC.to_string()
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            use_current_period: false,
            label_field: default_label_field(),
            credits_filter: CreditsFilter::default(),
            metric: default_metric(),
            cost_tags: Vec::new(),
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile from `path` and checks its `app_name`.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path)
            .await
            .with_context(|| format!("Failed to load config file at {}", path.display()))?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );

        Ok(config)
    }

    /// Saves the ConfigFile to `path`.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_config_create_and_load() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("cost_home");

        let created = Config::create(&home).await.unwrap();
        assert!(created.reports().is_dir());
        assert!(created.config_path().is_file());

        let loaded = Config::load(&home).await.unwrap();
        assert_eq!(loaded.root(), created.root());
        assert_eq!(loaded.settings(), Settings::default());
    }

    #[tokio::test]
    async fn test_config_create_twice_fails() {
        let dir = TempDir::new().unwrap();
        Config::create(dir.path()).await.unwrap();
        let result = Config::create(dir.path()).await;
        assert!(result.unwrap_err().to_string().contains("already exists"));
    }

    #[tokio::test]
    async fn test_config_load_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(Config::load(dir.path()).await.is_err());
    }

    #[tokio::test]
    async fn test_config_file_load_with_minimal_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_JSON);
        let json = r#"{
            "app_name": "cost-report",
            "config_version": 1,
            "credits_filter": "include",
            "cost_tags": ["user:team"]
        }"#;
        utils::write(&path, json).await.unwrap();

        let config = Config::load(dir.path()).await.unwrap();
        let settings = config.settings();
        assert_eq!(settings.credits_filter(), CreditsFilter::Include);
        assert_eq!(settings.label_field(), "Email");
        assert_eq!(settings.metric(), "UnblendedCost");
        assert_eq!(settings.cost_tags(), ["user:team"]);
        assert!(!settings.use_current_period());
    }

    #[tokio::test]
    async fn test_config_file_load_invalid_app_name() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_JSON);
        utils::write(&path, r#"{"app_name": "billing", "config_version": 1}"#)
            .await
            .unwrap();

        let result = ConfigFile::load(&path).await;
        assert!(result.unwrap_err().to_string().contains("Invalid app_name"));
    }

    #[tokio::test]
    async fn test_config_file_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("file.json");
        let original = ConfigFile {
            use_current_period: true,
            metric: "AmortizedCost".to_string(),
            ..ConfigFile::default()
        };
        original.save(&path).await.unwrap();
        assert_eq!(original, ConfigFile::load(&path).await.unwrap());
    }

    #[test]
    fn test_settings_overrides() {
        let settings = Settings::default()
            .with_current_period(true)
            .with_label_field("Name")
            .with_cost_tags(vec!["team".to_string()]);
        assert!(settings.use_current_period());
        assert_eq!(settings.label_field(), "Name");
        assert_eq!(settings.cost_tags(), ["team"]);
        assert_eq!(settings.credits_filter(), CreditsFilter::Exclude);
    }
}
