use crate::commands::Out;
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the home directory, its `reports` subdirectory and a default `config.json`.
///
/// # Errors
/// - Returns an error if the directory already holds a config file or a file operation fails.
pub async fn init(home: &Path) -> Result<Out<()>> {
    let config = Config::create(home)
        .await
        .context("Unable to create the home directory and config")?;
    Ok(format!(
        "Created the cost-report home directory with default settings in '{}'",
        config.config_path().display()
    )
    .into())
}
