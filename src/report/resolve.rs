use crate::api::Directory;
use crate::model::LabelTable;
use crate::report::paginate::accumulate;
use crate::Result;
use anyhow::Context;
use tracing::{debug, warn};

/// Turns raw dimension keys into human-friendly labels.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    table: &'a LabelTable,
    label_field: &'a str,
}

impl<'a> Resolver<'a> {
    pub fn new(table: &'a LabelTable, label_field: &'a str) -> Self {
        Self { table, label_field }
    }

    pub fn resolve(&self, key: &str) -> String {
        resolve(key, self.table, self.label_field)
    }
}

/// Returns the `label_field` of the record for `key` in `table`. Returns `key` unchanged when the
/// key is unknown or its record has no such field. Never fails.
pub fn resolve(key: &str, table: &LabelTable, label_field: &str) -> String {
    table
        .get(key)
        .and_then(|record| record.field(label_field))
        .unwrap_or_else(|| key.to_string())
}

/// Fetches every account from the directory.
pub async fn fetch_labels(directory: &dyn Directory) -> Result<LabelTable> {
    let first = directory
        .list_accounts(None)
        .await
        .context("Unable to list accounts")?;
    let records = accumulate(Some(first), move |token| directory.list_accounts(Some(token)))
        .await
        .context("Unable to list accounts")?;
    Ok(LabelTable::from_records(records))
}

/// Like `fetch_labels`, but a failed lookup is logged and reported as `None`. Without labels every
/// dimension key is shown as-is.
pub async fn load_labels(directory: &dyn Directory) -> Option<LabelTable> {
    match fetch_labels(directory).await {
        Ok(table) => {
            debug!("Loaded {} account labels", table.len());
            Some(table)
        }
        Err(e) => {
            warn!("Getting account names failed, raw account IDs will be shown: {e:#}");
            None
        }
    }
}
