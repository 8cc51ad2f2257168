use crate::model::ReportTable;
use serde::Serialize;
use tracing::{debug, warn};

/// Spreadsheet tab names cannot be longer than this.
pub const MAX_NAME_LEN: usize = 31;

/// A named table awaiting export.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct ReportEntry {
    name: String,
    #[serde(rename = "rows")]
    table: ReportTable,
}

impl ReportEntry {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &ReportTable {
        &self.table
    }
}

/// The ordered, append-only collection of report entries built during one run.
///
/// Names longer than `MAX_NAME_LEN` characters are truncated. Names are not checked for
/// uniqueness; a duplicate is only logged.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Registry {
    entries: Vec<ReportEntry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: &str, table: impl Into<ReportTable>) {
        let name = truncate(name);
        if self.entries.iter().any(|e| e.name == name) {
            warn!("There is more than one report named '{name}'");
        }
        debug!("Adding report '{name}'");
        self.entries.push(ReportEntry {
            name,
            table: table.into(),
        });
    }

    pub fn entries(&self) -> &[ReportEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Keeps the first `MAX_NAME_LEN` characters of `name`.
fn truncate(name: &str) -> String {
    match name.char_indices().nth(MAX_NAME_LEN) {
        Some((end, _)) => name[..end].to_string(),
        None => name.to_string(),
    }
}
