//! Writes registry entries to disk: one CSV file per entry plus a `report.json` holding them all.

use crate::model::Table;
use crate::report::ReportEntry;
use crate::{utils, Result};
use anyhow::Context;
use chrono::NaiveDate;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const REPORT_JSON: &str = "report.json";

/// The directory for a run on `date`, e.g. `reports/2024-03-15`.
pub fn run_dir(reports: &Path, date: NaiveDate) -> PathBuf {
    reports.join(date.format("%Y-%m-%d").to_string())
}

/// Writes `entries` into `dir`, creating it if needed. Returns the paths written, CSV files first
/// in entry order, then `report.json`.
///
/// Entries whose names map to the same file get a numeric suffix (`Total-2.csv`) so that every
/// entry has its own file.
pub async fn export(entries: &[ReportEntry], dir: &Path) -> Result<Vec<PathBuf>> {
    utils::make_dir(dir)
        .await
        .context("Unable to create the report directory")?;

    let mut written = Vec::with_capacity(entries.len() + 1);
    for (entry, stem) in entries.iter().zip(file_stems(entries)) {
        let path = dir.join(format!("{stem}.csv"));
        let data = to_csv(entry.table().table())
            .with_context(|| format!("Unable to write '{}' as CSV", entry.name()))?;
        utils::write(&path, data).await?;
        debug!("Wrote {}", path.display());
        written.push(path);
    }

    let path = dir.join(REPORT_JSON);
    let json = serde_json::to_string_pretty(entries).context("Unable to serialize the report")?;
    utils::write(&path, json).await?;
    written.push(path);
    Ok(written)
}

/// Header `label,<period starts..>`, then one line per row.
fn to_csv(table: &Table) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    let mut header = vec!["label".to_string()];
    header.extend(table.columns().iter().map(|c| c.to_string()));
    writer.write_record(&header)?;
    for (label, values) in table.iter() {
        let mut record = vec![label.to_string()];
        record.extend(values.iter().map(|v| v.normalize().to_string()));
        writer.write_record(&record)?;
    }
    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Unable to flush CSV data: {e}"))
}

/// One distinct file stem per entry, in entry order. Stems are compared without regard to case
/// since some file systems do not tell `Total` from `total`.
fn file_stems(entries: &[ReportEntry]) -> Vec<String> {
    let mut taken = HashSet::new();
    entries
        .iter()
        .map(|entry| {
            let base = file_stem(entry.name());
            let mut stem = base.clone();
            let mut n = 2;
            while !taken.insert(stem.to_lowercase()) {
                stem = format!("{base}-{n}");
                n += 1;
            }
            if stem != base {
                warn!(
                    "More than one report is named '{}', writing this one to '{stem}.csv'",
                    entry.name()
                );
            }
            stem
        })
        .collect()
}

/// Entry names may hold characters that are not valid in a file name.
fn file_stem(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '\0' => '_',
            c => c,
        })
        .collect()
}
