use crate::api::{self, Source};
use crate::commands::Out;
use crate::model::Amount;
use crate::report::{default_plan, load_labels, CostReport, ReportEntry, ReportWindow};
use crate::{export, Config, Result, Settings};
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt::Write;
use tracing::{debug, info};

/// What the `run` command reports about each entry it exported.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct EntrySummary {
    pub name: String,
    pub rows: usize,
    pub columns: usize,
    /// The sum of the last column, rendered for display. Empty when the table has no columns.
    pub latest_total: String,
}

impl From<&ReportEntry> for EntrySummary {
    fn from(entry: &ReportEntry) -> Self {
        let table = entry.table().table();
        let latest_total = match table.column_count() {
            0 => String::new(),
            n => Amount::from(table.column_total(n - 1)).to_string(),
        };
        Self {
            name: entry.name().to_string(),
            rows: table.row_count(),
            columns: table.column_count(),
            latest_total,
        }
    }
}

/// Builds the standard set of reports for the window ending `today` and exports them to
/// `<reports>/<today>/`.
///
/// Account labels are fetched first on a best-effort basis. A failing billing query aborts the
/// run before anything is written.
pub async fn run(
    config: &Config,
    settings: Settings,
    source: &Source,
    today: NaiveDate,
) -> Result<Out<Vec<EntrySummary>>> {
    debug!("Running with {settings:?}");
    let clients = api::clients(source).await?;
    let labels = load_labels(clients.directory.as_ref()).await;

    let window = ReportWindow::new(today, settings.use_current_period());
    info!(
        "Reporting cost for {} and reservation coverage for {}",
        window.cost(),
        window.coverage()
    );
    let plan = default_plan(settings.cost_tags());
    let mut report = CostReport::new(settings, window, clients.billing, labels);
    report.run_plan(&plan).await?;

    let dir = export::run_dir(config.reports(), today);
    export::export(report.entries(), &dir).await?;

    let summary: Vec<EntrySummary> = report.entries().iter().map(EntrySummary::from).collect();
    let mut message = format!(
        "Wrote {} reports to '{}'",
        summary.len(),
        dir.display()
    );
    for s in &summary {
        // Writing to a String cannot fail.
        let _ = write!(
            message,
            "\n  {:<31} {:>4} rows {:>3} periods  latest {}",
            s.name, s.rows, s.columns, s.latest_total
        );
    }
    Ok(Out::new(message, summary))
}
