//! The report pipeline: query, accumulate pages, pivot, optionally take the change, register.
//!
//! A `CostReport` is built once per run with the run's `Settings`, its `ReportWindow`, a billing
//! client and (if the account directory could be read) a `LabelTable`. Each `add_report` or
//! `add_ri_report` call runs its queries to completion before returning and appends exactly one
//! entry to the registry, so entries appear in call order.

mod delta;
mod paginate;
mod pivot;
mod plan;
mod registry;
mod resolve;
mod window;

pub use delta::compute_delta;
pub use paginate::accumulate;
pub use pivot::{build_coverage, build_pivot, COVERAGE_ROW};
pub use plan::{default_plan, PlanItem};
pub use registry::{Registry, ReportEntry, MAX_NAME_LEN};
pub use resolve::{fetch_labels, load_labels, resolve, Resolver};
pub use window::ReportWindow;

use crate::api::{CostExplorer, CostQuery, CoverageQuery, CreditsFilter, GroupDefinition};
use crate::model::{LabelTable, ReportTable};
use crate::{Result, Settings};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Whether a cost report shows absolute amounts or period-over-period changes.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum Style {
    #[default]
    Total,
    Change,
}

serde_plain::derive_display_from_serialize!(Style);
serde_plain::derive_fromstr_from_deserialize!(Style);

/// Builds the report entries of one run.
pub struct CostReport {
    settings: Settings,
    window: ReportWindow,
    billing: Box<dyn CostExplorer>,
    labels: LabelTable,
    registry: Registry,
}

impl CostReport {
    /// `labels` is `None` when the account directory could not be read, in which case every
    /// dimension key is shown as-is.
    pub fn new(
        settings: Settings,
        window: ReportWindow,
        billing: Box<dyn CostExplorer>,
        labels: Option<LabelTable>,
    ) -> Self {
        Self {
            settings,
            window,
            billing,
            labels: labels.unwrap_or_default(),
            registry: Registry::new(),
        }
    }

    /// Queries cost and usage grouped by `group_by` (ungrouped when empty), pivots it and appends
    /// it to the registry as `name`. `credits` of `None` uses the run-wide credits filter.
    pub async fn add_report(
        &mut self,
        name: &str,
        group_by: Vec<GroupDefinition>,
        style: Style,
        credits: Option<CreditsFilter>,
    ) -> Result<()> {
        let credits = credits.unwrap_or(self.settings.credits_filter());
        let query = CostQuery::new(self.window.cost(), self.settings.metric())
            .group_by(group_by)
            .filter(credits.expression());
        debug!(
            "Building '{name}' ({style}, credits {credits}, grouping '{}')",
            query.signature()
        );

        let billing = self.billing.as_ref();
        let first = billing
            .get_cost_and_usage(&query)
            .await
            .with_context(|| format!("The cost and usage query for '{name}' failed"))?;
        let records = accumulate(Some(first), |token| {
            let next = query.page(token);
            async move { billing.get_cost_and_usage(&next).await }
        })
        .await
        .with_context(|| format!("The cost and usage query for '{name}' failed"))?;

        let resolver = Resolver::new(&self.labels, self.settings.label_field());
        let pivot = build_pivot(&records, &resolver);
        let table: ReportTable = match style {
            Style::Total => pivot.into(),
            Style::Change => compute_delta(&pivot).into(),
        };
        self.registry.add(name, table);
        Ok(())
    }

    /// Queries reservation coverage and appends it to the registry as the single-row table
    /// `name`.
    pub async fn add_ri_report(&mut self, name: &str) -> Result<()> {
        debug!("Building '{name}' (reservation coverage)");
        let query = CoverageQuery::new(self.window.coverage());
        let billing = self.billing.as_ref();
        let first = billing
            .get_reservation_coverage(&query)
            .await
            .with_context(|| format!("The reservation coverage query for '{name}' failed"))?;
        let records = accumulate(Some(first), |token| {
            let next = query.page(token);
            async move { billing.get_reservation_coverage(&next).await }
        })
        .await
        .with_context(|| format!("The reservation coverage query for '{name}' failed"))?;
        self.registry.add(name, build_coverage(&records));
        Ok(())
    }

    /// Runs every item of `plan` in order. The first failing query stops the run.
    pub async fn run_plan(&mut self, plan: &[PlanItem]) -> Result<()> {
        for item in plan {
            match item {
                PlanItem::Cost {
                    name,
                    group_by,
                    style,
                    credits,
                } => {
                    self.add_report(name, group_by.clone(), *style, *credits)
                        .await?
                }
                PlanItem::Coverage { name } => self.add_ri_report(name).await?,
            }
        }
        info!("Built {} reports", self.registry.len());
        Ok(())
    }

    pub fn entries(&self) -> &[ReportEntry] {
        self.registry.entries()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Expression, Page};
    use crate::model::{AccountRecord, TOTAL_ROW};
    use crate::test::{coverage, date, dec, grouped, ungrouped, TestCostExplorer};
    use rust_decimal::Decimal;

    fn report(billing: TestCostExplorer, labels: Option<LabelTable>) -> CostReport {
        CostReport::new(
            Settings::default(),
            ReportWindow::new(date("2024-03-15"), false),
            Box::new(billing),
            labels,
        )
    }

    #[tokio::test]
    async fn test_total_and_change() {
        let billing = TestCostExplorer::new().with_cost_pages(vec![
            Page::new(
                vec![grouped("2024-01-01", &[("svcA", "100.0")])],
                Some("p2".to_string()),
            ),
            Page::last(vec![grouped("2024-02-01", &[("svcA", "150.0")])]),
        ]);
        let mut report = report(billing.clone(), None);
        let group_by = vec![GroupDefinition::dimension("SERVICE")];
        report
            .add_report("Services", group_by.clone(), Style::Total, None)
            .await
            .unwrap();
        report
            .add_report("ServicesChange", group_by, Style::Change, None)
            .await
            .unwrap();

        let entries = report.entries();
        assert_eq!(entries[0].name(), "Services");
        assert_eq!(
            entries[0].table().table().row("svcA").unwrap(),
            [dec("100.0"), dec("150.0")]
        );
        assert!(matches!(entries[1].table(), ReportTable::Delta(_)));
        assert_eq!(
            entries[1].table().table().row("svcA").unwrap(),
            [dec("100.0"), dec("50.0")]
        );
        assert_eq!(billing.cost_queries().len(), 4);
    }

    #[tokio::test]
    async fn test_continuation_keeps_filter() {
        let billing = TestCostExplorer::new().with_cost_pages(vec![
            Page::new(vec![ungrouped("2024-01-01", "1")], Some("p2".to_string())),
            Page::new(vec![ungrouped("2024-02-01", "2")], Some("p3".to_string())),
            Page::last(vec![ungrouped("2024-03-01", "3")]),
        ]);
        let mut report = report(billing.clone(), None);
        report
            .add_report("Credits", vec![], Style::Total, Some(CreditsFilter::CreditsOnly))
            .await
            .unwrap();

        let queries = billing.cost_queries();
        assert_eq!(queries.len(), 3);
        let tokens: Vec<Option<&str>> = queries
            .iter()
            .map(|q| q.next_page_token.as_deref())
            .collect();
        assert_eq!(tokens, [None, Some("p2"), Some("p3")]);
        for query in &queries {
            assert_eq!(query.filter, CreditsFilter::CreditsOnly.expression());
            assert_eq!(query.time_period, queries[0].time_period);
        }
        let table = report.entries()[0].table().table();
        assert_eq!(table.rows(), [TOTAL_ROW]);
        assert_eq!(table.column_count(), 3);
    }

    #[tokio::test]
    async fn test_run_wide_filter_is_the_default() {
        let billing =
            TestCostExplorer::new().with_cost_pages(vec![Page::last(vec![ungrouped(
                "2024-01-01",
                "500.0",
            )])]);
        let mut report = report(billing.clone(), None);
        report
            .add_report("Total", vec![], Style::Total, None)
            .await
            .unwrap();
        let expected: Option<Expression> = CreditsFilter::Exclude.expression();
        assert_eq!(billing.cost_queries()[0].filter, expected);
        assert_eq!(
            report.entries()[0].table().table().row(TOTAL_ROW).unwrap(),
            [dec("500.0")]
        );
    }

    #[tokio::test]
    async fn test_labels_are_applied() {
        let billing = TestCostExplorer::new().with_cost_pages(vec![Page::last(vec![grouped(
            "2024-01-01",
            &[("111222333444", "10"), ("999", "5")],
        )])]);
        let labels = LabelTable::from_records(vec![AccountRecord::new([
            ("Id", "111222333444"),
            ("Email", "Prod Account"),
        ])]);
        let mut report = report(billing, Some(labels));
        report
            .add_report(
                "Accounts",
                vec![GroupDefinition::dimension("LINKED_ACCOUNT")],
                Style::Total,
                None,
            )
            .await
            .unwrap();
        assert_eq!(
            report.entries()[0].table().table().rows(),
            ["Prod Account", "999"]
        );
    }

    #[tokio::test]
    async fn test_query_failure_adds_nothing() {
        let billing = TestCostExplorer::new().with_cost_pages(vec![Page::new(
            vec![ungrouped("2024-01-01", "1")],
            Some("missing".to_string()),
        )]);
        let mut report = report(billing, None);
        let result = report.add_report("Total", vec![], Style::Total, None).await;
        assert!(result.is_err());
        assert!(report.entries().is_empty());
    }

    #[tokio::test]
    async fn test_ri_report() {
        let billing = TestCostExplorer::new().with_coverage_pages(vec![
            Page::new(
                vec![coverage("2024-01-01", Some("80.5"))],
                Some("c2".to_string()),
            ),
            Page::last(vec![coverage("2024-02-01", None)]),
        ]);
        let mut report = report(billing.clone(), None);
        report.add_ri_report("RICoverage").await.unwrap();
        let table = report.entries()[0].table().table();
        assert_eq!(table.rows(), [COVERAGE_ROW]);
        assert_eq!(table.row(COVERAGE_ROW).unwrap(), [dec("80.5"), Decimal::ZERO]);
        assert_eq!(billing.coverage_queries().len(), 2);
    }

    #[tokio::test]
    async fn test_run_plan_in_order() {
        let billing = TestCostExplorer::new()
            .with_cost_pages(vec![Page::last(vec![ungrouped("2024-01-01", "1")])])
            .with_coverage_pages(vec![Page::last(vec![coverage("2024-01-01", Some("1"))])]);
        let mut report = report(billing, None);
        let plan = default_plan(&["team".to_string()]);
        report.run_plan(&plan).await.unwrap();
        let names: Vec<&str> = report.entries().iter().map(ReportEntry::name).collect();
        let expected: Vec<&str> = plan.iter().map(PlanItem::name).collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn test_style_names() {
        assert_eq!(Style::Change.to_string(), "Change");
        assert_eq!("Total".parse::<Style>().unwrap(), Style::Total);
    }
}
