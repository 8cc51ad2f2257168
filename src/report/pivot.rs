//! Folds per-period records into a dense table.
//!
//! Records arrive one period at a time, so cells are first collected period-major in a sparse
//! `Accumulator`. Only once every record has been folded is the full set of labels known; `freeze`
//! then transposes into the dimension-major `PivotTable` (one row per label, one column per
//! period) and fills every cell that was never written with zero.

use crate::model::{
    first_of_month, CoverageRecord, GroupRecord, PivotTable, Table, TOTAL_ROW,
};
use crate::report::resolve::Resolver;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::{debug, trace};

/// The single row label of a reservation coverage table.
pub const COVERAGE_ROW: &str = "Coverage%";

/// Sparse, period-major cells. Labels and periods keep first-seen order.
#[derive(Debug, Default, Clone)]
struct Accumulator {
    periods: Vec<NaiveDate>,
    period_index: HashMap<NaiveDate, usize>,
    labels: Vec<String>,
    label_index: HashMap<String, usize>,
    /// `cells[period][label]`
    cells: Vec<HashMap<usize, Decimal>>,
}

impl Accumulator {
    /// Registers the month of `period` as a column, even if no cell is ever written to it. Any
    /// date within a month maps to that month's first day.
    fn with_period(mut self, period: NaiveDate) -> (Self, usize) {
        let period = first_of_month(period);
        if let Some(&idx) = self.period_index.get(&period) {
            return (self, idx);
        }
        let idx = self.periods.len();
        self.periods.push(period);
        self.period_index.insert(period, idx);
        self.cells.push(HashMap::new());
        (self, idx)
    }

    /// Sets the cell at (`period`, `label`). A second write to the same cell replaces the first.
    fn with_cell(mut self, period: usize, label: String, value: Decimal) -> Self {
        let label_idx = match self.label_index.get(&label) {
            Some(&idx) => idx,
            None => {
                let idx = self.labels.len();
                self.label_index.insert(label.clone(), idx);
                self.labels.push(label);
                idx
            }
        };
        if let Some(previous) = self.cells[period].insert(label_idx, value) {
            debug!(
                "'{}' appears more than once in {}, replacing {previous} with {value}",
                self.labels[label_idx], self.periods[period]
            );
        }
        self
    }

    fn with_record(self, record: &GroupRecord, resolver: &Resolver<'_>) -> Self {
        let (mut acc, period) = self.with_period(record.period.start());
        if record.groups.is_empty() {
            if let Some(total) = record.total {
                acc = acc.with_cell(period, TOTAL_ROW.to_string(), total.value());
            } else {
                trace!("No amounts for {}", record.period);
            }
        }
        for group in &record.groups {
            acc = acc.with_cell(period, resolver.resolve(&group.key), group.amount.value());
        }
        acc
    }

    /// Transposes into a dense dimension-major table, filling absent cells with zero.
    fn freeze(self) -> PivotTable {
        let values = (0..self.labels.len())
            .map(|label| {
                self.cells
                    .iter()
                    .map(|period| period.get(&label).copied().unwrap_or(Decimal::ZERO))
                    .collect()
            })
            .collect();
        PivotTable::new(Table::from_parts(self.labels, self.periods, values))
    }
}

/// Builds a dense pivot table from grouped records. Rows are resolved labels in first-seen order
/// (or the single row `Total` for ungrouped records), columns are period starts in the order the
/// records were given.
pub fn build_pivot(records: &[GroupRecord], resolver: &Resolver<'_>) -> PivotTable {
    let pivot = records
        .iter()
        .fold(Accumulator::default(), |acc, record| {
            acc.with_record(record, resolver)
        })
        .freeze();
    debug!(
        "Built a pivot of {} rows by {} periods",
        pivot.row_count(),
        pivot.column_count()
    );
    pivot
}

/// Builds the single-row coverage table. Periods without a reported percentage are zero.
pub fn build_coverage(records: &[CoverageRecord]) -> PivotTable {
    records
        .iter()
        .fold(Accumulator::default(), |acc, record| {
            let (acc, period) = acc.with_period(record.period.start());
            let value = record.percentage.map(|p| p.value()).unwrap_or_default();
            acc.with_cell(period, COVERAGE_ROW.to_string(), value)
        })
        .freeze()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AccountRecord, Group, LabelTable, TimePeriod};
    use crate::test::{coverage, date, dec, grouped, ungrouped};

    fn pivot(records: &[GroupRecord]) -> PivotTable {
        let labels = LabelTable::new();
        build_pivot(records, &Resolver::new(&labels, "Email"))
    }

    #[test]
    fn test_two_periods_one_key() {
        let table = pivot(&[
            grouped("2024-01-01", &[("svcA", "100.0")]),
            grouped("2024-02-01", &[("svcA", "150.0")]),
        ]);
        assert_eq!(table.rows(), ["svcA"]);
        assert_eq!(table.columns(), [date("2024-01-01"), date("2024-02-01")]);
        assert_eq!(table.row("svcA").unwrap(), [dec("100.0"), dec("150.0")]);
    }

    #[test]
    fn test_missing_cells_are_zero() {
        let table = pivot(&[
            grouped("2024-01-01", &[("svcA", "100.0")]),
            grouped("2024-02-01", &[("svcB", "20.0")]),
        ]);
        assert_eq!(table.rows(), ["svcA", "svcB"]);
        assert_eq!(table.row("svcA").unwrap(), [dec("100.0"), Decimal::ZERO]);
        assert_eq!(table.row("svcB").unwrap(), [Decimal::ZERO, dec("20.0")]);
    }

    #[test]
    fn test_every_cell_exists() {
        let table = pivot(&[
            grouped("2024-01-01", &[("a", "1"), ("b", "2")]),
            grouped("2024-02-01", &[("c", "3")]),
            grouped("2024-03-01", &[]),
            grouped("2024-04-01", &[("b", "4"), ("d", "5")]),
        ]);
        assert_eq!(table.row_count(), 4);
        assert_eq!(table.column_count(), 4);
        for row in 0..table.row_count() {
            for column in 0..table.column_count() {
                assert!(table.cell(row, column).is_ok(), "({row}, {column})");
            }
        }
        assert_eq!(table.column_total(2), Decimal::ZERO);
    }

    #[test]
    fn test_rows_in_first_seen_order() {
        let table = pivot(&[
            grouped("2024-01-01", &[("zeta", "1"), ("alpha", "2")]),
            grouped("2024-02-01", &[("mid", "3"), ("zeta", "4")]),
        ]);
        assert_eq!(table.rows(), ["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_columns_keep_source_order() {
        let table = pivot(&[
            grouped("2024-02-01", &[("a", "1")]),
            grouped("2024-01-01", &[("a", "2")]),
        ]);
        assert_eq!(table.columns(), [date("2024-02-01"), date("2024-01-01")]);
    }

    #[test]
    fn test_labels_are_resolved() {
        let labels = LabelTable::from_records(vec![AccountRecord::new([
            ("Id", "111222333444"),
            ("Email", "Prod Account"),
        ])]);
        let resolver = Resolver::new(&labels, "Email");
        let table = build_pivot(
            &[grouped(
                "2024-01-01",
                &[("111222333444", "10"), ("999", "5")],
            )],
            &resolver,
        );
        assert_eq!(table.rows(), ["Prod Account", "999"]);
    }

    #[test]
    fn test_ungrouped_is_a_total_row() {
        let table = pivot(&[ungrouped("2024-01-01", "500.0")]);
        assert_eq!(table.rows(), [TOTAL_ROW]);
        assert_eq!(table.row(TOTAL_ROW).unwrap(), [dec("500.0")]);
    }

    #[test]
    fn test_later_duplicate_replaces_earlier() {
        let table = pivot(&[grouped("2024-01-01", &[("a", "1"), ("a", "7")])]);
        assert_eq!(table.row("a").unwrap(), [dec("7")]);
    }

    #[test]
    fn test_repeated_period_shares_a_column() {
        let table = pivot(&[
            grouped("2024-01-01", &[("a", "1")]),
            grouped("2024-01-01", &[("b", "2")]),
        ]);
        assert_eq!(table.column_count(), 1);
        assert_eq!(table.row("b").unwrap(), [dec("2")]);
    }

    #[test]
    fn test_mid_month_start_joins_its_month() {
        let mid_month = GroupRecord::grouped(
            TimePeriod::new(date("2024-01-15"), date("2024-02-01")),
            vec![Group::new("b", dec("2"))],
        );
        let table = pivot(&[grouped("2024-01-01", &[("a", "1")]), mid_month]);
        assert_eq!(table.columns(), [date("2024-01-01")]);
        assert_eq!(table.row("b").unwrap(), [dec("2")]);
    }

    #[test]
    fn test_no_records() {
        let table = pivot(&[]);
        assert!(table.is_empty());
    }

    #[test]
    fn test_coverage() {
        let table = build_coverage(&[
            coverage("2024-01-01", Some("80.5")),
            coverage("2024-02-01", None),
        ]);
        assert_eq!(table.rows(), [COVERAGE_ROW]);
        assert_eq!(table.row(COVERAGE_ROW).unwrap(), [dec("80.5"), Decimal::ZERO]);
    }
}
