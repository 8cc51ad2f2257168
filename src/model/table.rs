//! Dense report tables: one row per dimension label, one column per period start.

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt::{Display, Formatter};
use std::ops::Deref;

/// The row label used for ungrouped totals.
pub const TOTAL_ROW: &str = "Total";

/// The failure of a single cell lookup.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum CellError {
    MissingRow { row: usize },
    MissingColumn { row: usize, column: usize },
    Overflow { row: usize, column: usize },
}

impl Display for CellError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CellError::MissingRow { row } => write!(f, "row {row} does not exist"),
            CellError::MissingColumn { row, column } => {
                write!(f, "row {row} has no cell in column {column}")
            }
            CellError::Overflow { row, column } => {
                write!(f, "the value at row {row}, column {column} is out of range")
            }
        }
    }
}

impl StdError for CellError {}

/// A dense, dimension-major matrix. Every `(row, column)` pair has a value; rows are unique and
/// kept in insertion order, columns are unique and kept in the order they were produced.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct Table {
    rows: Vec<String>,
    row_index: HashMap<String, usize>,
    columns: Vec<NaiveDate>,
    values: Vec<Vec<Decimal>>,
}

impl Table {
    /// Assembles a table from already-dense parts. `values[r]` must hold one value per column.
    pub(crate) fn from_parts(
        rows: Vec<String>,
        columns: Vec<NaiveDate>,
        values: Vec<Vec<Decimal>>,
    ) -> Self {
        debug_assert_eq!(rows.len(), values.len());
        debug_assert!(values.iter().all(|r| r.len() == columns.len()));
        let row_index = rows
            .iter()
            .enumerate()
            .map(|(idx, label)| (label.clone(), idx))
            .collect();
        Self {
            rows,
            row_index,
            columns,
            values,
        }
    }

    pub fn rows(&self) -> &[String] {
        &self.rows
    }

    pub fn columns(&self) -> &[NaiveDate] {
        &self.columns
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.columns.is_empty()
    }

    /// Looks up a cell by position.
    pub fn cell(&self, row: usize, column: usize) -> Result<Decimal, CellError> {
        self.values
            .get(row)
            .ok_or(CellError::MissingRow { row })?
            .get(column)
            .copied()
            .ok_or(CellError::MissingColumn { row, column })
    }

    /// Looks up a cell by row label and period start.
    pub fn get(&self, label: &str, period: NaiveDate) -> Option<Decimal> {
        let row = *self.row_index.get(label)?;
        let column = self.columns.iter().position(|c| *c == period)?;
        self.cell(row, column).ok()
    }

    /// The values of the row labelled `label`, in column order.
    pub fn row(&self, label: &str) -> Option<&[Decimal]> {
        let idx = *self.row_index.get(label)?;
        self.values.get(idx).map(Vec::as_slice)
    }

    /// Iterates `(label, values)` in row order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Decimal])> {
        self.rows
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(Vec::as_slice))
    }

    /// Sum of a column across all rows.
    pub fn column_total(&self, column: usize) -> Decimal {
        self.values
            .iter()
            .filter_map(|r| r.get(column))
            .copied()
            .sum()
    }
}

/// Serializes as `{label: {period_start: number}}`, preserving row and column order.
impl Serialize for Table {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.rows.len()))?;
        for (label, values) in self.iter() {
            map.serialize_entry(
                label,
                &RowCells {
                    columns: &self.columns,
                    values,
                },
            )?;
        }
        map.end()
    }
}

struct RowCells<'a> {
    columns: &'a [NaiveDate],
    values: &'a [Decimal],
}

impl Serialize for RowCells<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (column, value) in self.columns.iter().zip(self.values) {
            map.serialize_entry(&column.to_string(), &value.to_f64().unwrap_or_default())?;
        }
        map.end()
    }
}

/// A table of absolute amounts per period.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PivotTable(Table);

impl PivotTable {
    pub(crate) fn new(table: Table) -> Self {
        Self(table)
    }
}

impl Deref for PivotTable {
    type Target = Table;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// A table of period-over-period changes, shaped exactly like the `PivotTable` it came from.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DeltaTable(Table);

impl DeltaTable {
    pub(crate) fn new(table: Table) -> Self {
        Self(table)
    }
}

impl Deref for DeltaTable {
    type Target = Table;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Either kind of table, as held by a report entry.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReportTable {
    Pivot(PivotTable),
    Delta(DeltaTable),
}

impl ReportTable {
    pub fn table(&self) -> &Table {
        match self {
            ReportTable::Pivot(t) => &t.0,
            ReportTable::Delta(t) => &t.0,
        }
    }
}

impl From<PivotTable> for ReportTable {
    fn from(value: PivotTable) -> Self {
        ReportTable::Pivot(value)
    }
}

impl From<DeltaTable> for ReportTable {
    fn from(value: DeltaTable) -> Self {
        ReportTable::Delta(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn sample() -> Table {
        Table::from_parts(
            vec!["svcB".into(), "svcA".into()],
            vec![date("2024-01-01"), date("2024-02-01")],
            vec![vec![dec("1"), dec("2")], vec![dec("10"), dec("20.5")]],
        )
    }

    #[test]
    fn test_lookups() {
        let t = sample();
        assert_eq!(t.cell(1, 1), Ok(dec("20.5")));
        assert_eq!(t.get("svcB", date("2024-02-01")), Some(dec("2")));
        assert_eq!(t.get("svcC", date("2024-02-01")), None);
        assert_eq!(t.row("svcA"), Some(&[dec("10"), dec("20.5")][..]));
        assert_eq!(t.column_total(0), dec("11"));
    }

    #[test]
    fn test_cell_errors() {
        let t = sample();
        assert_eq!(t.cell(5, 0), Err(CellError::MissingRow { row: 5 }));
        assert_eq!(
            t.cell(0, 9),
            Err(CellError::MissingColumn { row: 0, column: 9 })
        );
    }

    #[test]
    fn test_serialize_preserves_order() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert_eq!(
            json,
            r#"{"svcB":{"2024-01-01":1.0,"2024-02-01":2.0},"svcA":{"2024-01-01":10.0,"2024-02-01":20.5}}"#
        );
    }
}
