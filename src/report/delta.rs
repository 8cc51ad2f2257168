use crate::model::{CellError, DeltaTable, PivotTable, Table};
use rust_decimal::Decimal;
use tracing::error;

/// Computes the period-over-period change of every row.
///
/// The first column is copied as-is, since there is no earlier period to subtract. Every later
/// column holds `current - previous`. A cell whose lookup fails becomes zero and the transform
/// carries on; a dense `PivotTable` never produces such a cell.
pub fn compute_delta(pivot: &PivotTable) -> DeltaTable {
    let values = (0..pivot.row_count())
        .map(|row| {
            (0..pivot.column_count())
                .map(|column| settle(pivot, row, column, change(pivot, row, column)))
                .collect()
        })
        .collect();
    DeltaTable::new(Table::from_parts(
        pivot.rows().to_vec(),
        pivot.columns().to_vec(),
        values,
    ))
}

/// The change at (`row`, `column`).
fn change(table: &Table, row: usize, column: usize) -> Result<Decimal, CellError> {
    let current = table.cell(row, column)?;
    let Some(prev_column) = column.checked_sub(1) else {
        return Ok(current);
    };
    let previous = table.cell(row, prev_column)?;
    current
        .checked_sub(previous)
        .ok_or(CellError::Overflow { row, column })
}

/// Unwraps a change, substituting zero for a failed cell.
fn settle(table: &Table, row: usize, column: usize, result: Result<Decimal, CellError>) -> Decimal {
    match result {
        Ok(value) => value,
        Err(e) => {
            let label = table.rows().get(row).map(String::as_str).unwrap_or("?");
            error!("Change for '{label}' in column {column} could not be computed, using 0: {e}");
            Decimal::ZERO
        }
    }
}
