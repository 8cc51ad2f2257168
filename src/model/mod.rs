//! Types that represent the core data model: billing periods, grouped records, the account label
//! table and the dense report tables.
mod amount;
mod label;
mod period;
mod record;
mod table;

pub use amount::{Amount, AmountError};
pub use label::{AccountRecord, LabelTable, ACCOUNT_ID_FIELD, DEFAULT_LABEL_FIELD};
pub use period::{first_of_month, TimePeriod};
pub use record::{CoverageRecord, Group, GroupRecord};
pub use table::{CellError, DeltaTable, PivotTable, ReportTable, Table, TOTAL_ROW};
