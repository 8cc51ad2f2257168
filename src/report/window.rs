use crate::model::{first_of_month, TimePeriod};
use chrono::{Months, NaiveDate};
use serde::Serialize;

/// How many whole months of cost history a report covers.
const COST_MONTHS: u32 = 12;
/// Coverage is reported for one month less, ending today.
const COVERAGE_MONTHS: u32 = 11;

/// The date ranges queried for one run.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
pub struct ReportWindow {
    cost: TimePeriod,
    coverage: TimePeriod,
}

impl ReportWindow {
    /// Computes the ranges relative to `today`. Unless `use_current_period` is set, the cost range
    /// ends at the start of the current month so that the last column is a completed month.
    pub fn new(today: NaiveDate, use_current_period: bool) -> Self {
        let this_month = first_of_month(today);
        let cost_end = if use_current_period {
            today
        } else {
            this_month
        };
        Self {
            cost: TimePeriod::new(months_before(this_month, COST_MONTHS), cost_end),
            coverage: TimePeriod::new(months_before(this_month, COVERAGE_MONTHS), today),
        }
    }

    pub fn cost(&self) -> TimePeriod {
        self.cost
    }

    pub fn coverage(&self) -> TimePeriod {
        self.coverage
    }
}

fn months_before(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_sub_months(Months::new(months))
        .unwrap_or(NaiveDate::MIN)
}
