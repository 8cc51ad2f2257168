use crate::model::{Amount, TimePeriod};

/// One (dimension key, amount) pair inside a `GroupRecord`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Group {
    pub key: String,
    pub amount: Amount,
}

impl Group {
    pub fn new(key: impl Into<String>, amount: impl Into<Amount>) -> Self {
        Self {
            key: key.into(),
            amount: amount.into(),
        }
    }
}

/// Everything the billing API returned for a single period.
///
/// A grouped query fills `groups`; an ungrouped query leaves `groups` empty and reports a single
/// `total`. A grouped query for a period with no spend has neither.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct GroupRecord {
    pub period: TimePeriod,
    pub groups: Vec<Group>,
    pub total: Option<Amount>,
}

impl GroupRecord {
    pub fn grouped(period: TimePeriod, groups: Vec<Group>) -> Self {
        Self {
            period,
            groups,
            total: None,
        }
    }

    pub fn ungrouped(period: TimePeriod, total: impl Into<Amount>) -> Self {
        Self {
            period,
            groups: Vec::new(),
            total: Some(total.into()),
        }
    }
}

/// Reservation coverage for a single period. The billing API omits the percentage for periods
/// with no eligible usage.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CoverageRecord {
    pub period: TimePeriod,
    pub percentage: Option<Amount>,
}
