//! Response shapes of the billing and account-directory APIs, and their conversion into the core
//! model. The fixture client deserializes these directly; the SDK client builds them from SDK
//! output so that both decode identically.

use crate::api::Page;
use crate::model::{AccountRecord, Amount, CoverageRecord, Group, GroupRecord, TimePeriod};
use crate::Result;
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct MetricValue {
    #[serde(default)]
    pub(crate) amount: Option<String>,
    #[serde(default)]
    pub(crate) unit: Option<String>,
}

impl MetricValue {
    fn parse(&self) -> Result<Option<Amount>> {
        self.amount
            .as_deref()
            .map(Amount::from_str)
            .transpose()
            .context("The billing API returned an unreadable amount")
    }
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ResultGroup {
    #[serde(default)]
    pub(crate) keys: Vec<String>,
    #[serde(default)]
    pub(crate) metrics: HashMap<String, MetricValue>,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ResultByTime {
    pub(crate) time_period: TimePeriod,
    #[serde(default)]
    pub(crate) total: HashMap<String, MetricValue>,
    #[serde(default)]
    pub(crate) groups: Vec<ResultGroup>,
    #[serde(default)]
    pub(crate) estimated: bool,
}

impl ResultByTime {
    /// Reads `metric` out of every group (or out of the total, for an ungrouped result).
    pub(crate) fn into_record(self, metric: &str) -> Result<GroupRecord> {
        let period = self.time_period;
        if self.estimated {
            debug!("The amounts for {period} are estimates");
        }
        if self.groups.is_empty() {
            let total = match self.total.get(metric) {
                Some(value) => value.parse()?,
                None => None,
            };
            return Ok(GroupRecord {
                period,
                groups: Vec::new(),
                total,
            });
        }

        let mut groups = Vec::with_capacity(self.groups.len());
        for group in self.groups {
            let Some(key) = group.keys.into_iter().next() else {
                bail!("A group in period {period} has no keys");
            };
            let amount = group
                .metrics
                .get(metric)
                .with_context(|| format!("Group '{key}' in period {period} is missing {metric}"))?
                .parse()?
                .unwrap_or_default();
            groups.push(Group::new(key, amount));
        }
        Ok(GroupRecord::grouped(period, groups))
    }
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct CostAndUsageResponse {
    #[serde(default)]
    pub(crate) results_by_time: Vec<ResultByTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) next_page_token: Option<String>,
}

impl CostAndUsageResponse {
    pub(crate) fn into_page(self, metric: &str) -> Result<Page<GroupRecord>> {
        let items = self
            .results_by_time
            .into_iter()
            .map(|r| r.into_record(metric))
            .collect::<Result<Vec<_>>>()?;
        Ok(Page::new(items, self.next_page_token))
    }
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct CoverageHours {
    #[serde(default)]
    pub(crate) coverage_hours_percentage: Option<String>,
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct Coverage {
    #[serde(default)]
    pub(crate) coverage_hours: Option<CoverageHours>,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct CoverageByTime {
    pub(crate) time_period: TimePeriod,
    #[serde(default)]
    pub(crate) total: Option<Coverage>,
}

impl CoverageByTime {
    pub(crate) fn into_record(self) -> Result<CoverageRecord> {
        let percentage = self
            .total
            .and_then(|t| t.coverage_hours)
            .and_then(|h| h.coverage_hours_percentage)
            .map(|p| Amount::from_str(&p))
            .transpose()
            .context("The billing API returned an unreadable coverage percentage")?;
        Ok(CoverageRecord {
            period: self.time_period,
            percentage,
        })
    }
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ReservationCoverageResponse {
    #[serde(default)]
    pub(crate) coverages_by_time: Vec<CoverageByTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) next_page_token: Option<String>,
}

impl ReservationCoverageResponse {
    pub(crate) fn into_page(self) -> Result<Page<CoverageRecord>> {
        let items = self
            .coverages_by_time
            .into_iter()
            .map(CoverageByTime::into_record)
            .collect::<Result<Vec<_>>>()?;
        Ok(Page::new(items, self.next_page_token))
    }
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ListAccountsResponse {
    #[serde(default)]
    pub(crate) accounts: Vec<AccountRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) next_token: Option<String>,
}

impl ListAccountsResponse {
    pub(crate) fn into_page(self) -> Page<AccountRecord> {
        Page::new(self.accounts, self.next_token)
    }
}
