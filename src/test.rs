//! Shared test utilities: record builders and in-memory billing and directory clients.
//!
//! This module is only compiled when running tests (`#[cfg(test)]`).

use crate::api::{CostExplorer, CostQuery, CoverageQuery, Directory, Page};
use crate::model::{AccountRecord, CoverageRecord, Group, GroupRecord, TimePeriod};
use crate::Result;
use anyhow::{anyhow, bail};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// The calendar month starting on `start`.
pub fn period(start: &str) -> TimePeriod {
    TimePeriod::month_of(date(start))
}

/// A grouped record for the month starting on `start`, e.g.
/// `grouped("2024-01-01", &[("svcA", "100.0")])`.
pub fn grouped(start: &str, groups: &[(&str, &str)]) -> GroupRecord {
    GroupRecord::grouped(
        period(start),
        groups
            .iter()
            .map(|(key, amount)| Group::new(*key, dec(amount)))
            .collect(),
    )
}

/// An ungrouped (total only) record for the month starting on `start`.
pub fn ungrouped(start: &str, total: &str) -> GroupRecord {
    GroupRecord::ungrouped(period(start), dec(total))
}

pub fn coverage(start: &str, percentage: Option<&str>) -> CoverageRecord {
    CoverageRecord {
        period: period(start),
        percentage: percentage.map(|p| dec(p).into()),
    }
}

/// Finds the page to return for `token`: the first page without a token, otherwise the page after
/// the one that carries `token`.
fn replay<T: Clone>(pages: &[Page<T>], token: Option<&str>) -> Result<Page<T>> {
    let Some(token) = token else {
        return Ok(pages.first().cloned().unwrap_or_default());
    };
    let idx = pages
        .iter()
        .position(|p| p.next_token.as_deref() == Some(token))
        .ok_or_else(|| anyhow!("no page carries the token '{token}'"))?;
    match pages.get(idx + 1) {
        Some(page) => Ok(page.clone()),
        None => bail!("no page follows the token '{token}'"),
    }
}

#[derive(Debug, Default)]
struct Script {
    cost_pages: Vec<Page<GroupRecord>>,
    coverage_pages: Vec<Page<CoverageRecord>>,
    cost_queries: Vec<CostQuery>,
    coverage_queries: Vec<CoverageQuery>,
}

/// A billing client that answers every query from one scripted chain of pages, whatever its
/// grouping, and records the queries it receives. Clones share the script.
#[derive(Debug, Default, Clone)]
pub struct TestCostExplorer {
    script: Arc<Mutex<Script>>,
}

impl TestCostExplorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cost_pages(self, pages: Vec<Page<GroupRecord>>) -> Self {
        self.script.lock().unwrap().cost_pages = pages;
        self
    }

    pub fn with_coverage_pages(self, pages: Vec<Page<CoverageRecord>>) -> Self {
        self.script.lock().unwrap().coverage_pages = pages;
        self
    }

    pub fn cost_queries(&self) -> Vec<CostQuery> {
        self.script.lock().unwrap().cost_queries.clone()
    }

    pub fn coverage_queries(&self) -> Vec<CoverageQuery> {
        self.script.lock().unwrap().coverage_queries.clone()
    }
}

#[async_trait::async_trait]
impl CostExplorer for TestCostExplorer {
    async fn get_cost_and_usage(&self, query: &CostQuery) -> Result<Page<GroupRecord>> {
        let mut script = self.script.lock().unwrap();
        script.cost_queries.push(query.clone());
        replay(&script.cost_pages, query.next_page_token.as_deref())
    }

    async fn get_reservation_coverage(
        &self,
        query: &CoverageQuery,
    ) -> Result<Page<CoverageRecord>> {
        let mut script = self.script.lock().unwrap();
        script.coverage_queries.push(query.clone());
        replay(&script.coverage_pages, query.next_page_token.as_deref())
    }
}

/// An account directory backed by a fixed chain of pages, or one that always fails.
#[derive(Debug, Clone)]
pub struct TestDirectory {
    pages: Option<Vec<Page<AccountRecord>>>,
}

impl TestDirectory {
    /// Chains `pages` with the tokens `page-1`, `page-2`, ...
    pub fn pages(pages: Vec<Vec<AccountRecord>>) -> Self {
        let count = pages.len();
        let pages = pages
            .into_iter()
            .enumerate()
            .map(|(idx, items)| {
                let next_token = (idx + 1 < count).then(|| format!("page-{}", idx + 1));
                Page::new(items, next_token)
            })
            .collect();
        Self { pages: Some(pages) }
    }

    pub fn failing() -> Self {
        Self { pages: None }
    }
}

#[async_trait::async_trait]
impl Directory for TestDirectory {
    async fn list_accounts(&self, next_token: Option<String>) -> Result<Page<AccountRecord>> {
        match &self.pages {
            Some(pages) => replay(pages, next_token.as_deref()),
            None => bail!("AccessDenied: not an organization management account"),
        }
    }
}
