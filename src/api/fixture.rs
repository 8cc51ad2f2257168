//! Implements `CostExplorer` and `Directory` by replaying recorded API responses.
//!
//! A fixture file looks like this:
//!
//! ```json
//! {
//!   "accounts": [ { "Accounts": [ {"Id": "111222333444", "Email": "prod@example.com"} ] } ],
//!   "cost_and_usage": {
//!     "": [ { "ResultsByTime": [ ... ] } ],
//!     "DIMENSION:SERVICE": [ { "ResultsByTime": [ ... ], "NextPageToken": "p2" }, { ... } ]
//!   },
//!   "reservation_coverage": [ { "CoveragesByTime": [ ... ] } ]
//! }
//! ```
//!
//! `cost_and_usage` is keyed by the grouping signature of the query (empty for ungrouped queries),
//! optionally followed by `#` and the credits filter, e.g. `#credits_only` or
//! `DIMENSION:SERVICE#include`. A key with the credits filter wins over the bare signature. Queries
//! for credits or upfront fees only never fall back to the bare signature: without their own
//! recording they replay as empty. Each value is the chain of pages the API returned, linked by
//! their page tokens.

use crate::api::wire::{CostAndUsageResponse, ListAccountsResponse, ReservationCoverageResponse};
use crate::api::{CostExplorer, CostQuery, CoverageQuery, CreditsFilter, Directory, Page};
use crate::model::{AccountRecord, CoverageRecord, GroupRecord};
use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::trace;

/// The contents of a fixture file.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct FixtureData {
    #[serde(default)]
    accounts: Vec<ListAccountsResponse>,
    #[serde(default)]
    cost_and_usage: HashMap<String, Vec<CostAndUsageResponse>>,
    #[serde(default)]
    reservation_coverage: Vec<ReservationCoverageResponse>,
}

/// Replays a `FixtureData`. Cheap to clone.
#[derive(Debug, Clone)]
pub struct FixtureClient {
    data: Arc<FixtureData>,
}

impl FixtureClient {
    pub fn new(data: FixtureData) -> Self {
        Self {
            data: Arc::new(data),
        }
    }

    /// Loads a fixture file.
    pub async fn load(path: &Path) -> Result<Self> {
        let data: FixtureData = utils::deserialize(path)
            .await
            .context("Unable to load the billing fixture")?;
        Ok(Self::new(data))
    }

    /// The recorded pages for `query`. `Ok(None)` means the query has no recording and replays
    /// as empty.
    fn cost_pages(&self, query: &CostQuery) -> Result<Option<&[CostAndUsageResponse]>> {
        let recorded = &self.data.cost_and_usage;
        let signature = query.signature();
        let credits = query.credits_filter();
        if let Some(credits) = credits {
            if let Some(pages) = recorded.get(&format!("{signature}#{credits}")) {
                return Ok(Some(pages));
            }
        }
        match credits {
            Some(credits @ (CreditsFilter::CreditsOnly | CreditsFilter::UpfrontOnly)) => {
                trace!("No recorded '{signature}#{credits}', replaying nothing");
                Ok(None)
            }
            _ => recorded
                .get(&signature)
                .map(|pages| Some(pages.as_slice()))
                .with_context(|| {
                    format!("No recorded cost and usage for grouping '{signature}'")
                }),
        }
    }
}

/// Picks the page that follows the page carrying `token`, or the first page when there is no
/// token. `next_token` extracts a page's continuation token.
fn select<'a, R>(
    pages: &'a [R],
    token: Option<&str>,
    next_token: impl Fn(&R) -> Option<&str>,
) -> Result<Option<&'a R>> {
    let Some(token) = token else {
        return Ok(pages.first());
    };
    let Some(idx) = pages.iter().position(|p| next_token(p) == Some(token)) else {
        bail!("No recorded page carries the page token '{token}'");
    };
    match pages.get(idx + 1) {
        Some(page) => Ok(Some(page)),
        None => bail!("The recorded page after token '{token}' is missing"),
    }
}

#[async_trait::async_trait]
impl CostExplorer for FixtureClient {
    async fn get_cost_and_usage(&self, query: &CostQuery) -> Result<Page<GroupRecord>> {
        trace!("fixture get_cost_and_usage for '{}'", query.signature());
        let Some(pages) = self.cost_pages(query)? else {
            return Ok(Page::default());
        };
        let page = select(pages, query.next_page_token.as_deref(), |p| {
            p.next_page_token.as_deref()
        })?;
        match page {
            Some(page) => page.clone().into_page(query.metric()),
            None => Ok(Page::default()),
        }
    }

    async fn get_reservation_coverage(
        &self,
        query: &CoverageQuery,
    ) -> Result<Page<CoverageRecord>> {
        trace!("fixture get_reservation_coverage");
        let page = select(
            &self.data.reservation_coverage,
            query.next_page_token.as_deref(),
            |p| p.next_page_token.as_deref(),
        )?;
        match page {
            Some(page) => page.clone().into_page(),
            None => Ok(Page::default()),
        }
    }
}

#[async_trait::async_trait]
impl Directory for FixtureClient {
    async fn list_accounts(&self, next_token: Option<String>) -> Result<Page<AccountRecord>> {
        trace!("fixture list_accounts");
        let page = select(&self.data.accounts, next_token.as_deref(), |p| {
            p.next_token.as_deref()
        })?;
        Ok(page.cloned().map(ListAccountsResponse::into_page).unwrap_or_default())
    }
}
