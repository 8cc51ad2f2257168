//! Seams to the billing API and the account directory.
//!
//! The report pipeline only talks to the `CostExplorer` and `Directory` traits. `FixtureClient`
//! replays recorded responses from a JSON file and is always compiled, so the whole program can be
//! run top-to-bottom without network access. With the `aws` feature, `AwsClient` talks to the real
//! services.

#[cfg(feature = "aws")]
mod aws;
mod fixture;
mod query;
mod wire;

use crate::model::{AccountRecord, CoverageRecord, GroupRecord};
use crate::Result;
use std::path::PathBuf;

#[cfg(feature = "aws")]
pub use aws::AwsClient;
pub use fixture::{FixtureClient, FixtureData};
pub use query::{
    CostQuery, CoverageQuery, CreditsFilter, DimensionValues, Expression, Granularity,
    GroupDefinition, GroupType,
};

/// One page of a cursor-paginated response.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_token: Option<String>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next_token: Option<String>) -> Self {
        Self { items, next_token }
    }

    /// A page with no continuation.
    pub fn last(items: Vec<T>) -> Self {
        Self::new(items, None)
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self::new(Vec::new(), None)
    }
}

/// The billing API.
#[async_trait::async_trait]
pub trait CostExplorer: Send + Sync {
    /// Runs a cost-and-usage query and returns one page of per-period records.
    async fn get_cost_and_usage(&self, query: &CostQuery) -> Result<Page<GroupRecord>>;

    /// Runs a reservation coverage query and returns one page of per-period coverage.
    async fn get_reservation_coverage(&self, query: &CoverageQuery)
        -> Result<Page<CoverageRecord>>;
}

/// The account directory used to give account IDs friendly names.
#[async_trait::async_trait]
pub trait Directory: Send + Sync {
    async fn list_accounts(&self, next_token: Option<String>) -> Result<Page<AccountRecord>>;
}

/// Where billing data comes from.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Source {
    /// Recorded responses in a JSON file.
    Fixture(PathBuf),
    /// The live billing and organization services.
    Aws,
}

/// The pair of clients a run needs.
pub struct Clients {
    pub billing: Box<dyn CostExplorer>,
    pub directory: Box<dyn Directory>,
}

/// Constructs the clients for `source`.
pub async fn clients(source: &Source) -> Result<Clients> {
    match source {
        Source::Fixture(path) => {
            let client = FixtureClient::load(path).await?;
            Ok(Clients {
                billing: Box::new(client.clone()),
                directory: Box::new(client),
            })
        }
        #[cfg(feature = "aws")]
        Source::Aws => {
            let client = AwsClient::from_env().await;
            Ok(Clients {
                billing: Box::new(client.clone()),
                directory: Box::new(client),
            })
        }
        #[cfg(not(feature = "aws"))]
        Source::Aws => anyhow::bail!(
            "This build of cost-report has no AWS support. Rebuild with `--features aws` or \
            pass --fixture to replay recorded responses"
        ),
    }
}
