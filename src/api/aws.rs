//! Implements `CostExplorer` and `Directory` with the AWS SDK.
//!
//! Credentials come from the default `aws-config` provider chain. SDK output is converted into the
//! same wire structs the fixture client reads, so both sources decode identically.

use crate::api::wire::{
    CostAndUsageResponse, Coverage, CoverageByTime, CoverageHours, MetricValue,
    ReservationCoverageResponse, ResultByTime, ResultGroup,
};
use crate::api::{CostExplorer, CostQuery, CoverageQuery, Directory, Expression, Page};
use crate::model::{AccountRecord, CoverageRecord, GroupRecord, TimePeriod};
use crate::Result;
use anyhow::Context;
use aws_sdk_costexplorer::types as ce;
use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::trace;

/// The billing API is only served from this region.
const BILLING_REGION: &str = "us-east-1";

/// Talks to the billing and organization services. Cheap to clone.
#[derive(Debug, Clone)]
pub struct AwsClient {
    billing: aws_sdk_costexplorer::Client,
    organizations: aws_sdk_organizations::Client,
}

impl AwsClient {
    /// Loads credentials from the environment.
    pub async fn from_env() -> Self {
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(BILLING_REGION))
            .load()
            .await;
        Self {
            billing: aws_sdk_costexplorer::Client::new(&config),
            organizations: aws_sdk_organizations::Client::new(&config),
        }
    }
}

#[async_trait::async_trait]
impl CostExplorer for AwsClient {
    async fn get_cost_and_usage(&self, query: &CostQuery) -> Result<Page<GroupRecord>> {
        trace!("GetCostAndUsage {}", serde_json::to_string(query)?);
        let group_by = query
            .group_by
            .iter()
            .map(|g| {
                ce::GroupDefinition::builder()
                    .r#type(ce::GroupDefinitionType::from(g.group_type.to_string().as_str()))
                    .key(&g.key)
                    .build()
            })
            .collect::<Vec<_>>();
        let output = self
            .billing
            .get_cost_and_usage()
            .time_period(date_interval(&query.time_period)?)
            .granularity(ce::Granularity::from(query.granularity.to_string().as_str()))
            .set_metrics(Some(query.metrics.clone()))
            .set_group_by(Some(group_by))
            .set_filter(query.filter.as_ref().map(expression))
            .set_next_page_token(query.next_page_token.clone())
            .send()
            .await
            .context("GetCostAndUsage failed")?;

        let results_by_time = output
            .results_by_time()
            .iter()
            .map(|r| -> Result<ResultByTime> {
                Ok(ResultByTime {
                    time_period: time_period(r.time_period())?,
                    total: metrics(r.total()),
                    groups: r
                        .groups()
                        .iter()
                        .map(|g| ResultGroup {
                            keys: g.keys().to_vec(),
                            metrics: metrics(g.metrics()),
                        })
                        .collect(),
                    estimated: r.estimated(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        CostAndUsageResponse {
            results_by_time,
            next_page_token: output.next_page_token().map(str::to_string),
        }
        .into_page(query.metric())
    }

    async fn get_reservation_coverage(
        &self,
        query: &CoverageQuery,
    ) -> Result<Page<CoverageRecord>> {
        trace!("GetReservationCoverage {}", serde_json::to_string(query)?);
        let output = self
            .billing
            .get_reservation_coverage()
            .time_period(date_interval(&query.time_period)?)
            .granularity(ce::Granularity::from(query.granularity.to_string().as_str()))
            .set_next_page_token(query.next_page_token.clone())
            .send()
            .await
            .context("GetReservationCoverage failed")?;

        let coverages_by_time = output
            .coverages_by_time()
            .iter()
            .map(|c| -> Result<CoverageByTime> {
                Ok(CoverageByTime {
                    time_period: time_period(c.time_period())?,
                    total: c.total().map(|t| Coverage {
                        coverage_hours: t.coverage_hours().map(|h| CoverageHours {
                            coverage_hours_percentage: h
                                .coverage_hours_percentage()
                                .map(str::to_string),
                        }),
                    }),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        ReservationCoverageResponse {
            coverages_by_time,
            next_page_token: output.next_page_token().map(str::to_string),
        }
        .into_page()
    }
}

#[async_trait::async_trait]
impl Directory for AwsClient {
    async fn list_accounts(&self, next_token: Option<String>) -> Result<Page<AccountRecord>> {
        trace!("ListAccounts");
        let output = self
            .organizations
            .list_accounts()
            .set_next_token(next_token)
            .send()
            .await
            .context("ListAccounts failed")?;

        let accounts = output
            .accounts()
            .iter()
            .map(|a| {
                let fields = [
                    ("Id", a.id()),
                    ("Arn", a.arn()),
                    ("Email", a.email()),
                    ("Name", a.name()),
                    ("Status", a.status().map(|s| s.as_str())),
                ];
                AccountRecord::new(
                    fields
                        .into_iter()
                        .filter_map(|(field, value)| value.map(|v| (field, v))),
                )
            })
            .collect();
        Ok(Page::new(
            accounts,
            output.next_token().map(str::to_string),
        ))
    }
}

fn date_interval(period: &TimePeriod) -> Result<ce::DateInterval> {
    ce::DateInterval::builder()
        .start(period.start.to_string())
        .end(period.end.to_string())
        .build()
        .context("Unable to build the query time period")
}

fn time_period(interval: Option<&ce::DateInterval>) -> Result<TimePeriod> {
    let interval = interval.context("The billing API returned a result without a time period")?;
    let parse = |s: &str| {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("The billing API returned an unreadable date '{s}'"))
    };
    Ok(TimePeriod::new(
        parse(interval.start())?,
        parse(interval.end())?,
    ))
}

fn metrics(values: Option<&HashMap<String, ce::MetricValue>>) -> HashMap<String, MetricValue> {
    values
        .into_iter()
        .flatten()
        .map(|(name, value)| {
            (
                name.clone(),
                MetricValue {
                    amount: value.amount().map(str::to_string),
                    unit: value.unit().map(str::to_string),
                },
            )
        })
        .collect()
}

fn expression(expr: &Expression) -> ce::Expression {
    let mut builder = ce::Expression::builder();
    if let Some(not) = &expr.not {
        builder = builder.not(expression(not));
    }
    if let Some(dimensions) = &expr.dimensions {
        builder = builder.dimensions(
            ce::DimensionValues::builder()
                .key(ce::Dimension::from(dimensions.key.as_str()))
                .set_values(Some(dimensions.values.clone()))
                .build(),
        );
    }
    builder.build()
}
