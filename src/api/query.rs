//! Request shapes for the billing API. Field names serialize the way the billing API spells them
//! so that a logged query can be replayed by hand.

use crate::model::TimePeriod;
use serde::{Deserialize, Serialize};

/// The record-type dimension that separates usage from credits, refunds and upfront fees.
const RECORD_TYPE: &str = "RECORD_TYPE";
const CREDIT: &str = "Credit";
const REFUND: &str = "Refund";
const UPFRONT: &str = "Upfront";

#[derive(Debug, Clone, Copy, Eq, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Granularity {
    Daily,
    #[default]
    Monthly,
}

serde_plain::derive_display_from_serialize!(Granularity);
serde_plain::derive_fromstr_from_deserialize!(Granularity);

#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GroupType {
    Dimension,
    Tag,
    CostCategory,
}

serde_plain::derive_display_from_serialize!(GroupType);
serde_plain::derive_fromstr_from_deserialize!(GroupType);

/// A grouping axis, e.g. `{"Type": "DIMENSION", "Key": "SERVICE"}`.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GroupDefinition {
    #[serde(rename = "Type")]
    pub group_type: GroupType,
    pub key: String,
}

impl GroupDefinition {
    pub fn dimension(key: impl Into<String>) -> Self {
        Self {
            group_type: GroupType::Dimension,
            key: key.into(),
        }
    }

    pub fn tag(key: impl Into<String>) -> Self {
        Self {
            group_type: GroupType::Tag,
            key: key.into(),
        }
    }

    /// e.g. `DIMENSION:SERVICE`
    pub fn signature(&self) -> String {
        format!("{}:{}", self.group_type, self.key)
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DimensionValues {
    pub key: String,
    pub values: Vec<String>,
}

/// A (small) subset of the billing API's filter expression language.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Expression {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not: Option<Box<Expression>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<DimensionValues>,
}

impl Expression {
    pub fn dimension<S, I>(key: impl Into<String>, values: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = S>,
    {
        Self {
            not: None,
            dimensions: Some(DimensionValues {
                key: key.into(),
                values: values.into_iter().map(Into::into).collect(),
            }),
        }
    }

    pub fn negate(self) -> Self {
        Self {
            not: Some(Box::new(self)),
            dimensions: None,
        }
    }
}

/// Controls which billing record types are counted in a cost report.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    serde::Serialize,
    serde::Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum CreditsFilter {
    /// Count everything, including credits, refunds and upfront reservation fees.
    Include,
    /// Count usage only: credits, refunds and upfront fees are filtered out.
    #[default]
    Exclude,
    /// Count credits and refunds only.
    CreditsOnly,
    /// Count upfront reservation fees only.
    UpfrontOnly,
}

serde_plain::derive_display_from_serialize!(CreditsFilter);
serde_plain::derive_fromstr_from_deserialize!(CreditsFilter);

impl CreditsFilter {
    pub const ALL: [CreditsFilter; 4] = [
        CreditsFilter::Include,
        CreditsFilter::Exclude,
        CreditsFilter::CreditsOnly,
        CreditsFilter::UpfrontOnly,
    ];

    /// The filter expression to send with the query, if any.
    pub fn expression(&self) -> Option<Expression> {
        match self {
            CreditsFilter::Include => None,
            CreditsFilter::Exclude => {
                Some(Expression::dimension(RECORD_TYPE, [CREDIT, REFUND, UPFRONT]).negate())
            }
            CreditsFilter::CreditsOnly => Some(Expression::dimension(RECORD_TYPE, [CREDIT, REFUND])),
            CreditsFilter::UpfrontOnly => Some(Expression::dimension(RECORD_TYPE, [UPFRONT])),
        }
    }
}

/// A cost-and-usage query. Continuation requests are the same query with `next_page_token` set.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CostQuery {
    pub time_period: TimePeriod,
    pub granularity: Granularity,
    pub metrics: Vec<String>,
    pub group_by: Vec<GroupDefinition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Expression>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

impl CostQuery {
    pub fn new(time_period: TimePeriod, metric: impl Into<String>) -> Self {
        Self {
            time_period,
            granularity: Granularity::Monthly,
            metrics: vec![metric.into()],
            group_by: Vec::new(),
            filter: None,
            next_page_token: None,
        }
    }

    pub fn group_by(mut self, group_by: Vec<GroupDefinition>) -> Self {
        self.group_by = group_by;
        self
    }

    pub fn filter(mut self, filter: Option<Expression>) -> Self {
        self.filter = filter;
        self
    }

    /// The same query, asking for the page after `token`.
    pub fn page(&self, token: impl Into<String>) -> Self {
        Self {
            next_page_token: Some(token.into()),
            ..self.clone()
        }
    }

    /// The metric whose amounts are read from the response.
    pub fn metric(&self) -> &str {
        self.metrics.first().map(String::as_str).unwrap_or_default()
    }

    /// The credits filter this query was built with, if its filter expression is one of ours.
    pub fn credits_filter(&self) -> Option<CreditsFilter> {
        CreditsFilter::ALL
            .into_iter()
            .find(|credits| credits.expression() == self.filter)
    }

    /// Identifies the grouping of this query, e.g. `DIMENSION:SERVICE`. Empty when ungrouped.
    pub fn signature(&self) -> String {
        self.group_by
            .iter()
            .map(GroupDefinition::signature)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// A reservation coverage query.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CoverageQuery {
    pub time_period: TimePeriod,
    pub granularity: Granularity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

impl CoverageQuery {
    pub fn new(time_period: TimePeriod) -> Self {
        Self {
            time_period,
            granularity: Granularity::Monthly,
            next_page_token: None,
        }
    }

    pub fn page(&self, token: impl Into<String>) -> Self {
        Self {
            next_page_token: Some(token.into()),
            ..self.clone()
        }
    }
}
