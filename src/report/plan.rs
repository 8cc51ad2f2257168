use crate::api::{CreditsFilter, GroupDefinition};
use crate::report::Style;

/// One report in a run, in the order it is added to the registry.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum PlanItem {
    Cost {
        name: String,
        group_by: Vec<GroupDefinition>,
        style: Style,
        /// `None` uses the run-wide credits filter.
        credits: Option<CreditsFilter>,
    },
    Coverage {
        name: String,
    },
}

impl PlanItem {
    pub fn cost(
        name: impl Into<String>,
        group_by: Vec<GroupDefinition>,
        style: Style,
        credits: Option<CreditsFilter>,
    ) -> Self {
        PlanItem::Cost {
            name: name.into(),
            group_by,
            style,
            credits,
        }
    }

    pub fn coverage(name: impl Into<String>) -> Self {
        PlanItem::Coverage { name: name.into() }
    }

    pub fn name(&self) -> &str {
        match self {
            PlanItem::Cost { name, .. } | PlanItem::Coverage { name } => name,
        }
    }
}

/// The standard set of reports: totals with and without credits, credits and upfront fees on
/// their own, reservation coverage, then totals and changes by service, account and region, and
/// finally by each cost allocation tag in `cost_tags`.
pub fn default_plan(cost_tags: &[String]) -> Vec<PlanItem> {
    use CreditsFilter::*;
    use Style::*;

    let mut plan = vec![
        PlanItem::cost("Total", vec![], Total, Some(Exclude)),
        PlanItem::cost("TotalChange", vec![], Change, Some(Exclude)),
        PlanItem::cost("TotalInclCredits", vec![], Total, Some(Include)),
        PlanItem::cost("TotalInclCreditsChange", vec![], Change, Some(Include)),
        PlanItem::cost("Credits", vec![], Total, Some(CreditsOnly)),
        PlanItem::cost("RIUpfront", vec![], Total, Some(UpfrontOnly)),
        PlanItem::coverage("RICoverage"),
    ];

    for (name, dimension) in [
        ("Services", "SERVICE"),
        ("Accounts", "LINKED_ACCOUNT"),
        ("Regions", "REGION"),
    ] {
        let group_by = vec![GroupDefinition::dimension(dimension)];
        plan.push(PlanItem::cost(name, group_by.clone(), Total, None));
        plan.push(PlanItem::cost(format!("{name}Change"), group_by, Change, None));
    }

    for tag in cost_tags {
        // ':' is not allowed in a tab name
        let tab = tag.replace(':', ".");
        let group_by = vec![GroupDefinition::tag(tag)];
        plan.push(PlanItem::cost(&tab, group_by.clone(), Total, None));
        plan.push(PlanItem::cost(format!("Change-{tab}"), group_by, Change, None));
    }
    plan
}
