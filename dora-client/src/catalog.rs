//! Metric endpoint catalog
//!
//! Every endpoint the dashboard reads from, grouped by how it is reached.
//!
//! # Service metrics
//!
//! Served by every service of a category. The same relative path is requested
//! from each resolved service and the answers are returned side by side:
//!
//! | metric                  | category   | path                          |
//! |-------------------------|------------|-------------------------------|
//! | `priorities`            | incident   | `priorities`                  |
//! | `mttr-chart`            | incident   | `incidentAggregates/charts`   |
//! | `mttr-table`            | incident   | `incidentAggregates`          |
//! | `cfr-chart`             | incident   | `cfrAggregates/charts`        |
//! | `cfr-table`             | incident   | `cfrAggregates`               |
//! | `deployments`           | deployment | `deployments`                 |
//! | `deployment-aggregates` | deployment | `deploymentAggregates/charts` |
//!
//! # Analytics metrics
//!
//! Served by the single analytics API. Requested with `GET` and the normalized
//! filters as query parameters.
//!
//! # People charts
//!
//! Also served by the analytics API, but scoped to a set of developers or
//! reviewers. The set is sent as a JSON array in a `POST` body and the filters
//! as a literal query string (see [`crate::query_string`]).

use registry::ServiceCategory;
use std::fmt;
use std::str::FromStr;

/// Lead time is computed by the analytics API, but only offered when a
/// deployment service with this id is registered.
pub const LEAD_TIME_SERVICE_ID: &str = "deployments";

pub const CHANGE_LEAD_TIME_CHART_PATH: &str =
    "insightscontroller/v1/issueLeadTimeChangeAggregate/chartV2";

#[derive(thiserror::Error, Debug, PartialEq)]
#[error("unknown metric: {0}")]
pub struct UnknownMetric(pub String);

macro_rules! metric_names {
    ($ty:ident { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            pub const ALL: &'static [$ty] = &[$($ty::$variant),+];

            pub const fn name(&self) -> &'static str {
                match self {
                    $($ty::$variant => $name),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }

        impl FromStr for $ty {
            type Err = UnknownMetric;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $ty::ALL
                    .iter()
                    .find(|metric| metric.name() == s)
                    .copied()
                    .ok_or_else(|| UnknownMetric(s.to_string()))
            }
        }
    };
}

/// Metrics fanned out to every service of a category.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServiceMetric {
    Priorities,
    MttrChart,
    MttrTable,
    CfrChart,
    CfrTable,
    Deployments,
    DeploymentAggregates,
}

metric_names!(ServiceMetric {
    Priorities => "priorities",
    MttrChart => "mttr-chart",
    MttrTable => "mttr-table",
    CfrChart => "cfr-chart",
    CfrTable => "cfr-table",
    Deployments => "deployments",
    DeploymentAggregates => "deployment-aggregates",
});

impl ServiceMetric {
    pub const fn path(&self) -> &'static str {
        match self {
            ServiceMetric::Priorities => "priorities",
            ServiceMetric::MttrChart => "incidentAggregates/charts",
            ServiceMetric::MttrTable => "incidentAggregates",
            ServiceMetric::CfrChart => "cfrAggregates/charts",
            ServiceMetric::CfrTable => "cfrAggregates",
            ServiceMetric::Deployments => "deployments",
            ServiceMetric::DeploymentAggregates => "deploymentAggregates/charts",
        }
    }

    pub const fn category(&self) -> ServiceCategory {
        match self {
            ServiceMetric::Priorities
            | ServiceMetric::MttrChart
            | ServiceMetric::MttrTable
            | ServiceMetric::CfrChart
            | ServiceMetric::CfrTable => ServiceCategory::Incident,
            ServiceMetric::Deployments | ServiceMetric::DeploymentAggregates => {
                ServiceCategory::Deployment
            }
        }
    }
}

/// Metrics read from the analytics API with a plain `GET`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnalyticsMetric {
    ChangeLeadTimeDetails,
    CommitFrequencyChart,
    CommitFrequencyTable,
    Developers,
    TechnicalServices,
    PrTimeToMergeChart,
    LinesFilesChangedChart,
    PrSizeChart,
    PrSizeDetails,
    CodeReviewVelocityChart,
    CodeReviewVelocityDetails,
    PrTimeToMergeDetails,
    CodeReviewEfficiencyChart,
    CodeReviewEfficiencyDetails,
}

metric_names!(AnalyticsMetric {
    ChangeLeadTimeDetails => "change-lead-time-details",
    CommitFrequencyChart => "commit-frequency-chart",
    CommitFrequencyTable => "commit-frequency-table",
    Developers => "developers",
    TechnicalServices => "technical-services",
    PrTimeToMergeChart => "pr-time-to-merge-chart",
    LinesFilesChangedChart => "lines-files-changed-chart",
    PrSizeChart => "pr-size-chart",
    PrSizeDetails => "pr-size-details",
    CodeReviewVelocityChart => "code-review-velocity-chart",
    CodeReviewVelocityDetails => "code-review-velocity-details",
    PrTimeToMergeDetails => "pr-time-to-merge-details",
    CodeReviewEfficiencyChart => "code-review-efficiency-chart",
    CodeReviewEfficiencyDetails => "code-review-efficiency-details",
});

impl AnalyticsMetric {
    pub const fn path(&self) -> &'static str {
        match self {
            AnalyticsMetric::ChangeLeadTimeDetails => "insightscontroller/v1/issueSnapShotDetails",
            AnalyticsMetric::CommitFrequencyChart => "develop/v3/applicationCommitFrequency/chart",
            AnalyticsMetric::CommitFrequencyTable => "develop/v3/commitFrequencyViewDetails",
            AnalyticsMetric::Developers => "develop/v3/developers",
            AnalyticsMetric::TechnicalServices => "develop/v3/technicalServices",
            AnalyticsMetric::PrTimeToMergeChart => "develop/v3/applicationPRTimeToMerge/chart",
            AnalyticsMetric::LinesFilesChangedChart => {
                "develop/v3/applicationPRTimeToMerge/barChart"
            }
            AnalyticsMetric::PrSizeChart => "develop/v3/applicationPRSize/chart",
            AnalyticsMetric::PrSizeDetails => "develop/v3/prSizeViewDetails",
            AnalyticsMetric::CodeReviewVelocityChart => {
                "develop/v3/applicationCodeReviewVelocity/chart"
            }
            AnalyticsMetric::CodeReviewVelocityDetails => {
                "develop/v3/codeReviewVelocityViewDetails"
            }
            AnalyticsMetric::PrTimeToMergeDetails => "develop/v3/prTimeToMergeViewDetails",
            AnalyticsMetric::CodeReviewEfficiencyChart => {
                "develop/v3/applicationCodeReviewEfficiency/chart"
            }
            AnalyticsMetric::CodeReviewEfficiencyDetails => {
                "develop/v3/codeReviewEfficiencyViewDetails"
            }
        }
    }

    /// Listing endpoints and the lead-time drill-down are not bucketed by day
    /// and take no timezone.
    pub const fn sends_timezone(&self) -> bool {
        !matches!(
            self,
            AnalyticsMetric::ChangeLeadTimeDetails
                | AnalyticsMetric::Developers
                | AnalyticsMetric::TechnicalServices
        )
    }
}

/// Charts scoped to a list of developers or reviewers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PeopleChart {
    DeveloperCommitFrequency,
    DeveloperLinesFilesChanged,
    DeveloperPrTimeToMerge,
    DeveloperPrSize,
    ReviewerCodeReviewVelocity,
    ReviewerCodeReviewEfficiency,
}

metric_names!(PeopleChart {
    DeveloperCommitFrequency => "developer-commit-frequency",
    DeveloperLinesFilesChanged => "developer-lines-files-changed",
    DeveloperPrTimeToMerge => "developer-pr-time-to-merge",
    DeveloperPrSize => "developer-pr-size",
    ReviewerCodeReviewVelocity => "reviewer-code-review-velocity",
    ReviewerCodeReviewEfficiency => "reviewer-code-review-efficiency",
});

impl PeopleChart {
    pub const fn path(&self) -> &'static str {
        match self {
            PeopleChart::DeveloperCommitFrequency => "develop/v3/developerCommitFrequency/chart",
            PeopleChart::DeveloperLinesFilesChanged => "develop/v3/developerPRTimeToMerge/chart",
            PeopleChart::DeveloperPrTimeToMerge => "develop/v3/developerPRTimeToMerge/barChart",
            PeopleChart::DeveloperPrSize => "develop/v3/developerPRSize/chart",
            PeopleChart::ReviewerCodeReviewVelocity => {
                "develop/v3/developerCodeReviewVelocity/chart"
            }
            PeopleChart::ReviewerCodeReviewEfficiency => {
                "develop/v3/developerCodeReviewEfficiency/chart"
            }
        }
    }
}
