use serde::{Deserialize, Deserializer};

/// How a widget wants its data bucketed.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum AggregateMode {
    /// Only the most recent period
    Latest,
    /// Any other mode the dashboard sends; treated as a historical window
    Other(String),
}

impl From<String> for AggregateMode {
    fn from(mode: String) -> Self {
        if mode == "latest" {
            AggregateMode::Latest
        } else {
            AggregateMode::Other(mode)
        }
    }
}

/// Filters selected in the dashboard UI.
///
/// Every field is optional: an absent value, an empty string, an empty list,
/// `false` or `0` all mean "do not filter on this". Deserializes from the
/// camelCase JSON the dashboard produces.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterCriteria {
    pub offset: Option<i64>,
    pub limit: Option<u32>,
    pub aggregate_mode: Option<AggregateMode>,
    #[serde(deserialize_with = "null_as_default")]
    pub is_deploy_success: bool,

    pub previous_days: Option<u32>,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    pub history_days: Option<u32>,

    pub search: Option<String>,
    #[serde(rename = "failurerate")]
    pub failure_rate: Option<String>,
    pub order_by: Option<String>,
    pub sort_order: Option<String>,
    pub group_by: Option<String>,

    #[serde(deserialize_with = "null_as_default")]
    pub is_lines_changed: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub is_production: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub decrypt_code: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub exclude_empty_applications: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub exclude_empty_technical_services: bool,

    #[serde(deserialize_with = "null_as_default")]
    pub application: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub environment: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub status: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub technical_service_filter_list: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub reviewed_by_filter_list: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub created_by_filter_list: Vec<String>,

    /// Lead-time drill-down: commit date of the selected bar
    pub first_commit_date: Option<String>,
    /// Lead-time drill-down: deployment date of the selected bar
    pub deployment_date: Option<String>,

    /// Only read by the literal query string of the people-scoped charts
    pub timezone: Option<String>,
}

impl FilterCriteria {
    pub fn is_latest(&self) -> bool {
        matches!(self.aggregate_mode, Some(AggregateMode::Latest))
    }

    /// A custom date range overrides any relative `previousDays` window.
    pub fn has_custom_range(&self) -> bool {
        non_empty(&self.from_date).is_some() && non_empty(&self.to_date).is_some()
    }
}

/// Explicit `null`s from the dashboard mean the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// The string value if it is present and not empty.
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
