//! Literal query strings for the people-scoped chart endpoints.
//!
//! Those endpoints take the developer or reviewer list as a POST body, so the
//! filters travel in the URL. Only a fixed allow-list of filters is sent, always
//! in the same order.

use crate::criteria::{FilterCriteria, non_empty};
use crate::params::ParamValue;
use url::form_urlencoded::byte_serialize;

/// Filters sent to the people-scoped charts, in wire order.
pub const PEOPLE_CHART_KEYS: [&str; 9] = [
    "application",
    "previousDays",
    "fromDate",
    "toDate",
    "technicalServiceFilterList",
    "groupBy",
    "isLinesChanged",
    "decryptCode",
    "timezone",
];

/// Serializes the allow-listed filters as `key=value&...`.
///
/// Unset values are skipped; the result is empty when nothing is set. Lists
/// are comma separated and values are percent-encoded.
pub fn build_query_string(criteria: &FilterCriteria) -> String {
    PEOPLE_CHART_KEYS
        .iter()
        .filter_map(|key| allow_listed_value(criteria, key).map(|value| (key, value)))
        .map(|(key, value)| {
            let encoded: String = byte_serialize(value.to_literal().as_bytes()).collect();
            format!("{key}={encoded}")
        })
        .collect::<Vec<_>>()
        .join("&")
}

fn allow_listed_value(criteria: &FilterCriteria, key: &str) -> Option<ParamValue> {
    let list = |values: &[String]| (!values.is_empty()).then(|| ParamValue::from(values));
    let flag = |set: bool| set.then_some(ParamValue::Flag(true));
    let text = |value: &Option<String>| non_empty(value).map(ParamValue::from);

    match key {
        "application" => list(criteria.application.as_slice()),
        "previousDays" => criteria
            .previous_days
            .filter(|days| *days > 0)
            .map(|days| ParamValue::Text(days.to_string())),
        "fromDate" => text(&criteria.from_date),
        "toDate" => text(&criteria.to_date),
        "technicalServiceFilterList" => list(criteria.technical_service_filter_list.as_slice()),
        "groupBy" => text(&criteria.group_by),
        "isLinesChanged" => flag(criteria.is_lines_changed),
        "decryptCode" => flag(criteria.decrypt_code),
        "timezone" => text(&criteria.timezone),
        _ => None,
    }
}
