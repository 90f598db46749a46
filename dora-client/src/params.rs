//! Filter normalization
//!
//! Turns the dashboard's [`FilterCriteria`] into the flat set of query
//! parameters the metrics services understand. Normalization is a pure
//! function: the same criteria always yield the same parameters in the same
//! order.
//!
//! `timezone` is deliberately not produced here. Each call site decides
//! whether its endpoint takes one.

use crate::criteria::{FilterCriteria, non_empty};
use indexmap::IndexMap;

/// A single normalized query parameter value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParamValue {
    Text(String),
    Flag(bool),
    /// Sent as one `key=value` pair per element
    List(Vec<String>),
}

impl ParamValue {
    /// Rendering used by literal query strings, where lists are comma separated.
    pub fn to_literal(&self) -> String {
        match self {
            ParamValue::Text(text) => text.clone(),
            ParamValue::Flag(flag) => flag.to_string(),
            ParamValue::List(items) => items.join(","),
        }
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Flag(value)
    }
}

impl From<&[String]> for ParamValue {
    fn from(value: &[String]) -> Self {
        ParamValue::List(value.to_vec())
    }
}

/// Query parameters in insertion order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NormalizedParams {
    params: IndexMap<&'static str, ParamValue>,
}

impl NormalizedParams {
    /// Sets `key`, keeping its original position if it was already present.
    pub fn insert(&mut self, key: &'static str, value: impl Into<ParamValue>) {
        self.params.insert(key, value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<ParamValue> {
        self.params.shift_remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.params.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.params.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Flattens the parameters into `(key, value)` pairs for a request URL.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(self.params.len());
        for (key, value) in &self.params {
            match value {
                ParamValue::List(items) => {
                    pairs.extend(items.iter().map(|item| (key.to_string(), item.clone())));
                }
                other => pairs.push((key.to_string(), other.to_literal())),
            }
        }
        pairs
    }
}

/// Converts dashboard filters into query parameters.
pub fn normalize(criteria: &FilterCriteria) -> NormalizedParams {
    let mut params = NormalizedParams::default();

    if let Some(offset) = criteria.offset.filter(|offset| *offset > -1) {
        params.insert("offset", offset.to_string());
    }
    if let Some(limit) = criteria.limit.filter(|limit| *limit > 0) {
        params.insert("limit", limit.to_string());
    }
    if criteria.is_latest() {
        params.insert("period", "latest");
    }
    if criteria.is_deploy_success {
        params.insert("isDeploySuccess", true);
    }

    insert_query_options(criteria, &mut params);
    insert_filter_lists(criteria, &mut params);

    if let Some(from_date) = non_empty(&criteria.from_date) {
        params.insert("fromDate", from_date);
    }
    if let Some(to_date) = non_empty(&criteria.to_date) {
        params.insert("toDate", to_date);
    }

    drop_previous_days_on_custom_range(criteria, &mut params);

    params
}

/// Removes the relative window when an explicit date range is selected.
pub fn drop_previous_days_on_custom_range(criteria: &FilterCriteria, params: &mut NormalizedParams) {
    if criteria.has_custom_range() {
        params.remove("previousDays");
    }
}

/// Time window, search and ordering options.
fn insert_query_options(criteria: &FilterCriteria, params: &mut NormalizedParams) {
    if let Some(days) = criteria.previous_days.filter(|days| *days > 0) {
        params.insert("previousDays", days.to_string());
    }
    if let Some(search) = non_empty(&criteria.search) {
        params.insert("search", search);
    }
    if let Some(failure_rate) = non_empty(&criteria.failure_rate) {
        params.insert("failurerate", failure_rate);
    }
    if let Some(order_by) = non_empty(&criteria.order_by) {
        params.insert("orderBy", order_by.replacen('_', "", 1));
    }
    if let Some(sort_order) = non_empty(&criteria.sort_order) {
        params.insert("sortOrder", sort_order);
    }
    if let Some(group_by) = non_empty(&criteria.group_by) {
        params.insert("groupBy", group_by);
    }
    if criteria.is_lines_changed {
        params.insert("isLinesChanged", true);
    }
    if !criteria.reviewed_by_filter_list.is_empty() {
        params.insert(
            "reviewedByFilterList",
            criteria.reviewed_by_filter_list.as_slice(),
        );
    }
}

/// Set-valued filters and exclusion flags.
fn insert_filter_lists(criteria: &FilterCriteria, params: &mut NormalizedParams) {
    let lists: [(&'static str, &Vec<String>); 3] = [
        ("application", &criteria.application),
        ("environment", &criteria.environment),
        ("status", &criteria.status),
    ];
    for (key, values) in lists {
        if !values.is_empty() {
            params.insert(key, values.as_slice());
        }
    }

    if criteria.is_production {
        params.insert("isProduction", true);
    }
    if let Some(days) = criteria.history_days.filter(|days| *days > 0) {
        params.insert("historyDays", days.to_string());
    }
    if criteria.exclude_empty_applications {
        params.insert("excludeEmptyApplications", true);
    }
    if criteria.exclude_empty_technical_services {
        params.insert("excludeEmptyTechnicalServices", true);
    }
    if !criteria.technical_service_filter_list.is_empty() {
        params.insert(
            "technicalServiceFilterList",
            criteria.technical_service_filter_list.as_slice(),
        );
    }
    if criteria.decrypt_code {
        params.insert("decryptCode", true);
    }
    if !criteria.created_by_filter_list.is_empty() {
        params.insert(
            "createdByFilterList",
            criteria.created_by_filter_list.as_slice(),
        );
    }
}
