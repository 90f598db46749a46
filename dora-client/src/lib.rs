//! Client for the DORA metrics services behind the engineering dashboard.
//!
//! Dashboard filters are normalized into query parameters, the incident and
//! deployment services are resolved from a [`registry::Registry`], and each
//! metric is requested from every service at once. A service that fails does
//! not fail the metric: its slot in the result is `None`.

pub mod catalog;
pub mod config;
pub mod criteria;
pub mod dispatcher;
pub mod errors;
pub mod metrics_defs;
pub mod params;
pub mod query_string;
pub mod service;
pub mod timezone;
pub mod transport;

#[cfg(test)]
mod testutils;

pub use catalog::{AnalyticsMetric, PeopleChart, ServiceMetric, UnknownMetric};
pub use config::{ClientConfig, ValidationError};
pub use criteria::{AggregateMode, FilterCriteria};
pub use dispatcher::{AggregateResult, DispatchRequest, Dispatcher};
pub use errors::{DoraError, RequestFailure, Result};
pub use params::{NormalizedParams, ParamValue, normalize};
pub use query_string::build_query_string;
pub use service::DoraMetrics;
pub use transport::{ReqwestTransport, Transport};
