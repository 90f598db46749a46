use crate::catalog::{
    AnalyticsMetric, CHANGE_LEAD_TIME_CHART_PATH, LEAD_TIME_SERVICE_ID, PeopleChart, ServiceMetric,
};
use crate::config::ClientConfig;
use crate::criteria::{FilterCriteria, non_empty};
use crate::dispatcher::{AggregateResult, DispatchRequest, Dispatcher};
use crate::errors::Result;
use crate::params::{NormalizedParams, drop_previous_days_on_custom_range, normalize};
use crate::query_string::build_query_string;
use crate::timezone::local_timezone;
use crate::transport::{ReqwestTransport, Transport};
use registry::types::with_trailing_slash;
use registry::{Registry, ServiceCategory, ServiceEndpoint};
use serde_json::Value;
use std::sync::Arc;
use url::Url;

/// Service id recorded for requests to the analytics API.
const ANALYTICS_SERVICE_ID: &str = "analytics";

/// Deployment aggregates page size when the caller sets none.
const DEFAULT_DEPLOYMENT_LIMIT: &str = "100";

/// Entry point for every DORA metric the dashboard reads.
///
/// Holds no per-call state: services are resolved from the registry on every
/// call.
#[derive(Clone)]
pub struct DoraMetrics {
    registry: Registry,
    dispatcher: Dispatcher,
    analytics_base_url: Url,
    timezone: String,
}

impl DoraMetrics {
    /// Registry lookups and metric requests share the configured request
    /// timeout.
    pub fn new(config: &ClientConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        let registry = Registry::new(config.registry.clone(), config.request_timeout())?;
        Ok(Self::with_registry(
            registry,
            Dispatcher::new(transport, config.request_timeout()),
            config.analytics_base_url.clone(),
            local_timezone(config.timezone.as_deref()),
        ))
    }

    /// Builds the client with the default HTTP transport.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let transport = ReqwestTransport::new()?;
        Self::new(config, Arc::new(transport))
    }

    pub fn with_registry(
        registry: Registry,
        dispatcher: Dispatcher,
        analytics_base_url: Url,
        timezone: String,
    ) -> Self {
        Self {
            registry,
            dispatcher,
            analytics_base_url: with_trailing_slash(analytics_base_url),
            timezone,
        }
    }

    /// The timezone identifier sent to the services.
    pub fn timezone(&self) -> &str {
        &self.timezone
    }

    pub async fn services(&self, category: ServiceCategory) -> Result<Vec<ServiceEndpoint>> {
        Ok(self.registry.resolve(category).await?)
    }

    /// Requests `metric_path` from every service of `category` in parallel.
    ///
    /// Returns one entry per resolved service, in resolution order, with
    /// `None` for each service whose request failed. No request is made when
    /// no service is resolved. Only registry failures are returned as errors.
    pub async fn aggregate(
        &self,
        metric_path: &str,
        criteria: &FilterCriteria,
        category: ServiceCategory,
    ) -> Result<Vec<AggregateResult>> {
        let endpoints = self.registry.resolve(category).await?;
        if endpoints.is_empty() {
            tracing::debug!(category = %category, "No services registered");
            return Ok(Vec::new());
        }

        let params = self.with_timezone(normalize(criteria), criteria);
        let query = params.to_query_pairs();

        let requests = endpoints
            .iter()
            .map(|endpoint| -> Result<DispatchRequest> {
                let url = endpoint.url_for(metric_path)?;
                Ok(DispatchRequest::get(endpoint.id.clone(), url, query.clone()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(self.dispatcher.fan_out(requests).await)
    }

    pub async fn service_metric(
        &self,
        metric: ServiceMetric,
        criteria: &FilterCriteria,
    ) -> Result<Vec<AggregateResult>> {
        match metric {
            ServiceMetric::DeploymentAggregates => self.deployment_aggregates(criteria, false).await,
            _ => {
                self.aggregate(metric.path(), criteria, metric.category())
                    .await
            }
        }
    }

    /// Deployment status charts from every deployment service.
    ///
    /// Services without an id are skipped. The overview page sends the
    /// filters as they are; everywhere else the page size defaults to 100 and
    /// the timezone is added.
    pub async fn deployment_aggregates(
        &self,
        criteria: &FilterCriteria,
        from_overview: bool,
    ) -> Result<Vec<AggregateResult>> {
        let endpoints = self.registry.resolve(ServiceCategory::Deployment).await?;

        let mut params = normalize(criteria);
        if !from_overview {
            if !params.contains_key("limit") {
                params.insert("limit", DEFAULT_DEPLOYMENT_LIMIT);
            }
            params = self.with_timezone(params, criteria);
        }
        let query = params.to_query_pairs();

        let requests = endpoints
            .iter()
            .filter(|endpoint| !endpoint.id.is_empty())
            .map(|endpoint| -> Result<DispatchRequest> {
                let url = endpoint.url_for(ServiceMetric::DeploymentAggregates.path())?;
                Ok(DispatchRequest::get(endpoint.id.clone(), url, query.clone()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(self.dispatcher.fan_out(requests).await)
    }

    /// Change lead time bars.
    ///
    /// Served by the analytics API, once for each registered deployment
    /// service with the lead-time id. Failed requests yield `None`.
    pub async fn change_lead_time_chart(
        &self,
        criteria: &FilterCriteria,
    ) -> Result<Vec<AggregateResult>> {
        let endpoints = self.registry.resolve(ServiceCategory::Deployment).await?;

        let params = self.with_timezone(normalize(criteria), criteria);
        let query = params.to_query_pairs();
        let url = self.analytics_base_url.join(CHANGE_LEAD_TIME_CHART_PATH)?;

        let requests = endpoints
            .iter()
            .filter(|endpoint| endpoint.id == LEAD_TIME_SERVICE_ID)
            .map(|endpoint| DispatchRequest::get(endpoint.id.clone(), url.clone(), query.clone()))
            .collect();

        Ok(self.dispatcher.fan_out(requests).await)
    }

    /// Reads a single analytics metric. Request failures are returned.
    pub async fn fetch(&self, metric: AnalyticsMetric, criteria: &FilterCriteria) -> Result<Value> {
        let mut params = normalize(criteria);
        if metric == AnalyticsMetric::ChangeLeadTimeDetails {
            if let Some(date) = non_empty(&criteria.first_commit_date) {
                params.insert("firstCommitDate", date);
            }
            if let Some(date) = non_empty(&criteria.deployment_date) {
                params.insert("deploymentDate", date);
            }
        }
        if metric.sends_timezone() {
            params = self.with_timezone(params, criteria);
        }

        let url = self.analytics_base_url.join(metric.path())?;
        let request = DispatchRequest::get(ANALYTICS_SERVICE_ID, url, params.to_query_pairs());

        Ok(self.dispatcher.send(&request).await?)
    }

    /// Posts `people` to a developer or reviewer chart, with the filters in
    /// the URL. Request failures are returned.
    pub async fn people_chart(
        &self,
        chart: PeopleChart,
        criteria: &FilterCriteria,
        people: &[Value],
    ) -> Result<Value> {
        let mut url = self.analytics_base_url.join(chart.path())?;
        let query = build_query_string(criteria);
        if !query.is_empty() {
            url.set_query(Some(&query));
        }

        let request = DispatchRequest::post(ANALYTICS_SERVICE_ID, url, Value::from(people.to_vec()));

        Ok(self.dispatcher.send(&request).await?)
    }

    fn with_timezone(
        &self,
        mut params: NormalizedParams,
        criteria: &FilterCriteria,
    ) -> NormalizedParams {
        params.insert("timezone", self.timezone.as_str());
        drop_previous_days_on_custom_range(criteria, &mut params);
        params
    }
}
