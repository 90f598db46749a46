use registry::RegistryConfig;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Request timeout cannot be 0")]
    InvalidTimeout,

    #[error("Analytics base URL cannot be used as a base: {0}")]
    InvalidAnalyticsUrl(Url),

    #[error("Registry configuration error: {0}")]
    Registry(#[from] registry::ValidationError),
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Client configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ClientConfig {
    /// Base URL of the analytics API serving lead time, commit frequency,
    /// pull request and code review metrics
    pub analytics_base_url: Url,
    /// Upper bound for any single request to a metrics service
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Timezone identifier sent to the services. Falls back to `TZ`, then UTC.
    #[serde(default)]
    pub timezone: Option<String>,
    /// Where the incident and deployment services are discovered
    pub registry: RegistryConfig,
}

impl ClientConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.request_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }

        if self.analytics_base_url.cannot_be_a_base() {
            return Err(ValidationError::InvalidAnalyticsUrl(
                self.analytics_base_url.clone(),
            ));
        }

        self.registry.validate()?;

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
