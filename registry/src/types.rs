use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Logical group of backend services that serve the same family of metrics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceCategory {
    /// Services that report incidents (MTTR, change failure rate, priorities).
    Incident,
    /// Services that report deployments.
    Deployment,
}

impl ServiceCategory {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ServiceCategory::Incident => "incident",
            ServiceCategory::Deployment => "deployment",
        }
    }
}

impl fmt::Display for ServiceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
#[error("unknown service category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for ServiceCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "incident" => Ok(ServiceCategory::Incident),
            "deployment" => Ok(ServiceCategory::Deployment),
            _ => Err(UnknownCategory(s.to_string())),
        }
    }
}

/// A concrete backend service resolved from the registry.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ServiceEndpoint {
    pub id: String,
    /// Always ends with a `/` so relative metric paths join below it.
    pub base_url: Url,
}

impl ServiceEndpoint {
    pub fn new<I>(id: I, base_url: Url) -> Self
    where
        I: Into<String>,
    {
        ServiceEndpoint {
            id: id.into(),
            base_url: with_trailing_slash(base_url),
        }
    }

    /// Builds the URL of `path` on this service.
    pub fn url_for(&self, path: &str) -> Result<Url, url::ParseError> {
        self.base_url.join(path.trim_start_matches('/'))
    }
}

/// `Url::join` replaces the last path segment unless the base ends in `/`.
pub fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
