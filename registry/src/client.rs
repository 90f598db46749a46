use crate::config::{RegistryConfig, RegistryType};
use crate::metrics_defs::REGISTRY_LOOKUPS;
use crate::static_registry::StaticRegistry;
use crate::types::{ServiceCategory, ServiceEndpoint};
use http::StatusCode;
use std::time::Duration;
use url::Url;

#[derive(thiserror::Error, Debug)]
pub enum RegistryError {
    #[error("HTTP client error: {0}")]
    ReqwestError(#[from] reqwest::Error),
    #[error("registry returned unexpected status {0}")]
    UnexpectedStatus(StatusCode),
    #[error("invalid service URL {url}: {source}")]
    InvalidServiceUrl {
        url: String,
        source: url::ParseError,
    },
}

/// A unified registry client that can work with either a static registry from
/// the config file or a remote registry via HTTP.
///
/// Resolutions are never cached: every call reflects the registry's current
/// view of the services.
#[derive(Clone)]
pub struct Registry(RegistryInner);

impl Registry {
    /// Builds the registry client. Each remote lookup is bounded by
    /// `request_timeout`.
    pub fn new(config: RegistryConfig, request_timeout: Duration) -> Result<Self, RegistryError> {
        let inner = match config.r#type {
            RegistryType::Static { services } => {
                RegistryInner::Static(StaticRegistry::new(services))
            }
            RegistryType::Url { url } => RegistryInner::Url(HttpClient::new(url, request_timeout)?),
        };
        Ok(Registry(inner))
    }

    pub fn from_static(registry: StaticRegistry) -> Self {
        Registry(RegistryInner::Static(registry))
    }

    pub async fn resolve(
        &self,
        category: ServiceCategory,
    ) -> Result<Vec<ServiceEndpoint>, RegistryError> {
        let (source, result) = match &self.0 {
            RegistryInner::Static(r) => ("static", Ok(r.resolve(category))),
            RegistryInner::Url(client) => ("url", client.resolve(category).await),
        };

        let outcome = if result.is_ok() { "ok" } else { "error" };
        shared::counter!(
            REGISTRY_LOOKUPS,
            "source" => source,
            "category" => category.as_str(),
            "outcome" => outcome
        )
        .increment(1);

        if let Ok(endpoints) = &result {
            tracing::debug!(
                category = %category,
                count = endpoints.len(),
                "Resolved services"
            );
        }

        result
    }
}

#[derive(Clone)]
enum RegistryInner {
    Static(StaticRegistry),
    Url(HttpClient),
}

#[derive(serde::Deserialize)]
struct RegistryApiResponse {
    services: Vec<RegistryApiService>,
}

#[derive(serde::Deserialize)]
struct RegistryApiService {
    id: String,
    /// Absolute, or relative to the registry URL
    url: String,
}

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
struct HttpClient {
    client: reqwest::Client,
    url: Url,
}

impl HttpClient {
    fn new(url: Url, request_timeout: Duration) -> Result<Self, RegistryError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .connect_timeout(request_timeout.min(CONNECT_TIMEOUT))
            .build()?;
        Ok(HttpClient { client, url })
    }

    async fn resolve(
        &self,
        category: ServiceCategory,
    ) -> Result<Vec<ServiceEndpoint>, RegistryError> {
        let response = self
            .client
            .get(self.url.clone())
            .query(&[("category", category.as_str())])
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let body = response.json::<RegistryApiResponse>().await?;
                body.services
                    .into_iter()
                    .map(|service| {
                        let base_url = self.url.join(&service.url).map_err(|source| {
                            RegistryError::InvalidServiceUrl {
                                url: service.url.clone(),
                                source,
                            }
                        })?;
                        Ok(ServiceEndpoint::new(service.id, base_url))
                    })
                    .collect()
            }
            StatusCode::NOT_FOUND => Ok(Vec::new()),
            status => Err(RegistryError::UnexpectedStatus(status)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::Full;
    use hyper::body::Bytes;
    use hyper::service::service_fn;
    use hyper::{Request, Response};
    use hyper_util::rt::{TokioExecutor, TokioIo};
    use indexmap::IndexMap;
    use std::convert::Infallible;
    use tokio::net::TcpListener;

    const TEST_TIMEOUT: Duration = Duration::from_secs(5);

    // Registry stub: knows incident services, 404s deployment, 500s anything else
    async fn registry_handler(
        req: Request<hyper::body::Incoming>,
    ) -> Result<Response<Full<Bytes>>, Infallible> {
        let query = req.uri().query().unwrap_or_default().to_string();
        let (status, body): (u16, &str) = match query.as_str() {
            "category=incident" => (
                200,
                r#"{"services":[
                    {"id":"pagerduty","url":"http://incidents.example.com/api"},
                    {"id":"local","url":"/local-incidents/"}
                ]}"#,
            ),
            "category=deployment" => (404, ""),
            _ => (500, "boom"),
        };

        let response = Response::builder()
            .status(status)
            .header("content-type", "application/json")
            .body(Full::new(Bytes::from(body)))
            .unwrap();
        Ok(response)
    }

    async fn start_test_registry() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to address");
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            loop {
                let (stream, _) = listener.accept().await.unwrap();
                let io = TokioIo::new(stream);

                tokio::spawn(async move {
                    let _ = hyper_util::server::conn::auto::Builder::new(TokioExecutor::new())
                        .serve_connection(io, service_fn(registry_handler))
                        .await;
                });
            }
        });

        port
    }

    #[tokio::test]
    async fn test_url_registry_resolves_services() {
        let port = start_test_registry().await;
        let url = Url::parse(&format!("http://127.0.0.1:{port}/registry/services")).unwrap();
        let registry = Registry::new(
            RegistryConfig {
                r#type: RegistryType::Url { url },
            },
            TEST_TIMEOUT,
        )
        .unwrap();

        let services = registry.resolve(ServiceCategory::Incident).await.unwrap();
        assert_eq!(services.len(), 2);
        assert_eq!(services[0].id, "pagerduty");
        assert_eq!(
            services[0].base_url.as_str(),
            "http://incidents.example.com/api/"
        );
        // Relative URLs are resolved against the registry
        assert_eq!(
            services[1].base_url.as_str(),
            format!("http://127.0.0.1:{port}/local-incidents/")
        );

        // 404 means the category has no services
        let services = registry.resolve(ServiceCategory::Deployment).await.unwrap();
        assert!(services.is_empty());
    }

    #[tokio::test]
    async fn test_url_registry_unreachable() {
        // Nothing listens on port 9 of localhost
        let registry = Registry::new(
            RegistryConfig {
                r#type: RegistryType::Url {
                    url: Url::parse("http://127.0.0.1:9/services").unwrap(),
                },
            },
            TEST_TIMEOUT,
        )
        .unwrap();

        let result = registry.resolve(ServiceCategory::Incident).await;
        assert!(matches!(result, Err(RegistryError::ReqwestError(_))));
    }

    #[tokio::test]
    async fn test_url_registry_silent_times_out() {
        // Accepts connections but never answers
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let mut held = Vec::new();
            loop {
                let (stream, _) = listener.accept().await.unwrap();
                held.push(stream);
            }
        });

        let registry = Registry::new(
            RegistryConfig {
                r#type: RegistryType::Url {
                    url: Url::parse(&format!("http://127.0.0.1:{port}/services")).unwrap(),
                },
            },
            Duration::from_millis(200),
        )
        .unwrap();

        let result = tokio::time::timeout(
            Duration::from_secs(3),
            registry.resolve(ServiceCategory::Incident),
        )
        .await
        .expect("lookup should not hang");
        match result {
            Err(RegistryError::ReqwestError(e)) => assert!(e.is_timeout()),
            other => panic!("unexpected result: {:?}", other.map(|s| s.len())),
        }
    }

    #[tokio::test]
    async fn test_static_registry_client() {
        let registry = Registry::new(
            RegistryConfig {
                r#type: RegistryType::Static {
                    services: IndexMap::new(),
                },
            },
            TEST_TIMEOUT,
        )
        .unwrap();
        let services = registry.resolve(ServiceCategory::Incident).await.unwrap();
        assert!(services.is_empty());
    }
}
