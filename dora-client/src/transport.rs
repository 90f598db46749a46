use crate::errors::{DoraError, RequestFailure};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Issues requests to the metrics services and decodes their JSON bodies.
///
/// Any non-2xx status, network error or undecodable body is a
/// [`RequestFailure`]. An empty 2xx body decodes to `Value::Null`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &Url, query: &[(String, String)]) -> Result<Value, RequestFailure>;

    async fn post(&self, url: &Url, body: &Value) -> Result<Value, RequestFailure>;
}

/// [`Transport`] backed by a pooled reqwest client.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, DoraError> {
        let client = reqwest::Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn send(
        &self,
        url: &Url,
        request: reqwest::RequestBuilder,
    ) -> Result<Value, RequestFailure> {
        let network_error = |e: reqwest::Error| RequestFailure::Network {
            url: url.to_string(),
            reason: e.to_string(),
        };

        let response = request.send().await.map_err(network_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(RequestFailure::Status {
                url: url.to_string(),
                status,
            });
        }

        let body = response.bytes().await.map_err(network_error)?;
        if body.is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_slice(&body).map_err(|e| RequestFailure::InvalidBody {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &Url, query: &[(String, String)]) -> Result<Value, RequestFailure> {
        let request = self.client.get(url.clone()).query(query);
        self.send(url, request).await
    }

    async fn post(&self, url: &Url, body: &Value) -> Result<Value, RequestFailure> {
        let request = self.client.post(url.clone()).json(body);
        self.send(url, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::{BodyExt, Full};
    use hyper::body::Bytes;
    use hyper::service::service_fn;
    use hyper::{Request, Response};
    use hyper_util::rt::{TokioExecutor, TokioIo};
    use serde_json::json;
    use std::convert::Infallible;
    use tokio::net::TcpListener;

    // Routes by path; `/echo` returns the method, query and request body as JSON
    async fn test_handler(
        req: Request<hyper::body::Incoming>,
    ) -> Result<Response<Full<Bytes>>, Infallible> {
        let (parts, body) = req.into_parts();
        let body_bytes = body
            .collect()
            .await
            .map(|collected| collected.to_bytes())
            .unwrap_or_else(|_| Bytes::new());

        let (status, body): (u16, Bytes) = match parts.uri.path() {
            "/echo" => {
                let request_body: Value =
                    serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);
                let echoed = json!({
                    "method": parts.method.as_str(),
                    "query": parts.uri.query().unwrap_or_default(),
                    "body": request_body,
                });
                (200, Bytes::from(echoed.to_string()))
            }
            "/empty" => (204, Bytes::new()),
            "/garbage" => (200, Bytes::from_static(b"<html>not json</html>")),
            _ => (500, Bytes::from_static(b"{\"error\":\"boom\"}")),
        };

        Ok(Response::builder()
            .status(status)
            .body(Full::new(body))
            .unwrap())
    }

    async fn start_test_server() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to address");
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            loop {
                let (stream, _) = listener.accept().await.unwrap();
                let io = TokioIo::new(stream);

                tokio::spawn(async move {
                    if let Err(err) =
                        hyper_util::server::conn::auto::Builder::new(TokioExecutor::new())
                            .serve_connection(io, service_fn(test_handler))
                            .await
                    {
                        eprintln!("Error serving connection: {:?}", err);
                    }
                });
            }
        });

        port
    }

    fn url(port: u16, path: &str) -> Url {
        Url::parse(&format!("http://127.0.0.1:{port}{path}")).unwrap()
    }

    #[tokio::test]
    async fn test_get_sends_query_pairs() {
        let port = start_test_server().await;
        let transport = ReqwestTransport::new().unwrap();

        let query = vec![
            ("application".to_string(), "checkout".to_string()),
            ("application".to_string(), "billing".to_string()),
            ("timezone".to_string(), "UTC".to_string()),
        ];
        let body = transport.get(&url(port, "/echo"), &query).await.unwrap();

        assert_eq!(body["method"], "GET");
        assert_eq!(
            body["query"],
            "application=checkout&application=billing&timezone=UTC"
        );
    }

    #[tokio::test]
    async fn test_post_keeps_literal_query() {
        let port = start_test_server().await;
        let transport = ReqwestTransport::new().unwrap();

        let people = json!(["alice", "bob"]);
        let body = transport
            .post(&url(port, "/echo?groupBy=week&timezone=UTC"), &people)
            .await
            .unwrap();

        assert_eq!(body["method"], "POST");
        assert_eq!(body["query"], "groupBy=week&timezone=UTC");
        assert_eq!(body["body"], people);
    }

    #[tokio::test]
    async fn test_failures() {
        let port = start_test_server().await;
        let transport = ReqwestTransport::new().unwrap();

        let result = transport.get(&url(port, "/missing"), &[]).await;
        assert!(matches!(
            result,
            Err(RequestFailure::Status { status, .. }) if status == http::StatusCode::INTERNAL_SERVER_ERROR
        ));

        let result = transport.get(&url(port, "/garbage"), &[]).await;
        assert!(matches!(result, Err(RequestFailure::InvalidBody { .. })));

        // Nothing listens on port 9 of localhost
        let result = transport.get(&url(9, "/echo"), &[]).await;
        assert!(matches!(result, Err(RequestFailure::Network { .. })));
    }

    #[tokio::test]
    async fn test_empty_body_is_null() {
        let port = start_test_server().await;
        let transport = ReqwestTransport::new().unwrap();

        let body = transport.get(&url(port, "/empty"), &[]).await.unwrap();
        assert_eq!(body, Value::Null);
    }
}
