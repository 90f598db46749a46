use crate::errors::RequestFailure;
use crate::metrics_defs::{DISPATCH_DURATION, DISPATCH_REQUESTS};
use crate::transport::Transport;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tokio::time::timeout;
use url::Url;

/// Body of one service's answer, or `None` if the request to it failed.
pub type AggregateResult = Option<Value>;

#[derive(Clone, Debug)]
pub enum RequestKind {
    Get { query: Vec<(String, String)> },
    Post { body: Value },
}

/// A request addressed to one backend service.
#[derive(Clone, Debug)]
pub struct DispatchRequest {
    pub service_id: String,
    pub url: Url,
    pub kind: RequestKind,
}

impl DispatchRequest {
    pub fn get(service_id: impl Into<String>, url: Url, query: Vec<(String, String)>) -> Self {
        Self {
            service_id: service_id.into(),
            url,
            kind: RequestKind::Get { query },
        }
    }

    pub fn post(service_id: impl Into<String>, url: Url, body: Value) -> Self {
        Self {
            service_id: service_id.into(),
            url,
            kind: RequestKind::Post { body },
        }
    }
}

/// Sends requests to the metrics services, one at a time or fanned out.
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    request_timeout: Duration,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn Transport>, request_timeout: Duration) -> Self {
        Self {
            transport,
            request_timeout,
        }
    }

    /// Send a single request, bounded by the request timeout.
    pub async fn send(&self, request: &DispatchRequest) -> Result<Value, RequestFailure> {
        let start = Instant::now();

        let call = async {
            match &request.kind {
                RequestKind::Get { query } => self.transport.get(&request.url, query).await,
                RequestKind::Post { body } => self.transport.post(&request.url, body).await,
            }
        };

        let result = match timeout(self.request_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(RequestFailure::Timeout {
                url: request.url.to_string(),
            }),
        };

        let outcome = match &result {
            Ok(_) => "ok",
            Err(RequestFailure::Timeout { .. }) => "timeout",
            Err(_) => "error",
        };
        shared::counter!(
            DISPATCH_REQUESTS,
            "service" => request.service_id.clone(),
            "outcome" => outcome
        )
        .increment(1);
        shared::histogram!(DISPATCH_DURATION, "service" => request.service_id.clone())
            .record(start.elapsed().as_secs_f64());

        result
    }

    /// Execute requests in parallel and collect every answer.
    ///
    /// Returns one entry per request, in request order regardless of which
    /// service answers first. A failed, timed-out or panicked request yields
    /// `None` and never fails the whole fan-out.
    pub async fn fan_out(&self, requests: Vec<DispatchRequest>) -> Vec<AggregateResult> {
        let mut results: Vec<AggregateResult> = vec![None; requests.len()];
        if requests.is_empty() {
            return results;
        }

        let mut join_set = JoinSet::new();

        // Spawn requests for each service
        for (index, request) in requests.into_iter().enumerate() {
            let dispatcher = self.clone();
            join_set.spawn(async move {
                let result = dispatcher.send(&request).await;
                (index, request.service_id, result)
            });
        }

        while let Some(join_result) = join_set.join_next().await {
            match join_result {
                Ok((index, _, Ok(body))) => results[index] = Some(body),
                Ok((_, service_id, Err(e))) => {
                    tracing::warn!(
                        service_id = %service_id,
                        error = %e,
                        "Metrics request failed"
                    );
                }
                Err(e) => tracing::error!("Task panicked: {}", e),
            }
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::{Reply, ScriptedTransport};
    use http::StatusCode;
    use serde_json::json;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_fan_out_no_requests() {
        let transport = Arc::new(ScriptedTransport::new());
        let dispatcher = Dispatcher::new(transport.clone(), Duration::from_secs(5));

        let results = dispatcher.fan_out(Vec::new()).await;

        assert!(results.is_empty());
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_fan_out_keeps_request_order() {
        // The first service answers last
        let transport = Arc::new(
            ScriptedTransport::new()
                .reply(
                    "http://slow/metrics",
                    Reply::Delayed(Duration::from_millis(100), json!({"from": "slow"})),
                )
                .reply("http://fast/metrics", Reply::Json(json!({"from": "fast"}))),
        );
        let dispatcher = Dispatcher::new(transport, Duration::from_secs(5));

        let results = dispatcher
            .fan_out(vec![
                DispatchRequest::get("slow", url("http://slow/metrics"), vec![]),
                DispatchRequest::get("fast", url("http://fast/metrics"), vec![]),
            ])
            .await;

        assert_eq!(
            results,
            vec![Some(json!({"from": "slow"})), Some(json!({"from": "fast"}))]
        );
    }

    #[tokio::test]
    async fn test_fan_out_partial_failures() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .reply("http://a/metrics", Reply::Json(json!([1, 2])))
                .reply(
                    "http://b/metrics",
                    Reply::Status(StatusCode::INTERNAL_SERVER_ERROR),
                )
                .reply("http://d/metrics", Reply::Json(json!([3]))),
        );
        let dispatcher = Dispatcher::new(transport.clone(), Duration::from_secs(5));

        // `c` is not scripted and fails like an unreachable host
        let requests = ["a", "b", "c", "d"]
            .iter()
            .map(|id| {
                DispatchRequest::get(*id, url(&format!("http://{id}/metrics")), vec![])
            })
            .collect();
        let results = dispatcher.fan_out(requests).await;

        assert_eq!(results.len(), 4);
        assert_eq!(results.iter().filter(|r| r.is_none()).count(), 2);
        assert_eq!(
            results,
            vec![Some(json!([1, 2])), None, None, Some(json!([3]))]
        );
        assert_eq!(transport.calls().len(), 4);
    }

    #[tokio::test]
    async fn test_fan_out_timeout_yields_none() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .reply("http://hung/metrics", Reply::Hang)
                .reply("http://ok/metrics", Reply::Json(json!("ok"))),
        );
        let dispatcher = Dispatcher::new(transport, Duration::from_millis(50));

        let results = dispatcher
            .fan_out(vec![
                DispatchRequest::get("hung", url("http://hung/metrics"), vec![]),
                DispatchRequest::get("ok", url("http://ok/metrics"), vec![]),
            ])
            .await;

        assert_eq!(results, vec![None, Some(json!("ok"))]);
    }

    #[tokio::test]
    async fn test_send_reports_failure() {
        let transport = Arc::new(
            ScriptedTransport::new().reply("http://hung/metrics", Reply::Hang),
        );
        let dispatcher = Dispatcher::new(transport, Duration::from_millis(20));

        let result = dispatcher
            .send(&DispatchRequest::post(
                "hung",
                url("http://hung/metrics"),
                json!(["alice"]),
            ))
            .await;

        assert!(matches!(result, Err(RequestFailure::Timeout { .. })));
    }
}
