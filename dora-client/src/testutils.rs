use crate::errors::RequestFailure;
use crate::transport::Transport;
use async_trait::async_trait;
use http::StatusCode;
use registry::{ServiceCategory, ServiceConfig, StaticRegistry};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use url::Url;

/// What the scripted transport answers for a URL.
#[derive(Clone)]
pub enum Reply {
    Json(Value),
    /// Answers after the given delay
    Delayed(Duration, Value),
    Status(StatusCode),
    /// Never answers
    Hang,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RecordedCall {
    pub method: &'static str,
    /// Full URL including any literal query string
    pub url: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

/// In-memory transport answering from a script keyed by URL path.
///
/// Unknown URLs fail like an unreachable host.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: HashMap<String, Reply>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the reply for `url`, matched without its query string.
    pub fn reply(mut self, url: &str, reply: Reply) -> Self {
        self.replies.insert(url.to_string(), reply);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    async fn answer(&self, call: RecordedCall, url: &Url) -> Result<Value, RequestFailure> {
        self.calls.lock().unwrap().push(call);

        let mut key = url.clone();
        key.set_query(None);

        match self.replies.get(key.as_str()).cloned() {
            Some(Reply::Json(body)) => Ok(body),
            Some(Reply::Delayed(delay, body)) => {
                tokio::time::sleep(delay).await;
                Ok(body)
            }
            Some(Reply::Status(status)) => Err(RequestFailure::Status {
                url: url.to_string(),
                status,
            }),
            Some(Reply::Hang) => std::future::pending().await,
            None => Err(RequestFailure::Network {
                url: url.to_string(),
                reason: "connection refused".to_string(),
            }),
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, url: &Url, query: &[(String, String)]) -> Result<Value, RequestFailure> {
        let call = RecordedCall {
            method: "GET",
            url: url.to_string(),
            query: query.to_vec(),
            body: None,
        };
        self.answer(call, url).await
    }

    async fn post(&self, url: &Url, body: &Value) -> Result<Value, RequestFailure> {
        let call = RecordedCall {
            method: "POST",
            url: url.to_string(),
            query: Vec::new(),
            body: Some(body.clone()),
        };
        self.answer(call, url).await
    }
}

/// Registry with the given `(id, base url)` services per category.
pub fn test_registry(services: &[(ServiceCategory, &[(&str, &str)])]) -> StaticRegistry {
    StaticRegistry::new(
        services
            .iter()
            .map(|(category, entries)| {
                let configs = entries
                    .iter()
                    .map(|(id, url)| ServiceConfig {
                        id: id.to_string(),
                        url: Url::parse(url).unwrap(),
                    })
                    .collect();
                (*category, configs)
            })
            .collect(),
    )
}

/// Looks up a query parameter in a recorded call.
pub fn query_value<'a>(call: &'a RecordedCall, key: &str) -> Option<&'a str> {
    call.query
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}
