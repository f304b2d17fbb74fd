//! Single-request dispatch
//!
//! Sends one request under the retry policy and classifies the response.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use super::RetryPolicy;
use crate::error::{ForgeError, ForgeResult};
use crate::http::{HttpRequest, HttpResponse, Transport, TransportError};
use crate::models::{AuthPolicy, HttpMethod};

/// Per-call additions to a request
///
/// Callers build a fresh value for every call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RequestExtra {
    pub json: Option<Value>,
    pub headers: BTreeMap<String, String>,
}

impl RequestExtra {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn json(mut self, body: Option<Value>) -> Self {
        self.json = body;
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }
}

/// Dispatches requests with auth headers and retry applied
pub struct RequestExecutor {
    transport: Arc<dyn Transport>,
    auth: AuthPolicy,
    retry: RetryPolicy,
}

impl RequestExecutor {
    pub fn new(transport: Arc<dyn Transport>, auth: AuthPolicy) -> Self {
        Self {
            transport,
            auth,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Send one request and return the parsed JSON body
    ///
    /// Connection failures and timeouts are retried; a 404, any other
    /// unexpected status or an unparseable body fails immediately.
    pub async fn send(
        &self,
        url: &str,
        method: HttpMethod,
        params: &Map<String, Value>,
        expected_status: u16,
        extra: RequestExtra,
    ) -> ForgeResult<Value> {
        let mut request = HttpRequest::new(method, url)
            .headers(self.auth.headers.clone())
            .headers(extra.headers);
        request.query = query_pairs(params);
        request.json = extra.json;

        let transport = &self.transport;
        let request = &request;

        let response = self
            .retry
            .run(
                |attempt| async move {
                    if attempt > 1 {
                        debug!("Attempt {} for {} {}", attempt, request.method, request.url);
                    }
                    transport.send(request).await
                },
                TransportError::is_retryable,
            )
            .await
            .map_err(|failure| ForgeError::Network {
                attempts: failure.attempts,
                source: failure.error,
            })?;

        classify(url, expected_status, response)
    }
}

fn classify(url: &str, expected_status: u16, response: HttpResponse) -> ForgeResult<Value> {
    if response.status_code == 404 {
        return Err(ForgeError::NotFound {
            url: url.to_string(),
        });
    }

    if response.status_code != expected_status {
        return Err(ForgeError::StatusMismatch {
            expected: expected_status,
            actual: response.status_code,
            body: response.body,
        });
    }

    serde_json::from_str(&response.body).map_err(|e| ForgeError::Parse(e.to_string()))
}

/// Text form of a parameter value in a URL
pub fn render_param(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Query pairs in declaration order; null values are left out
fn query_pairs(params: &Map<String, Value>) -> Vec<(String, String)> {
    params
        .iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(name, value)| (name.clone(), render_param(value)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::executor::testing::ScriptedTransport;
    use serde_json::json;
    use std::time::Duration;
    use tokio_test::{assert_err, assert_ok};

    fn executor(transport: Arc<ScriptedTransport>) -> RequestExecutor {
        RequestExecutor::new(transport, AuthPolicy::bearer("secret"))
    }

    #[test]
    fn test_render_param() {
        assert_eq!(render_param(&json!("abc")), "abc");
        assert_eq!(render_param(&json!(7)), "7");
        assert_eq!(render_param(&json!(true)), "true");
        assert_eq!(render_param(&Value::Null), "null");
    }

    #[test]
    fn test_query_pairs_skip_null() {
        let mut params = Map::new();
        params.insert("userId".into(), json!(1));
        params.insert("q".into(), Value::Null);
        params.insert("sort".into(), json!("asc"));

        assert_eq!(
            query_pairs(&params),
            vec![
                ("userId".to_string(), "1".to_string()),
                ("sort".to_string(), "asc".to_string())
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_applies_auth_and_query() {
        let transport = Arc::new(ScriptedTransport::always(Ok(HttpResponse::new(
            200,
            r#"[{"id":1}]"#,
        ))));
        let mut params = Map::new();
        params.insert("userId".into(), json!(1));

        let body = executor(transport.clone())
            .send(
                "https://x/posts",
                HttpMethod::Get,
                &params,
                200,
                RequestExtra::new().header("X-Trace", "t1"),
            )
            .await;

        assert_eq!(assert_ok!(body), json!([{"id": 1}]));
        let calls = transport.requests();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].headers.get("Authorization"),
            Some(&"Bearer secret".to_string())
        );
        assert_eq!(calls[0].headers.get("X-Trace"), Some(&"t1".to_string()));
        assert_eq!(calls[0].query, vec![("userId".to_string(), "1".to_string())]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_payload_is_sent_as_json() {
        let transport = Arc::new(ScriptedTransport::always(Ok(HttpResponse::new(
            201,
            r#"{"id":101}"#,
        ))));

        let body = executor(transport.clone())
            .send(
                "https://x/posts",
                HttpMethod::Post,
                &Map::new(),
                201,
                RequestExtra::new().json(Some(json!({"title": "foo"}))),
            )
            .await
            .unwrap();

        assert_eq!(body["id"], json!(101));
        assert_eq!(transport.requests()[0].json, Some(json!({"title": "foo"})));
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_found_is_not_retried() {
        let transport = Arc::new(ScriptedTransport::always(Ok(HttpResponse::new(404, ""))));

        let err = executor(transport.clone())
            .send("https://x/missing", HttpMethod::Get, &Map::new(), 200, RequestExtra::new())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_mismatch_is_not_retried() {
        let transport = Arc::new(ScriptedTransport::always(Ok(HttpResponse::new(
            500,
            "oops",
        ))));

        let err = executor(transport.clone())
            .send("https://x/posts", HttpMethod::Get, &Map::new(), 200, RequestExtra::new())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::StatusMismatch);
        assert_eq!(err.to_string(), "Expected 200, got 500: oops");
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unparseable_body() {
        let transport = Arc::new(ScriptedTransport::always(Ok(HttpResponse::new(
            200,
            "<html>",
        ))));

        let result = executor(transport.clone())
            .send("https://x/posts", HttpMethod::Get, &Map::new(), 200, RequestExtra::new())
            .await;

        let err = assert_err!(result);
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_two_connection_failures() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            Err(TransportError::ConnectionRefused("https://x/posts".into())),
            Err(TransportError::Timeout(30)),
            Ok(HttpResponse::new(200, r#"{"ok":true}"#)),
        ]));

        let body = executor(transport.clone())
            .send("https://x/posts", HttpMethod::Get, &Map::new(), 200, RequestExtra::new())
            .await
            .unwrap();

        assert_eq!(body, json!({"ok": true}));
        assert_eq!(transport.call_count(), 3);
        let instants = transport.instants();
        for pair in instants.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_secs(2));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_persistent_timeout_surfaces_one_network_error() {
        let transport = Arc::new(ScriptedTransport::always(Err(TransportError::Timeout(30))));

        let err = executor(transport.clone())
            .send("https://x/posts", HttpMethod::Get, &Map::new(), 200, RequestExtra::new())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Network);
        assert!(matches!(
            err,
            ForgeError::Network {
                attempts: 3,
                source: TransportError::Timeout(30)
            }
        ));
        assert_eq!(transport.call_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_failure_is_not_retried() {
        let transport = Arc::new(ScriptedTransport::always(Err(
            TransportError::RequestFailed("builder error".into()),
        )));

        let err = executor(transport.clone())
            .send("https://x/posts", HttpMethod::Get, &Map::new(), 200, RequestExtra::new())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Network);
        assert_eq!(transport.call_count(), 1);
    }
}
