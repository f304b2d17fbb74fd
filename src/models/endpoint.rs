//! Endpoint test models
//!
//! Defines the compiled test plan and its entries.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::Expectation;
use crate::error::ForgeError;

/// Supported HTTP verbs
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
        }
    }

    pub fn all() -> Vec<HttpMethod> {
        vec![
            HttpMethod::Get,
            HttpMethod::Post,
            HttpMethod::Put,
            HttpMethod::Delete,
            HttpMethod::Patch,
        ]
    }
}

impl FromStr for HttpMethod {
    type Err = ForgeError;

    /// Case-insensitive; anything outside the supported set is an
    /// `InvalidArgument`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            "PATCH" => Ok(HttpMethod::Patch),
            _ => Err(ForgeError::InvalidArgument(format!(
                "Invalid HTTP method passed. Received {s} but accepted HTTP methods are {}",
                HttpMethod::all()
                    .iter()
                    .map(HttpMethod::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            ))),
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_status() -> u16 {
    200
}

/// One executable HTTP test case
///
/// `method` is kept as authored so that a declarative config naming an
/// unsupported verb still compiles; the verb is checked at dispatch time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EndpointTest {
    pub method: String,
    pub path: String,
    #[serde(default)]
    pub params: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(default = "default_status")]
    pub expected_status: u16,
    #[serde(default)]
    pub expected_keys: Expectation,
}

impl EndpointTest {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            params: Map::new(),
            payload: None,
            expected_status: default_status(),
            expected_keys: Expectation::default(),
        }
    }

    pub fn param(mut self, name: impl Into<String>, value: Value) -> Self {
        self.params.insert(name.into(), value);
        self
    }

    pub fn payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn expect_status(mut self, status: u16) -> Self {
        self.expected_status = status;
        self
    }

    pub fn expect_keys(mut self, expectation: Expectation) -> Self {
        self.expected_keys = expectation;
        self
    }

    /// Descriptor handed to reporting sinks
    pub fn descriptor(&self) -> TestDescriptor {
        TestDescriptor {
            method: self.method.clone(),
            endpoint: self.path.clone(),
            params: self.params.clone(),
        }
    }
}

impl fmt::Display for EndpointTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method.to_uppercase(), self.path)
    }
}

/// Identifies a test in reports and outcomes
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TestDescriptor {
    pub method: String,
    pub endpoint: String,
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl fmt::Display for TestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method.to_uppercase(), self.endpoint)
    }
}

/// Headers applied to every outgoing request of a run
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthPolicy {
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl AuthPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bearer(token: impl AsRef<str>) -> Self {
        Self::new().header("Authorization", format!("Bearer {}", token.as_ref()))
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }
}

/// Ordered, immutable set of tests for one run
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TestPlan {
    pub base_url: String,
    #[serde(default)]
    pub auth: AuthPolicy,
    pub tests: Vec<EndpointTest>,
}

impl TestPlan {
    pub fn new(base_url: impl Into<String>, auth: AuthPolicy, tests: Vec<EndpointTest>) -> Self {
        Self {
            base_url: base_url.into(),
            auth,
            tests,
        }
    }

    pub fn len(&self) -> usize {
        self.tests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_method_parsing() {
        assert_eq!("get".parse::<HttpMethod>().unwrap(), HttpMethod::Get);
        assert_eq!("Patch".parse::<HttpMethod>().unwrap(), HttpMethod::Patch);

        let err = "TRACE".parse::<HttpMethod>().unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidArgument);
        assert!(err.to_string().contains("TRACE"));
    }

    #[test]
    fn test_endpoint_defaults_from_yaml() {
        let test: EndpointTest = serde_yaml::from_str("method: GET\npath: posts\n").unwrap();
        assert_eq!(test.expected_status, 200);
        assert!(test.params.is_empty());
        assert!(test.payload.is_none());
        assert!(test.expected_keys.is_empty());
    }

    #[test]
    fn test_endpoint_builder() {
        let test = EndpointTest::new("POST", "posts")
            .payload(json!({"title": "foo"}))
            .expect_status(201);

        assert_eq!(test.to_string(), "POST posts");
        assert_eq!(test.expected_status, 201);
        assert_eq!(test.descriptor().endpoint, "posts");
    }

    #[test]
    fn test_bearer_policy() {
        let auth = AuthPolicy::bearer("abc");
        assert_eq!(
            auth.headers.get("Authorization"),
            Some(&"Bearer abc".to_string())
        );
        assert!(AuthPolicy::new().is_empty());
    }
}
