//! Declarative test configuration
//!
//! ```yaml
//! base_url: https://jsonplaceholder.typicode.com
//! environments:
//!   staging: https://staging.example.com
//! auth:
//!   headers:
//!     Authorization: Bearer dummy_token
//! endpoints:
//!   - method: GET
//!     path: posts
//!     expected_status: 200
//! ```

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::{ForgeError, ForgeResult};
use crate::models::{AuthPolicy, EndpointTest, TestPlan};

#[derive(Debug, Deserialize)]
struct DeclarativeConfig {
    #[serde(default)]
    base_url: String,
    #[serde(default)]
    environments: BTreeMap<String, String>,
    /// Misspelled key accepted from older configs; `environments` wins on
    /// a name present in both
    #[serde(default, rename = "enviroments")]
    legacy_environments: BTreeMap<String, String>,
    #[serde(default)]
    auth: AuthPolicy,
    #[serde(default)]
    endpoints: Vec<EndpointTest>,
}

/// Compile a declarative config; an empty document yields `None`
pub fn compile(document: Value, environment: &str) -> ForgeResult<Option<TestPlan>> {
    match &document {
        Value::Null => return Ok(None),
        Value::Object(map) if map.is_empty() => return Ok(None),
        Value::Object(_) => {}
        _ => return Err(ForgeError::invalid("declarative config is not a mapping")),
    }

    let config: DeclarativeConfig = serde_json::from_value(document)
        .map_err(|e| ForgeError::invalid(format!("invalid declarative config: {e}")))?;

    let base_url = config
        .environments
        .get(environment)
        .or_else(|| config.legacy_environments.get(environment))
        .cloned()
        .unwrap_or(config.base_url);

    Ok(Some(TestPlan::new(base_url, config.auth, config.endpoints)))
}
