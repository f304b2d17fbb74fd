//! Contract document loading

use serde_json::Value;
use std::path::Path;
use tracing::debug;

use crate::error::{ForgeError, ForgeResult};

/// Load a YAML or JSON document into a generic value
///
/// An empty file loads as `Value::Null`.
pub fn load_document(path: &Path) -> ForgeResult<Value> {
    let content = std::fs::read_to_string(path).map_err(|e| ForgeError::SpecLoad {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    debug!("Loaded {} bytes from {}", content.len(), path.display());
    parse_document(&content).map_err(|reason| ForgeError::SpecLoad {
        path: path.display().to_string(),
        reason,
    })
}

/// Parse document text; YAML is a superset of JSON so one parser covers both
pub fn parse_document(content: &str) -> Result<Value, String> {
    if content.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_yaml::from_str(content).map_err(|e| e.to_string())
}
