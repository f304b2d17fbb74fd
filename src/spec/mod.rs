//! Contract compilation
//!
//! Turns an OpenAPI document, a declarative config or an in-memory mapping
//! into a [`TestPlan`]. OpenAPI is tried first; a document that is not a
//! usable OpenAPI 3 contract is re-read as a declarative config.

pub mod declarative;
pub mod openapi;
mod resolve;
mod source;

pub use resolve::Resolver;
pub use source::{load_document, parse_document};

use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::env::bearer_token;
use crate::error::{ForgeError, ForgeResult};
use crate::models::TestPlan;

/// Where a contract comes from
#[derive(Clone, Debug, PartialEq)]
pub enum ContractSource {
    /// OpenAPI document on disk, falling back to a declarative config
    OpenApi(PathBuf),
    /// Declarative config on disk
    Declarative(PathBuf),
    /// Already-parsed mapping with no backing file
    Inline(Value),
}

impl ContractSource {
    pub fn path(&self) -> Option<&Path> {
        match self {
            ContractSource::OpenApi(path) | ContractSource::Declarative(path) => Some(path.as_path()),
            ContractSource::Inline(_) => None,
        }
    }
}

/// Builds test plans from contract sources
#[derive(Clone, Debug, Default)]
pub struct SpecCompiler {
    bearer_token: Option<String>,
}

impl SpecCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiler whose bearer override is read from `token_var`
    pub fn from_env(token_var: &str) -> Self {
        Self::new().with_bearer_token(bearer_token(token_var))
    }

    /// Override the bearer token used for OpenAPI security schemes
    pub fn with_bearer_token(mut self, token: Option<String>) -> Self {
        self.bearer_token = token;
        self
    }

    /// Compile `source` for `environment`
    ///
    /// `Ok(None)` is the empty result: an empty declarative config, or an
    /// inline mapping that is not a usable OpenAPI document.
    pub fn compile(
        &self,
        source: &ContractSource,
        environment: &str,
    ) -> ForgeResult<Option<TestPlan>> {
        let plan = match source {
            ContractSource::OpenApi(path) => {
                let document = load_document(path)?;
                match self.compile_openapi(&document, environment) {
                    Ok(plan) => Some(plan),
                    Err(e) => {
                        warn!(
                            "{} is not a usable OpenAPI contract ({}), reading it as a declarative config",
                            path.display(),
                            e
                        );
                        declarative::compile(document, environment)?
                    }
                }
            }
            ContractSource::Declarative(path) => {
                declarative::compile(load_document(path)?, environment)?
            }
            ContractSource::Inline(document) => {
                if !document.is_object() {
                    return Err(ForgeError::invalid("contract document is not a mapping"));
                }
                match self.compile_openapi(document, environment) {
                    Ok(plan) => Some(plan),
                    Err(e) => {
                        debug!("Inline contract not compiled: {}", e);
                        None
                    }
                }
            }
        };

        match &plan {
            Some(plan) => info!(
                "Compiled {} tests for environment '{}' against '{}'",
                plan.len(),
                environment,
                plan.base_url
            ),
            None => info!("Contract produced no test plan"),
        }

        Ok(plan)
    }

    fn compile_openapi(&self, document: &Value, environment: &str) -> ForgeResult<TestPlan> {
        openapi::compile(document, environment, self.bearer_token.as_deref())
    }
}
