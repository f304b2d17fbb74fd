//! Configuration module
//!
//! Handles loading and managing configuration.

pub mod env;
pub mod file;

pub use env::{EnvBuilder, EnvConfig, EnvGuard};
pub use file::ConfigFile;

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::executor::RetryPolicy;

/// Application configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP timeout in seconds
    pub timeout_secs: u64,

    /// Worker pool width for generated runs
    pub max_concurrent: usize,

    /// Retry policy for connection failures and timeouts
    pub retry: RetrySettings,

    /// Environment used when none is given on the command line
    pub default_environment: String,

    /// Variable holding the bearer token override
    pub token_env: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_concurrent: 10,
            retry: RetrySettings::default(),
            default_environment: "prod".to_string(),
            token_env: "APIFORGE_TOKEN".to_string(),
        }
    }
}

impl AppConfig {
    /// Fold environment overrides into this configuration
    pub fn apply_env(&mut self, env: &EnvConfig) {
        if let Some(timeout) = env.timeout {
            self.timeout_secs = timeout;
        }
        if let Some(concurrency) = env.concurrency {
            self.max_concurrent = concurrency;
        }
        if let Some(environment) = &env.environment {
            self.default_environment = environment.clone();
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry.to_policy()
    }
}

/// Retry settings as written in a config file
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub delay_secs: u64,
    pub deadline_secs: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay_secs: 2,
            deadline_secs: 15,
        }
    }
}

impl RetrySettings {
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy::new()
            .max_attempts(self.max_attempts)
            .delay(Duration::from_secs(self.delay_secs))
            .deadline(Duration::from_secs(self.deadline_secs))
    }
}
