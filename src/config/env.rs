//! Environment variable configuration
//!
//! Provides environment variable overrides for configuration.

use std::env;

/// Environment variable prefix
const ENV_PREFIX: &str = "APIFORGE";

/// Default variable holding the bearer token
pub const DEFAULT_TOKEN_ENV: &str = "APIFORGE_TOKEN";

/// Configuration read from environment variables
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EnvConfig {
    /// Environment name from APIFORGE_ENV
    pub environment: Option<String>,
    /// Pool width from APIFORGE_CONCURRENCY
    pub concurrency: Option<usize>,
    /// Timeout from APIFORGE_TIMEOUT
    pub timeout: Option<u64>,
    /// Config file from APIFORGE_CONFIG
    pub config_file: Option<String>,
    /// Output format from APIFORGE_FORMAT
    pub format: Option<String>,
    /// Verbose from APIFORGE_VERBOSE
    pub verbose: Option<bool>,
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        Self {
            environment: get_env("ENV"),
            concurrency: get_env_parse("CONCURRENCY"),
            timeout: get_env_parse("TIMEOUT"),
            config_file: get_env("CONFIG"),
            format: get_env("FORMAT"),
            verbose: get_env_bool("VERBOSE"),
        }
    }

    /// Check if any environment variables are set
    pub fn has_any(&self) -> bool {
        self.environment.is_some()
            || self.concurrency.is_some()
            || self.timeout.is_some()
            || self.config_file.is_some()
            || self.format.is_some()
            || self.verbose.is_some()
    }

    pub fn environment_or(&self, default: &str) -> String {
        self.environment
            .clone()
            .unwrap_or_else(|| default.to_string())
    }

    pub fn format_or(&self, default: &str) -> String {
        self.format.clone().unwrap_or_else(|| default.to_string())
    }
}

/// Bearer token override held in `var`; empty values count as unset
pub fn bearer_token(var: &str) -> Option<String> {
    env::var(var).ok().filter(|v| !v.is_empty())
}

/// Get environment variable with prefix
fn get_env(name: &str) -> Option<String> {
    env::var(format!("{ENV_PREFIX}_{name}")).ok()
}

/// Get environment variable and parse to type
fn get_env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    get_env(name).and_then(|v| v.parse().ok())
}

/// Get environment variable as boolean
fn get_env_bool(name: &str) -> Option<bool> {
    get_env(name).map(|v| {
        matches!(
            v.to_lowercase().as_str(),
            "1" | "true" | "yes" | "on" | "enabled"
        )
    })
}

/// Builder for setting environment variables (useful for testing)
pub struct EnvBuilder {
    vars: Vec<(String, String)>,
}

impl EnvBuilder {
    pub fn new() -> Self {
        Self { vars: Vec::new() }
    }

    pub fn environment(mut self, env: impl Into<String>) -> Self {
        self.vars.push((format!("{ENV_PREFIX}_ENV"), env.into()));
        self
    }

    pub fn concurrency(mut self, width: usize) -> Self {
        self.vars
            .push((format!("{ENV_PREFIX}_CONCURRENCY"), width.to_string()));
        self
    }

    pub fn timeout(mut self, timeout: u64) -> Self {
        self.vars
            .push((format!("{ENV_PREFIX}_TIMEOUT"), timeout.to_string()));
        self
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.vars.push((format!("{ENV_PREFIX}_FORMAT"), format.into()));
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.vars
            .push((format!("{ENV_PREFIX}_VERBOSE"), verbose.to_string()));
        self
    }

    /// Set an arbitrary variable, such as a token override
    pub fn var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.push((key.into(), value.into()));
        self
    }

    /// Apply environment variables
    pub fn apply(self) {
        for (key, value) in self.vars {
            env::set_var(key, value);
        }
    }

    /// Apply and return guard that restores on drop
    pub fn apply_scoped(self) -> EnvGuard {
        let previous: Vec<_> = self
            .vars
            .iter()
            .map(|(k, _)| (k.clone(), env::var(k).ok()))
            .collect();

        self.apply();

        EnvGuard { previous }
    }
}

impl Default for EnvBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Guard that restores environment variables on drop
pub struct EnvGuard {
    previous: Vec<(String, Option<String>)>,
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in &self.previous {
            match value {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }
    }
}

/// Print the recognised environment variables
pub fn print_env_help() {
    println!("Environment Variables:");
    println!();
    println!("  {ENV_PREFIX}_ENV          Environment name used for server selection");
    println!("  {ENV_PREFIX}_CONCURRENCY  Worker pool width for generated runs");
    println!("  {ENV_PREFIX}_TIMEOUT      Request timeout in seconds");
    println!("  {ENV_PREFIX}_CONFIG       Path to configuration file");
    println!("  {ENV_PREFIX}_FORMAT       Output format (table, json, json-pretty, summary)");
    println!("  {ENV_PREFIX}_VERBOSE      Enable verbose output (true/false)");
    println!("  {DEFAULT_TOKEN_ENV}        Bearer token for contract security schemes");
}
