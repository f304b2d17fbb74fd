//! CLI argument parsing
//!
//! Defines command-line interface using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Contract-driven API testing
#[derive(Parser, Debug)]
#[command(name = "apiforge")]
#[command(version)]
#[command(about = "Compile API contracts into HTTP tests and run them")]
#[command(long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (defaults to the first of the standard locations)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a declarative test config sequentially
    Run(RunArgs),

    /// Compile an OpenAPI contract and run the generated tests concurrently
    Generate(GenerateArgs),

    /// Print the compiled test plan without sending requests
    Plan(PlanArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

/// Arguments for run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Declarative test config (YAML or JSON)
    pub file: PathBuf,

    /// Environment name selecting the base URL
    #[arg(short, long)]
    pub env: Option<String>,

    /// Output format (table, json, json-pretty, summary)
    #[arg(short, long)]
    pub format: Option<String>,
}

/// Arguments for generate command
#[derive(Parser, Debug)]
pub struct GenerateArgs {
    /// OpenAPI 3 contract; declarative configs are accepted as a fallback
    pub contract: PathBuf,

    /// Environment name matched against server descriptions
    #[arg(short, long)]
    pub env: Option<String>,

    /// Number of concurrent tests
    #[arg(short, long)]
    pub concurrent: Option<usize>,

    /// Output format (table, json, json-pretty, summary)
    #[arg(short, long)]
    pub format: Option<String>,
}

/// Arguments for plan command
#[derive(Parser, Debug)]
pub struct PlanArgs {
    /// OpenAPI contract or declarative config
    pub source: PathBuf,

    /// Environment name
    #[arg(short, long)]
    pub env: Option<String>,

    /// Output format (json-pretty, json, table)
    #[arg(short, long, default_value = "json-pretty")]
    pub format: String,
}

/// Arguments for config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write an example configuration file
    Init {
        /// Output path
        #[arg(short, long, default_value = "./apiforge.yaml")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the effective configuration
    Show {
        /// Show environment variable overrides instead
        #[arg(long)]
        env: bool,

        /// Output format (yaml, json)
        #[arg(short, long, default_value = "yaml")]
        format: String,
    },

    /// Validate a configuration file
    Validate {
        /// File to validate (defaults to the first standard location)
        file: Option<PathBuf>,
    },
}
