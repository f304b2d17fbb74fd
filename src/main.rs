//! apiforge - contract-driven API testing
//!
//! ## Usage
//!
//! ```bash
//! # Run a declarative config against the staging base URL
//! apiforge run configs/api_config.yaml --env staging
//!
//! # Compile an OpenAPI contract and run the generated tests, 4 at a time
//! apiforge generate openapi.yaml --concurrent 4 --format summary
//!
//! # Inspect the compiled plan without sending requests
//! apiforge plan openapi.yaml --env prod
//!
//! # Write a starter configuration file
//! apiforge config init
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use apiforge::cli::{self, Args};
use apiforge::config::{self, AppConfig, ConfigFile, EnvConfig};
use apiforge::output::{OutputFormat, ResultFormatter};
use apiforge::utils::{init_logger, LogLevel};
use apiforge::{
    ContractSource, HttpClient, ParallelExecutor, RunSummary, SpecCompiler, TestPlan, TestRunner,
    TracingReporter,
};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let env = EnvConfig::load();

    let verbose = args.verbose || env.verbose.unwrap_or(false);
    init_logger(LogLevel::from_verbose(verbose));

    let passed = match args.command {
        cli::Command::Run(run_args) => {
            let settings = load_settings(args.config.as_deref(), &env)?;
            run_config(run_args, &settings, &env, verbose).await?
        }
        cli::Command::Generate(generate_args) => {
            let settings = load_settings(args.config.as_deref(), &env)?;
            run_generated(generate_args, &settings, &env, verbose).await?
        }
        cli::Command::Plan(plan_args) => {
            let settings = load_settings(args.config.as_deref(), &env)?;
            show_plan(plan_args, &settings)?;
            true
        }
        cli::Command::Config(config_args) => {
            manage_config(config_args, args.config.as_deref(), &env)?;
            true
        }
    };

    if !passed {
        std::process::exit(1);
    }

    Ok(())
}

/// Settings with precedence: config file, then environment overrides
fn load_settings(explicit: Option<&Path>, env: &EnvConfig) -> Result<AppConfig> {
    let path = explicit
        .map(Path::to_path_buf)
        .or_else(|| env.config_file.as_ref().map(PathBuf::from));

    let file = match path {
        Some(path) => ConfigFile::load(&path)?,
        None => ConfigFile::load_default()?,
    };

    let mut settings = file.app;
    settings.apply_env(env);
    debug!("Effective settings: {:?}", settings);
    Ok(settings)
}

fn output_format(flag: Option<String>, env: &EnvConfig) -> Result<OutputFormat> {
    let name = flag.unwrap_or_else(|| env.format_or("table"));
    OutputFormat::from_str(&name).ok_or_else(|| {
        anyhow::anyhow!("Unknown output format: {name} (expected table, json, json-pretty, summary)")
    })
}

fn compile(source: ContractSource, environment: &str, settings: &AppConfig) -> Result<Option<TestPlan>> {
    let compiler = SpecCompiler::from_env(&settings.token_env);
    let described = source
        .path()
        .map(|p| p.display().to_string())
        .unwrap_or_default();

    compiler
        .compile(&source, environment)
        .with_context(|| format!("Failed to compile {described}"))
}

fn build_runner(plan: &TestPlan, settings: &AppConfig, verbose: bool) -> Result<TestRunner> {
    let transport = Arc::new(HttpClient::with_timeout(settings.timeout_secs)?);
    let reporter = if verbose {
        TracingReporter::new().with_bodies()
    } else {
        TracingReporter::new()
    };

    Ok(TestRunner::for_plan(plan, transport)
        .with_retry(settings.retry_policy())
        .with_reporter(Arc::new(reporter)))
}

fn print_summary(summary: &RunSummary, format: OutputFormat) {
    println!("{}", ResultFormatter::new(format).format_summary(summary));
}

async fn run_config(
    args: cli::RunArgs,
    settings: &AppConfig,
    env: &EnvConfig,
    verbose: bool,
) -> Result<bool> {
    let format = output_format(args.format, env)?;
    let environment = args
        .env
        .unwrap_or_else(|| settings.default_environment.clone());

    let Some(plan) = compile(ContractSource::Declarative(args.file), &environment, settings)? else {
        println!("No tests to run: the config is empty");
        return Ok(true);
    };

    info!("Running {} tests from config ({})", plan.len(), environment);
    let runner = build_runner(&plan, settings, verbose)?;
    let summary = runner.run_all(&plan.tests).await;

    print_summary(&summary, format);
    Ok(summary.is_all_passed())
}

async fn run_generated(
    args: cli::GenerateArgs,
    settings: &AppConfig,
    env: &EnvConfig,
    verbose: bool,
) -> Result<bool> {
    let format = output_format(args.format, env)?;
    let environment = args
        .env
        .unwrap_or_else(|| settings.default_environment.clone());
    let concurrent = args.concurrent.unwrap_or(settings.max_concurrent);

    let Some(plan) = compile(ContractSource::OpenApi(args.contract), &environment, settings)? else {
        println!("No tests generated: the contract is empty");
        return Ok(true);
    };

    info!(
        "Generated {} tests against {} ({} concurrent)",
        plan.len(),
        plan.base_url,
        concurrent
    );
    let runner = Arc::new(build_runner(&plan, settings, verbose)?);
    let summary = ParallelExecutor::new(concurrent)
        .run_all_parallel(runner, plan.tests.clone())
        .await;

    print_summary(&summary, format);
    Ok(summary.is_all_passed())
}

fn show_plan(args: cli::PlanArgs, settings: &AppConfig) -> Result<()> {
    let format = OutputFormat::from_str(&args.format)
        .ok_or_else(|| anyhow::anyhow!("Unknown output format: {}", args.format))?;
    let environment = args
        .env
        .unwrap_or_else(|| settings.default_environment.clone());

    match compile(ContractSource::OpenApi(args.source), &environment, settings)? {
        Some(plan) => println!("{}", ResultFormatter::new(format).format_plan(&plan)),
        None => println!("No tests: the source is empty"),
    }
    Ok(())
}

fn manage_config(args: cli::ConfigArgs, explicit: Option<&Path>, env: &EnvConfig) -> Result<()> {
    match args.action {
        cli::ConfigAction::Init { output, force } => {
            if output.exists() && !force {
                anyhow::bail!(
                    "Configuration file already exists: {}. Use --force to overwrite.",
                    output.display()
                );
            }

            ConfigFile::example().save(&output)?;
            println!("✓ Configuration file created: {}", output.display());
            println!("\nEdit the file to customize your settings.");
        }

        cli::ConfigAction::Show { env: show_env, format } => {
            if show_env {
                println!("{env:#?}");
                println!();
                config::env::print_env_help();
            } else {
                let file = ConfigFile {
                    app: load_settings(explicit, env)?,
                    ..ConfigFile::default()
                };
                let path = if format == "json" { "config.json" } else { "config.yaml" };
                println!("{}", file.render(path)?);
            }
        }

        cli::ConfigAction::Validate { file } => {
            let path = file
                .or_else(|| explicit.map(Path::to_path_buf))
                .or_else(ConfigFile::find)
                .ok_or_else(|| anyhow::anyhow!("No configuration file found"))?;

            match ConfigFile::load(&path) {
                Ok(_) => println!("✓ Configuration file is valid: {}", path.display()),
                Err(e) => {
                    println!("✗ Configuration file is invalid: {}", path.display());
                    println!("  Error: {e}");
                    return Err(e);
                }
            }
        }
    }

    Ok(())
}
