//! apiforge - contract-driven API testing
//!
//! Compiles an OpenAPI 3 contract, or a declarative YAML config, into a
//! [`TestPlan`] and runs it against a live service:
//!
//! - [`spec`]: contract compilation with declarative fallback
//! - [`executor`]: request dispatch under a retry policy, plus sequential
//!   and bounded-concurrency orchestration
//! - [`validator`]: response shape checks
//! - [`report`]: the reporting sink the orchestrator forwards events to
//!
//! ```no_run
//! use std::sync::Arc;
//! use apiforge::{ContractSource, HttpClient, ParallelExecutor, SpecCompiler, TestRunner};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let source = ContractSource::OpenApi("openapi.yaml".into());
//! if let Some(plan) = SpecCompiler::from_env("APIFORGE_TOKEN").compile(&source, "prod")? {
//!     let runner = TestRunner::for_plan(&plan, Arc::new(HttpClient::new()?));
//!     let summary = ParallelExecutor::default()
//!         .run_all_parallel(Arc::new(runner), plan.tests.clone())
//!         .await;
//!     println!("{}", summary.headline());
//! }
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod http;
pub mod models;
pub mod output;
pub mod report;
pub mod spec;
pub mod utils;
pub mod validator;

pub use error::{ErrorKind, ForgeError, ForgeResult};
pub use executor::{ParallelExecutor, RequestExecutor, RequestExtra, RetryPolicy, TestRunner};
pub use http::{HttpClient, Transport};
pub use models::{AuthPolicy, EndpointTest, Expectation, Outcome, RunSummary, TestPlan};
pub use report::{Reporter, TracingReporter};
pub use spec::{ContractSource, SpecCompiler};
