//! Test execution engine
//!
//! Provides request dispatch with retry, and sequential and parallel test
//! execution over a compiled plan.

mod parallel;
mod request;
mod retry;
mod runner;

pub use parallel::ParallelExecutor;
pub use request::{render_param, RequestExecutor, RequestExtra};
pub use retry::{RetryFailure, RetryPolicy};
pub use runner::{format_path, join_url, TestRunner};
