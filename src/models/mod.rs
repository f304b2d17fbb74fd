//! Data models for contract-driven API testing
//!
//! This module contains the typed structures the compiler produces and the
//! executor consumes.

mod endpoint;
mod expectation;
mod outcome;

pub use endpoint::{AuthPolicy, EndpointTest, HttpMethod, TestDescriptor, TestPlan};
pub use expectation::{ExpectedKey, Expectation, ValueType};
pub use outcome::{Outcome, OutcomeError, OutcomeStatus, RunSummary};
