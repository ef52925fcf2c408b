//! Conformance testing harness for strbridge.
//!
//! This crate provides:
//! - Fixture capture: record the reference conversion results as JSON fixtures
//! - Fixture execution: run fixture cases against the core kernels in a given mode
//! - Verification: compare results against fixtures and render reports
//! - Structured logging: JSONL run logs plus a SHA-256 artifact index

#![forbid(unsafe_code)]

pub mod capture;
pub mod diff;
pub mod error;
pub mod execute;
pub mod fixtures;
pub mod report;
pub mod runner;
pub mod structured_log;
pub mod verify;

pub use error::HarnessError;
pub use fixtures::{FixtureCase, FixtureSet};
pub use runner::TestRunner;
pub use verify::{VerificationResult, VerificationSummary};
