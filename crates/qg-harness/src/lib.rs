//! Ordered build/test/lint harness for a single change unit.
//!
//! - [`harness`]: runs the configured checks against the unit's checkout.
//! - [`lint_output`]: decides whether a non-zero lint exit reported errors.
//! - [`report`]: the JSON artifact written after every run.
//! - [`shutdown`]: cooperative shutdown and in-flight drain tracking.

pub mod harness;
pub mod lint_output;
pub mod report;
pub mod shutdown;

pub use harness::{HarnessOutcome, TestHarness};
