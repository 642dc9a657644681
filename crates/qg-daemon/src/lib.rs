//! Scheduled quality gate for pull requests.
//!
//! Each cycle detects units opened since the last checkpoint, runs the test
//! harness against each, posts a report, and for large passing units runs
//! the static analyzer and opens a unit with mechanical fixes.
//!
//! - [`detector`]: incremental discovery of new units
//! - [`orchestrator`]: the per-unit pipeline
//! - [`remediation`]: branch-isolated automated fixes
//! - [`scheduler`]: single-flight cycles on a fixed interval
//! - [`daemon`]: wiring from configuration and graceful shutdown

pub mod comment;
pub mod daemon;
pub mod detector;
pub mod notifier;
pub mod orchestrator;
pub mod remediation;
pub mod scheduler;
