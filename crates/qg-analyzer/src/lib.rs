//! Heuristic static analysis over a unit's source tree.
//!
//! The analyzer does not parse programs. Each scanner applies a bounded,
//! independent textual heuristic and reports [`Suggestion`]s; the one
//! scanner that needs real lint data delegates to the configured linter.
//!
//! [`Suggestion`]: qg_core::types::Suggestion

pub mod analyzer;
pub mod description;
pub mod scanners;

pub use analyzer::{ScanError, Scanner, SourceFile, StaticAnalyzer};
