//! Logging and span helpers shared by the qgate crates.
//!
//! - **Logging**: human-readable or JSON output via `tracing-subscriber`,
//!   filtered by `RUST_LOG` with a configurable fallback level.
//! - **Spans**: named spans for scheduler cycles and per-unit processing so
//!   every log line carries the cycle and unit it belongs to.

pub mod logging;
pub mod spans;
