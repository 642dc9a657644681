pub mod github;
pub mod tracker;
pub mod types;

pub use tracker::{TrackerError, UnitTracker};
