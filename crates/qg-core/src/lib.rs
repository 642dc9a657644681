pub mod checkpoint;
pub mod config;
pub mod error;
pub mod fakes;
pub mod git;
pub mod process;
pub mod schedule;
pub mod types;
