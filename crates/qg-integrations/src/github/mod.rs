pub mod client;
pub mod issues;
pub mod pull_requests;

mod tracker;
