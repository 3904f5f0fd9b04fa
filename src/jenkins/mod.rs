//! Jenkins REST API access: job discovery and config retrieval.

pub mod client;
pub mod scanner;
pub mod types;

pub use client::JenkinsClient;
pub use scanner::JenkinsScanner;
