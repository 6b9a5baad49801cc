pub mod client;
pub mod collector;
pub mod config;
pub mod diagnostics;
pub mod limiter;
pub mod stats;
pub mod worker;
