//! Error taxonomy, editor configuration and diagnostics sinks.

pub mod config;
pub mod error;
pub mod log;
