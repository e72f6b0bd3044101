//! Logging initialization shared by the binaries of this workspace.
//!
//! Standard output is left untouched: every log line goes to standard error
//! so that a binary's result can be piped or parsed by callers.
pub mod config;
pub mod tracing;

pub use config::Config;
