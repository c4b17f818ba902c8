//! CMD Tools Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared plumbing for the CMD dataset loading tools.
//!
//! - **Logging**: `tracing` subscriber setup driven by environment or a builder

pub mod logging;

pub use logging::{init_logging, LogConfig, LogFormat, LogLevel};
