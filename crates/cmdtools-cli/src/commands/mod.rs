//! CLI command implementations
//!
//! Each subcommand has its own module with a `run` function.

pub mod check;
pub mod instances;
pub mod status;
pub mod submit;
pub mod upload;
