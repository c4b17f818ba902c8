//! API plumbing
//!
//! Transport, endpoint URLs, wire types and pagination shared by the
//! pipeline components.

pub mod endpoints;
pub mod pagination;
pub mod transport;
pub mod types;

pub use transport::{Response, RetryPolicy, Transport, TOKEN_HEADER};
pub use types::*;
