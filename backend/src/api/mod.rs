//! HTTP API module.
//!
//! This module provides the HTTP server, response types and the SSE log
//! stream for the ridefare backend.

pub mod server;
pub mod types;
pub mod logs;

pub use server::start_server;
pub use types::*;
pub use logs::*;
