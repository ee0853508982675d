//! HTTP API
//!
//! JSON endpoints for catalog management, command submission, stop
//! operations and dispatcher status.

pub mod handlers;
pub mod server;

pub use server::{create_router, run, AppContext};
