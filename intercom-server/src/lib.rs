//! # Intercom playback server
//!
//! Remote-triggers sound playback on networked intercoms. Producers submit
//! commands over HTTP; one dispatcher task plays them in order, pacing
//! itself against each sound's duration.

pub mod api;
pub mod config;
pub mod db;
pub mod device;
pub mod error;
pub mod playback;
pub mod state;

pub use error::{Error, Result};
pub use state::SharedState;
