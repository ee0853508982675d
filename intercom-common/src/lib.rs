//! # Intercom Common Library
//!
//! Shared code for the intercom playback server including:
//! - Catalog row models (devices, groups, sounds, announcements, commands)
//! - Database bootstrap and schema creation
//! - The ordered sound list stored on announcements
//! - Configuration file resolution
//! - Time helpers for device start times

pub mod config;
pub mod db;
pub mod error;
pub mod time;

pub use db::sound_order::{SoundOrder, SoundOrderError};
pub use error::{Error, Result};
