//! Database models, schema bootstrap and stored value types

pub mod init;
pub mod models;
pub mod sound_order;

pub use init::*;
pub use models::*;
pub use sound_order::*;
