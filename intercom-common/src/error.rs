//! Errors raised by the shared catalog layer

use thiserror::Error;

use crate::db::sound_order::SoundOrderError;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures from opening the catalog, reading rows, or validating a command
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Creating the database directory failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored announcement order did not parse
    #[error("Invalid sound order: {0}")]
    SoundOrder(#[from] SoundOrderError),

    /// Command spec rejected by producer validation
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
