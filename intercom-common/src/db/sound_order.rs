//! Ordered sound list stored on announcements
//!
//! The catalog stores an announcement's playback order as a comma-delimited
//! string of sound identifiers (`"3,1,2"`). [`SoundOrder`] is the typed form
//! used everywhere above the storage boundary. Order is significant and
//! duplicates are preserved.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Malformed stored sound order
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SoundOrderError {
    /// An element between delimiters was blank (e.g. `"1,,2"`)
    #[error("empty entry at position {position}")]
    EmptyEntry { position: usize },

    /// An element was not an integer identifier
    #[error("entry {entry:?} at position {position} is not a sound id")]
    InvalidEntry { position: usize, entry: String },
}

/// Playback-ordered list of sound identifiers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SoundOrder(Vec<i64>);

impl SoundOrder {
    pub fn new(ids: Vec<i64>) -> Self {
        Self(ids)
    }

    pub fn ids(&self) -> &[i64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = i64> + '_ {
        self.0.iter().copied()
    }
}

impl FromStr for SoundOrder {
    type Err = SoundOrderError;

    /// Parse the stored form
    ///
    /// A blank string is an empty order. Surrounding whitespace on each entry
    /// is ignored; any blank or non-integer entry fails the whole parse rather
    /// than yielding a shorter list.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Ok(Self::default());
        }

        s.split(',')
            .enumerate()
            .map(|(position, raw)| {
                let entry = raw.trim();
                if entry.is_empty() {
                    return Err(SoundOrderError::EmptyEntry { position });
                }
                entry.parse::<i64>().map_err(|_| SoundOrderError::InvalidEntry {
                    position,
                    entry: entry.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

impl fmt::Display for SoundOrder {
    /// Render the stored comma-delimited form
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, id) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", id)?;
        }
        Ok(())
    }
}

impl From<Vec<i64>> for SoundOrder {
    fn from(ids: Vec<i64>) -> Self {
        Self(ids)
    }
}
