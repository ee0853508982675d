//! Catalog row models
//!
//! Each struct maps one table row. Identifiers are SQLite integer keys; the
//! command identifier is also sent to devices verbatim.

use serde::{Deserialize, Serialize};

use super::sound_order::{SoundOrder, SoundOrderError};
use crate::{Error, Result};

/// Networked intercom device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Intercom {
    pub id: i64,
    pub name: String,
    pub ip_address: String,
    pub volume_modifier: i64,
    pub disabled: bool,
}

/// Named set of intercoms (membership lives in `group_membership`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct IntercomGroup {
    pub id: i64,
    pub name: String,
}

/// Sound file already present on the devices
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Sound {
    pub id: i64,
    pub name: String,
    /// Device-side file token (file name without extension)
    pub filename: String,
    pub play_duration_ms: i64,
    pub volume_modifier: i64,
}

/// Ordered sequence of sounds played as one unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Announcement {
    pub id: i64,
    pub name: String,
    pub volume_modifier: i64,
    /// Stored comma-delimited form; use [`Announcement::order`]
    pub sound_order: String,
}

impl Announcement {
    /// Parse the stored sound order
    pub fn order(&self) -> std::result::Result<SoundOrder, SoundOrderError> {
        self.sound_order.parse()
    }
}

/// Which devices a command plays on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetSelector {
    Device(i64),
    Group(i64),
}

/// What a command plays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentSelector {
    Sound(i64),
    Announcement(i64),
}

/// Attributes shared by queued commands and saved command templates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CommandSpec {
    #[serde(default)]
    pub intercom_id: Option<i64>,
    #[serde(default)]
    pub intercom_group_id: Option<i64>,
    #[serde(default)]
    pub announcement_id: Option<i64>,
    #[serde(default)]
    pub sound_id: Option<i64>,
    #[serde(default = "default_command_volume")]
    pub volume_modifier: i64,
    #[serde(default = "default_times_to_play")]
    pub times_to_play: i64,
    #[serde(default)]
    pub loop_forever: bool,
}

fn default_command_volume() -> i64 {
    50
}

fn default_times_to_play() -> i64 {
    1
}

impl CommandSpec {
    /// Target selector; a single device takes precedence over a group
    pub fn target(&self) -> Option<TargetSelector> {
        match (self.intercom_id, self.intercom_group_id) {
            (Some(id), _) => Some(TargetSelector::Device(id)),
            (None, Some(id)) => Some(TargetSelector::Group(id)),
            (None, None) => None,
        }
    }

    /// Content selector; a single sound takes precedence over an announcement
    pub fn content(&self) -> Option<ContentSelector> {
        match (self.sound_id, self.announcement_id) {
            (Some(id), _) => Some(ContentSelector::Sound(id)),
            (None, Some(id)) => Some(ContentSelector::Announcement(id)),
            (None, None) => None,
        }
    }

    /// Check producer-side invariants before a command is stored
    ///
    /// Exactly one target selector, exactly one content selector and at least
    /// one play.
    pub fn validate(&self) -> Result<()> {
        match (self.intercom_id, self.intercom_group_id) {
            (Some(_), Some(_)) => {
                return Err(Error::InvalidInput(
                    "command targets both an intercom and a group".to_string(),
                ))
            }
            (None, None) => {
                return Err(Error::InvalidInput(
                    "command needs an intercom or a group".to_string(),
                ))
            }
            _ => {}
        }
        match (self.sound_id, self.announcement_id) {
            (Some(_), Some(_)) => {
                return Err(Error::InvalidInput(
                    "command plays both a sound and an announcement".to_string(),
                ))
            }
            (None, None) => {
                return Err(Error::InvalidInput(
                    "command needs a sound or an announcement".to_string(),
                ))
            }
            _ => {}
        }
        if self.times_to_play < 1 {
            return Err(Error::InvalidInput(format!(
                "times_to_play must be at least 1 (got {})",
                self.times_to_play
            )));
        }
        Ok(())
    }
}

/// Pending playback command (`announcement_command` table)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PlaybackCommand {
    pub id: i64,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub spec: CommandSpec,
}

/// Reusable command template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SavedCommand {
    pub id: i64,
    pub name: String,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub spec: CommandSpec,
}

/// Named, ordered collection of saved commands triggered together
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SavedCommandSet {
    pub id: i64,
    pub name: String,
}
