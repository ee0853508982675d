//! Volume resolution
//!
//! Effective device volume is the sum of every applicable modifier, clamped
//! once at the end.

/// Quietest level ever sent to a device
pub const MIN_VOLUME: i64 = 5;

/// Loudest level ever sent to a device
pub const MAX_VOLUME: i64 = 100;

/// Modifiers contributing to one device trigger
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VolumeModifiers {
    pub command: i64,
    pub device: i64,
    pub sound: i64,
    /// Present only for sounds played as part of an announcement
    pub announcement: Option<i64>,
}

impl VolumeModifiers {
    pub fn resolve(&self) -> i64 {
        let mut total = self
            .command
            .saturating_add(self.device)
            .saturating_add(self.sound);
        if let Some(announcement) = self.announcement {
            total = total.saturating_add(announcement);
        }
        total.clamp(MIN_VOLUME, MAX_VOLUME)
    }
}

/// Resolve command, device and sound modifiers into a device volume
pub fn resolve_volume(command: i64, device: i64, sound: i64) -> i64 {
    VolumeModifiers {
        command,
        device,
        sound,
        announcement: None,
    }
    .resolve()
}
