//! Timestamp utilities

use chrono::Utc;
use std::time::Duration;

/// Current time as whole unix seconds
pub fn unix_seconds() -> i64 {
    Utc::now().timestamp()
}

/// Unix second at which devices should begin playback, `look_ahead` from now
///
/// Sub-second parts of `look_ahead` are truncated, matching the whole-second
/// resolution of the device `start_time` parameter.
pub fn start_time_after(look_ahead: Duration) -> i64 {
    unix_seconds().saturating_add(look_ahead.as_secs() as i64)
}

/// Convert milliseconds to duration, treating negative values as zero
pub fn millis_to_duration(millis: i64) -> Duration {
    Duration::from_millis(millis.max(0) as u64)
}
