//! Stop and reset operations
//!
//! These run outside the dispatcher. None of them interrupt a pause the
//! dispatcher is already in; a worker mid-command notices its record is gone
//! at the next re-read and abandons it.

use crate::db::{commands, intercoms};
use crate::device::DeviceTrigger;
use crate::error::Result;
use crate::playback::queue::CommandQueue;
use futures::future::join_all;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{info, warn};

/// Summary of a stop or reset operation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StopReport {
    pub devices_attempted: usize,
    pub devices_failed: usize,
    pub commands_deleted: u64,
    pub identifiers_drained: usize,
}

/// Send stop-all to every known intercom, enabled or not
///
/// Queue and catalog are left untouched.
pub async fn stop_signal(db: &SqlitePool, trigger: &dyn DeviceTrigger) -> Result<StopReport> {
    let devices = intercoms::list_intercoms(db).await?;

    let results = join_all(devices.iter().map(|device| async move {
        let result = trigger.stop_all(&device.ip_address).await;
        if let Err(e) = &result {
            warn!(intercom = %device.name, "Failed to stop intercom at {}: {}", device.ip_address, e);
        }
        result
    }))
    .await;

    let devices_failed = results.iter().filter(|r| r.is_err()).count();
    info!(
        "Stop command sent to {} intercoms ({} failed)",
        devices.len(),
        devices_failed
    );

    Ok(StopReport {
        devices_attempted: devices.len(),
        devices_failed,
        ..Default::default()
    })
}

/// Stop every device, delete every pending command and drain the queue
pub async fn full_stop(
    db: &SqlitePool,
    queue: &CommandQueue,
    trigger: &dyn DeviceTrigger,
) -> Result<StopReport> {
    let mut report = stop_signal(db, trigger).await?;
    report.commands_deleted = commands::delete_all_commands(db).await?;
    report.identifiers_drained = queue.drain().len();

    info!(
        "Full stop: {} commands deleted, {} queued identifiers drained",
        report.commands_deleted, report.identifiers_drained
    );
    Ok(report)
}

/// Clear leftover commands before the dispatcher starts
pub async fn startup_reset(db: &SqlitePool, queue: &CommandQueue) -> Result<StopReport> {
    let commands_deleted = commands::delete_all_commands(db).await?;
    let identifiers_drained = queue.drain().len();

    if commands_deleted > 0 {
        info!("Startup reset removed {} stale commands", commands_deleted);
    }

    Ok(StopReport {
        commands_deleted,
        identifiers_drained,
        ..Default::default()
    })
}
