//! Shared dispatcher state
//!
//! The dispatcher publishes what it is doing; HTTP handlers read it.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

/// Stage of the in-flight command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchPhase {
    Resolving,
    Dispatching,
    Paused,
    Finalizing,
}

/// Command currently held by the dispatcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentDispatch {
    pub command_id: i64,
    pub phase: DispatchPhase,
    /// 1-based repeat number
    pub repeat: i64,
    pub times_to_play: i64,
    /// 0-based position in the content sequence
    pub sound_index: usize,
    pub sound_count: usize,
}

/// Shared state accessible by the dispatcher and API handlers
pub struct SharedState {
    /// In-flight command (None while waiting on the queue)
    pub current_dispatch: RwLock<Option<CurrentDispatch>>,

    /// Commands that ran to finalization since startup
    pub commands_completed: AtomicU64,
}

impl SharedState {
    pub fn new() -> Self {
        Self {
            current_dispatch: RwLock::new(None),
            commands_completed: AtomicU64::new(0),
        }
    }

    pub async fn get_current_dispatch(&self) -> Option<CurrentDispatch> {
        self.current_dispatch.read().await.clone()
    }

    pub async fn set_current_dispatch(&self, dispatch: Option<CurrentDispatch>) {
        *self.current_dispatch.write().await = dispatch;
    }

    /// Update the phase and position of the in-flight command, if any
    pub async fn update_progress(&self, phase: DispatchPhase, repeat: i64, sound_index: usize) {
        if let Some(current) = self.current_dispatch.write().await.as_mut() {
            current.phase = phase;
            current.repeat = repeat;
            current.sound_index = sound_index;
        }
    }

    pub async fn set_phase(&self, phase: DispatchPhase) {
        if let Some(current) = self.current_dispatch.write().await.as_mut() {
            current.phase = phase;
        }
    }

    pub fn record_completed(&self) {
        self.commands_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn completed_count(&self) -> u64 {
        self.commands_completed.load(Ordering::Relaxed)
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}
