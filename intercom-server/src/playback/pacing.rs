//! Worker pacing
//!
//! The dispatcher paces itself with plain sleeps. They go through [`Pacer`]
//! so tests can record requested pauses instead of waiting them out.

use async_trait::async_trait;
use std::time::Duration;

/// Source of the dispatcher's self-imposed waits
#[async_trait]
pub trait Pacer: Send + Sync {
    /// Wait for `duration`; never interrupted by stop requests
    async fn pause(&self, duration: Duration);
}

/// Pacer backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPacer;

#[async_trait]
impl Pacer for TokioPacer {
    async fn pause(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}
