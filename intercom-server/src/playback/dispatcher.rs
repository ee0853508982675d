//! Playback dispatcher
//!
//! Exactly one dispatcher runs per process. It pops a command identifier,
//! re-reads the command from the catalog, plays its content sequence on
//! every enabled target, and finally deletes or re-queues the command.
//!
//! # Pacing
//!
//! After each device trigger the worker waits `stagger`. After the last
//! device for a sound it waits the sound's duration plus `settle`. After
//! each full repeat it waits `settle` again, and after finalizing a command
//! it waits `settle` once more before the next queue pop. A command skipped
//! before its first trigger (missing record or unresolvable content) moves
//! straight on to the next pop. None of these waits observe shutdown; only
//! the queue wait does.
//!
//! # Concurrent edits
//!
//! Nothing fetched from the catalog is trusted across a pause. The command
//! is re-read after every sound and every repeat; if it has been deleted the
//! worker abandons it without finalizing. Sounds and targets are read fresh
//! for each sound event.

use crate::db::{commands, intercoms, sounds};
use crate::device::{DeviceTrigger, SoundTrigger};
use crate::error::{Error, Result};
use crate::playback::pacing::{Pacer, TokioPacer};
use crate::playback::queue::CommandQueue;
use crate::playback::volume::VolumeModifiers;
use crate::state::{CurrentDispatch, DispatchPhase, SharedState};
use intercom_common::db::{
    CommandSpec, ContentSelector, Intercom, PlaybackCommand, Sound, SoundOrderError, TargetSelector,
};
use intercom_common::time;
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Fixed delays used by the dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchTiming {
    /// Offset from now to the shared device start time
    pub look_ahead: Duration,
    /// Buffer after each sound, each repeat and each command
    pub settle: Duration,
    /// Gap between triggers to successive devices
    pub stagger: Duration,
    /// Longest single queue wait before shutdown is re-checked
    pub queue_poll: Duration,
}

impl Default for DispatchTiming {
    fn default() -> Self {
        Self {
            look_ahead: Duration::from_secs(5),
            settle: Duration::from_secs(2),
            stagger: Duration::from_millis(100),
            queue_poll: Duration::from_secs(1),
        }
    }
}

/// Content reference that could not be resolved
#[derive(Debug, Error)]
pub enum ContentFault {
    #[error("sound {0} not found")]
    MissingSound(i64),

    #[error("announcement {0} not found")]
    MissingAnnouncement(i64),

    #[error("announcement {id} has a malformed sound order: {source}")]
    MalformedOrder { id: i64, source: SoundOrderError },
}

/// How one dequeued identifier was handled
#[derive(Debug)]
pub enum DispatchOutcome {
    /// No record for the identifier; nothing was sent
    Missing,
    /// All repeats played and the record was deleted
    Deleted,
    /// All repeats played and the identifier went back on the queue
    Requeued,
    /// The record disappeared mid-dispatch; remaining steps were skipped
    Withdrawn,
    /// Content failed to resolve before any trigger; the record was deleted
    Rejected(ContentFault),
    /// Content vanished mid-dispatch; remaining steps were skipped and the
    /// record was deleted
    Aborted(ContentFault),
}

impl DispatchOutcome {
    /// Whether the command got far enough to occupy the fleet
    pub fn reached_dispatch(&self) -> bool {
        !matches!(self, DispatchOutcome::Missing | DispatchOutcome::Rejected(_))
    }
}

/// One step of a content sequence
#[derive(Debug, Clone, Copy)]
struct PlannedSound {
    sound_id: i64,
    announcement_id: Option<i64>,
}

/// Reasons a dispatch stops before finalizing normally
enum StepError {
    Store(Error),
    Content(ContentFault),
    Withdrawn,
}

impl From<Error> for StepError {
    fn from(err: Error) -> Self {
        StepError::Store(err)
    }
}

impl From<ContentFault> for StepError {
    fn from(fault: ContentFault) -> Self {
        StepError::Content(fault)
    }
}

/// The single playback worker
pub struct Dispatcher {
    db: SqlitePool,
    queue: CommandQueue,
    trigger: Arc<dyn DeviceTrigger>,
    pacer: Arc<dyn Pacer>,
    state: Arc<SharedState>,
    timing: DispatchTiming,
}

impl Dispatcher {
    pub fn new(
        db: SqlitePool,
        queue: CommandQueue,
        trigger: Arc<dyn DeviceTrigger>,
        state: Arc<SharedState>,
        timing: DispatchTiming,
    ) -> Self {
        Self {
            db,
            queue,
            trigger,
            pacer: Arc::new(TokioPacer),
            state,
            timing,
        }
    }

    /// Replace the pacer (tests record pauses instead of sleeping)
    pub fn with_pacer(mut self, pacer: Arc<dyn Pacer>) -> Self {
        self.pacer = pacer;
        self
    }

    /// Consume the queue until `shutdown` is cancelled
    ///
    /// Shutdown is only observed while waiting on the queue, so a command in
    /// progress always reaches its next queue-wait boundary first.
    pub async fn run(self, shutdown: CancellationToken) {
        info!("Playback dispatcher started");

        loop {
            let next = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                id = self.queue.dequeue(self.timing.queue_poll) => id,
            };

            let Some(command_id) = next else {
                continue;
            };

            match self.process(command_id).await {
                Ok(outcome) => {
                    if outcome.reached_dispatch() {
                        self.pacer.pause(self.timing.settle).await;
                    }
                }
                Err(e) => {
                    error!(command_id, "Dispatch failed: {}", e);
                }
            }
        }

        info!("Playback dispatcher stopped");
    }

    /// Handle one dequeued identifier from start to finalization
    pub async fn process(&self, command_id: i64) -> Result<DispatchOutcome> {
        let Some(command) = commands::get_command(&self.db, command_id).await? else {
            debug!(command_id, "Command no longer exists, skipping");
            return Ok(DispatchOutcome::Missing);
        };

        info!(command_id, "Processing command");
        self.state
            .set_current_dispatch(Some(CurrentDispatch {
                command_id,
                phase: DispatchPhase::Resolving,
                repeat: 0,
                times_to_play: command.spec.times_to_play,
                sound_index: 0,
                sound_count: 0,
            }))
            .await;

        let outcome = self.dispatch(&command).await;
        self.state.set_current_dispatch(None).await;
        outcome
    }

    async fn dispatch(&self, command: &PlaybackCommand) -> Result<DispatchOutcome> {
        let command_id = command.id;

        let plan = match self.resolve_content(&command.spec).await {
            Ok(plan) => plan,
            Err(step) => return self.stop_early(command_id, step, false).await,
        };
        if let Some(current) = self.state.current_dispatch.write().await.as_mut() {
            current.sound_count = plan.len();
        }

        let latest = match self.play_all(command, &plan).await {
            Ok(latest) => latest,
            Err(step) => return self.stop_early(command_id, step, true).await,
        };

        self.state.set_phase(DispatchPhase::Finalizing).await;
        info!(command_id, "Finished processing command");
        self.state.record_completed();

        if latest.spec.loop_forever {
            self.queue.enqueue(command_id);
            debug!(command_id, "Looping command re-queued");
            Ok(DispatchOutcome::Requeued)
        } else {
            commands::delete_command(&self.db, command_id).await?;
            Ok(DispatchOutcome::Deleted)
        }
    }

    /// Conclude a dispatch that could not run to finalization
    async fn stop_early(
        &self,
        command_id: i64,
        step: StepError,
        started: bool,
    ) -> Result<DispatchOutcome> {
        match step {
            StepError::Withdrawn => {
                info!(command_id, "Command removed during dispatch, abandoning");
                Ok(DispatchOutcome::Withdrawn)
            }
            StepError::Content(fault) => {
                commands::delete_command(&self.db, command_id).await?;
                if started {
                    warn!(command_id, "Aborting remaining steps: {}", fault);
                    Ok(DispatchOutcome::Aborted(fault))
                } else {
                    warn!(command_id, "Skipping command with unresolvable content: {}", fault);
                    Ok(DispatchOutcome::Rejected(fault))
                }
            }
            StepError::Store(e) => Err(e),
        }
    }

    /// Play every repeat; returns the command as last re-read
    async fn play_all(
        &self,
        command: &PlaybackCommand,
        plan: &[PlannedSound],
    ) -> std::result::Result<PlaybackCommand, StepError> {
        let mut latest = command.clone();
        for repeat in 1..=command.spec.times_to_play {
            for (index, planned) in plan.iter().enumerate() {
                self.state
                    .update_progress(DispatchPhase::Dispatching, repeat, index)
                    .await;

                let sound = self.play_sound_event(command, planned).await?;

                self.state
                    .update_progress(DispatchPhase::Paused, repeat, index)
                    .await;
                self.pacer
                    .pause(time::millis_to_duration(sound.play_duration_ms) + self.timing.settle)
                    .await;
                self.refetch(command.id).await?;
            }

            self.pacer.pause(self.timing.settle).await;
            latest = self.refetch(command.id).await?;
        }

        Ok(latest)
    }

    /// Trigger one sound on every enabled target
    async fn play_sound_event(
        &self,
        command: &PlaybackCommand,
        planned: &PlannedSound,
    ) -> std::result::Result<Sound, StepError> {
        let sound = sounds::get_sound(&self.db, planned.sound_id)
            .await?
            .ok_or(ContentFault::MissingSound(planned.sound_id))?;

        let announcement_modifier = match planned.announcement_id {
            Some(announcement_id) => Some(
                sounds::get_announcement(&self.db, announcement_id)
                    .await?
                    .ok_or(ContentFault::MissingAnnouncement(announcement_id))?
                    .volume_modifier,
            ),
            None => None,
        };

        let targets = self.resolve_targets(&command.spec).await?;
        let start_time = time::start_time_after(self.timing.look_ahead);

        for device in targets.iter().filter(|device| !device.disabled) {
            let volume = VolumeModifiers {
                command: command.spec.volume_modifier,
                device: device.volume_modifier,
                sound: sound.volume_modifier,
                announcement: announcement_modifier,
            }
            .resolve();

            let trigger = SoundTrigger {
                message: sound.filename.clone(),
                volume,
                command_id: command.id,
                start_time,
            };

            if let Err(e) = self.trigger.play_sound(&device.ip_address, &trigger).await {
                warn!(
                    command_id = command.id,
                    intercom = %device.name,
                    "Failed to send to {}: {}",
                    device.ip_address,
                    e
                );
            }
            self.pacer.pause(self.timing.stagger).await;
        }

        Ok(sound)
    }

    /// Devices selected by the command, in declared order
    ///
    /// A missing device or group yields no targets. Disabled devices are
    /// kept here and skipped at trigger time.
    async fn resolve_targets(&self, spec: &CommandSpec) -> Result<Vec<Intercom>> {
        match spec.target() {
            Some(TargetSelector::Device(id)) => {
                Ok(intercoms::get_intercom(&self.db, id).await?.into_iter().collect())
            }
            Some(TargetSelector::Group(id)) => intercoms::group_members(&self.db, id).await,
            None => Ok(Vec::new()),
        }
    }

    /// Ordered content sequence, with every referenced sound checked up front
    async fn resolve_content(
        &self,
        spec: &CommandSpec,
    ) -> std::result::Result<Vec<PlannedSound>, StepError> {
        match spec.content() {
            Some(ContentSelector::Sound(sound_id)) => {
                if sounds::get_sound(&self.db, sound_id).await?.is_none() {
                    return Err(ContentFault::MissingSound(sound_id).into());
                }
                Ok(vec![PlannedSound {
                    sound_id,
                    announcement_id: None,
                }])
            }
            Some(ContentSelector::Announcement(announcement_id)) => {
                let announcement = sounds::get_announcement(&self.db, announcement_id)
                    .await?
                    .ok_or(ContentFault::MissingAnnouncement(announcement_id))?;
                let order = announcement
                    .order()
                    .map_err(|source| ContentFault::MalformedOrder {
                        id: announcement_id,
                        source,
                    })?;

                let mut plan = Vec::with_capacity(order.len());
                for sound_id in order.iter() {
                    if sounds::get_sound(&self.db, sound_id).await?.is_none() {
                        return Err(ContentFault::MissingSound(sound_id).into());
                    }
                    plan.push(PlannedSound {
                        sound_id,
                        announcement_id: Some(announcement_id),
                    });
                }
                Ok(plan)
            }
            None => Ok(Vec::new()),
        }
    }

    async fn refetch(&self, command_id: i64) -> std::result::Result<PlaybackCommand, StepError> {
        commands::get_command(&self.db, command_id)
            .await?
            .ok_or(StepError::Withdrawn)
    }
}
