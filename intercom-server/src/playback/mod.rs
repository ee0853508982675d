//! Playback dispatch
//!
//! A single worker turns queued command identifiers into paced device
//! triggers. Stop and reset operations live beside it in [`control`].

pub mod control;
pub mod dispatcher;
pub mod pacing;
pub mod queue;
pub mod volume;

pub use control::{full_stop, startup_reset, stop_signal, StopReport};
pub use dispatcher::{ContentFault, DispatchOutcome, DispatchTiming, Dispatcher};
pub use pacing::{Pacer, TokioPacer};
pub use queue::CommandQueue;
pub use volume::{resolve_volume, VolumeModifiers, MAX_VOLUME, MIN_VOLUME};
