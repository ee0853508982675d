//! Shared fixtures for intercom-server integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use intercom_common::db::{CommandSpec, SoundOrder};
use intercom_server::db::{commands, intercoms, sounds};
use intercom_server::device::{DeviceTrigger, SoundTrigger, TriggerError};
use intercom_server::playback::{CommandQueue, DispatchTiming, Dispatcher, Pacer};
use intercom_server::SharedState;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Something the dispatcher or a stop operation did, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Sound { address: String, trigger: SoundTrigger },
    Stop { address: String },
    Pause(Duration),
}

pub type EventLog = Arc<Mutex<Vec<Event>>>;

pub fn new_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Trigger client that records calls instead of sending them
pub struct RecordingTrigger {
    log: EventLog,
    failing: HashSet<String>,
}

impl RecordingTrigger {
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            failing: HashSet::new(),
        }
    }

    /// Calls to `address` are recorded and then reported as failed
    pub fn failing_for(mut self, address: &str) -> Self {
        self.failing.insert(address.to_string());
        self
    }

    fn outcome(&self, address: &str) -> Result<(), TriggerError> {
        if self.failing.contains(address) {
            Err(TriggerError::Network("unreachable".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DeviceTrigger for RecordingTrigger {
    async fn play_sound(&self, address: &str, trigger: &SoundTrigger) -> Result<(), TriggerError> {
        self.log.lock().unwrap().push(Event::Sound {
            address: address.to_string(),
            trigger: trigger.clone(),
        });
        self.outcome(address)
    }

    async fn stop_all(&self, address: &str) -> Result<(), TriggerError> {
        self.log.lock().unwrap().push(Event::Stop {
            address: address.to_string(),
        });
        self.outcome(address)
    }

    async fn probe_status(&self, address: &str) -> Result<Option<String>, TriggerError> {
        self.outcome(address).map(|_| Some(format!("ok {}", address)))
    }
}

/// Pacer that records pauses and returns immediately
pub struct RecordingPacer {
    log: EventLog,
}

impl RecordingPacer {
    pub fn new(log: EventLog) -> Self {
        Self { log }
    }
}

#[async_trait]
impl Pacer for RecordingPacer {
    async fn pause(&self, duration: Duration) {
        self.log.lock().unwrap().push(Event::Pause(duration));
        tokio::task::yield_now().await;
    }
}

pub fn sound_triggers(log: &EventLog) -> Vec<(String, SoundTrigger)> {
    log.lock()
        .unwrap()
        .iter()
        .filter_map(|event| match event {
            Event::Sound { address, trigger } => Some((address.clone(), trigger.clone())),
            _ => None,
        })
        .collect()
}

pub fn stops(log: &EventLog) -> Vec<String> {
    log.lock()
        .unwrap()
        .iter()
        .filter_map(|event| match event {
            Event::Stop { address } => Some(address.clone()),
            _ => None,
        })
        .collect()
}

pub fn pauses(log: &EventLog) -> Vec<Duration> {
    log.lock()
        .unwrap()
        .iter()
        .filter_map(|event| match event {
            Event::Pause(d) => Some(*d),
            _ => None,
        })
        .collect()
}

/// Single-connection in-memory catalog
pub async fn memory_db() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    intercom_common::db::create_schema(&pool).await.unwrap();
    pool
}

/// Everything a dispatcher test needs, wired to one event log
pub struct Harness {
    pub db: SqlitePool,
    pub queue: CommandQueue,
    pub state: Arc<SharedState>,
    pub log: EventLog,
    pub trigger: Arc<RecordingTrigger>,
}

impl Harness {
    pub async fn new() -> Self {
        let log = new_log();
        Self {
            db: memory_db().await,
            queue: CommandQueue::new(),
            state: Arc::new(SharedState::new()),
            trigger: Arc::new(RecordingTrigger::new(log.clone())),
            log,
        }
    }

    pub fn dispatcher(&self) -> Dispatcher {
        self.dispatcher_with_pacer(Arc::new(RecordingPacer::new(self.log.clone())))
    }

    pub fn dispatcher_with_pacer(&self, pacer: Arc<dyn Pacer>) -> Dispatcher {
        Dispatcher::new(
            self.db.clone(),
            self.queue.clone(),
            self.trigger.clone(),
            self.state.clone(),
            DispatchTiming {
                queue_poll: Duration::from_millis(20),
                ..DispatchTiming::default()
            },
        )
        .with_pacer(pacer)
    }
}

pub async fn add_intercom(db: &SqlitePool, name: &str, ip: &str, modifier: i64, disabled: bool) -> i64 {
    intercoms::insert_intercom(
        db,
        &intercoms::NewIntercom {
            name: name.to_string(),
            ip_address: ip.to_string(),
            volume_modifier: modifier,
            disabled,
        },
    )
    .await
    .unwrap()
}

pub async fn add_group(db: &SqlitePool, name: &str, members: Vec<i64>) -> i64 {
    intercoms::insert_group(
        db,
        &intercoms::NewGroup {
            name: name.to_string(),
            intercom_ids: members,
        },
    )
    .await
    .unwrap()
}

pub async fn add_sound(db: &SqlitePool, filename: &str, duration_ms: i64, modifier: i64) -> i64 {
    sounds::insert_sound(
        db,
        &sounds::NewSound {
            name: filename.to_string(),
            filename: filename.to_string(),
            play_duration_ms: duration_ms,
            volume_modifier: modifier,
        },
    )
    .await
    .unwrap()
}

pub async fn add_announcement(db: &SqlitePool, name: &str, modifier: i64, order: Vec<i64>) -> i64 {
    sounds::insert_announcement(
        db,
        &sounds::NewAnnouncement {
            name: name.to_string(),
            volume_modifier: modifier,
            sound_order: SoundOrder::new(order),
        },
    )
    .await
    .unwrap()
}

/// Store an announcement with a raw, possibly malformed, order string
pub async fn add_raw_announcement(db: &SqlitePool, name: &str, raw_order: &str) -> i64 {
    sqlx::query("INSERT INTO announcement (name, volume_modifier, sound_order) VALUES (?, 0, ?)")
        .bind(name)
        .bind(raw_order)
        .execute(db)
        .await
        .unwrap()
        .last_insert_rowid()
}

pub fn command_spec() -> CommandSpec {
    CommandSpec {
        intercom_id: None,
        intercom_group_id: None,
        announcement_id: None,
        sound_id: None,
        volume_modifier: 50,
        times_to_play: 1,
        loop_forever: false,
    }
}

pub async fn add_command(db: &SqlitePool, spec: CommandSpec) -> i64 {
    commands::insert_command(db, &spec).await.unwrap()
}
