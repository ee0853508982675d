//! Playback command queries (`announcement_command` table)

use crate::error::Result;
use intercom_common::db::{CommandSpec, PlaybackCommand};
use sqlx::{Pool, Sqlite};

pub async fn get_command(db: &Pool<Sqlite>, id: i64) -> Result<Option<PlaybackCommand>> {
    let row = sqlx::query_as::<_, PlaybackCommand>("SELECT * FROM announcement_command WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(row)
}

pub async fn list_commands(db: &Pool<Sqlite>) -> Result<Vec<PlaybackCommand>> {
    let rows = sqlx::query_as::<_, PlaybackCommand>("SELECT * FROM announcement_command ORDER BY id")
        .fetch_all(db)
        .await?;
    Ok(rows)
}

/// Store a new command record and return its identifier
///
/// Does not enqueue; producers push the returned id onto the command queue.
pub async fn insert_command(db: &Pool<Sqlite>, spec: &CommandSpec) -> Result<i64> {
    let id = sqlx::query(
        r#"
        INSERT INTO announcement_command (
            intercom_id, intercom_group_id, announcement_id, sound_id,
            volume_modifier, times_to_play, loop_forever
        ) VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(spec.intercom_id)
    .bind(spec.intercom_group_id)
    .bind(spec.announcement_id)
    .bind(spec.sound_id)
    .bind(spec.volume_modifier)
    .bind(spec.times_to_play)
    .bind(spec.loop_forever)
    .execute(db)
    .await?
    .last_insert_rowid();
    Ok(id)
}

/// Delete one command record; returns false if it was already gone
pub async fn delete_command(db: &Pool<Sqlite>, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM announcement_command WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Delete every command record; returns the number removed
pub async fn delete_all_commands(db: &Pool<Sqlite>) -> Result<u64> {
    let result = sqlx::query("DELETE FROM announcement_command")
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

pub async fn count_commands(db: &Pool<Sqlite>) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM announcement_command")
        .fetch_one(db)
        .await?;
    Ok(count)
}
