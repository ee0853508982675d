//! Saved command templates and command sets

use crate::error::Result;
use intercom_common::db::{CommandSpec, SavedCommand, SavedCommandSet};
use serde::Deserialize;
use sqlx::{Pool, Sqlite};

/// Fields for creating or replacing a saved command
#[derive(Debug, Clone, Deserialize)]
pub struct NewSavedCommand {
    pub name: String,
    #[serde(flatten)]
    pub spec: CommandSpec,
}

/// Fields for creating or replacing a command set
#[derive(Debug, Clone, Deserialize)]
pub struct NewCommandSet {
    pub name: String,
    #[serde(default)]
    pub command_ids: Vec<i64>,
}

pub async fn list_saved_commands(db: &Pool<Sqlite>) -> Result<Vec<SavedCommand>> {
    let rows = sqlx::query_as::<_, SavedCommand>("SELECT * FROM saved_command ORDER BY id")
        .fetch_all(db)
        .await?;
    Ok(rows)
}

pub async fn get_saved_command(db: &Pool<Sqlite>, id: i64) -> Result<Option<SavedCommand>> {
    let row = sqlx::query_as::<_, SavedCommand>("SELECT * FROM saved_command WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(row)
}

pub async fn insert_saved_command(db: &Pool<Sqlite>, new: &NewSavedCommand) -> Result<i64> {
    let spec = &new.spec;
    let id = sqlx::query(
        r#"
        INSERT INTO saved_command (
            name, intercom_id, intercom_group_id, announcement_id, sound_id,
            volume_modifier, times_to_play, loop_forever
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&new.name)
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

pub async fn update_saved_command(db: &Pool<Sqlite>, id: i64, new: &NewSavedCommand) -> Result<bool> {
    let spec = &new.spec;
    let result = sqlx::query(
        r#"
        UPDATE saved_command SET
            name = ?, intercom_id = ?, intercom_group_id = ?, announcement_id = ?,
            sound_id = ?, volume_modifier = ?, times_to_play = ?, loop_forever = ?
        WHERE id = ?
        "#,
    )
    .bind(&new.name)
    .bind(spec.intercom_id)
    .bind(spec.intercom_group_id)
    .bind(spec.announcement_id)
    .bind(spec.sound_id)
    .bind(spec.volume_modifier)
    .bind(spec.times_to_play)
    .bind(spec.loop_forever)
    .bind(id)
    .execute(db)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Delete a saved command and drop it from every set
pub async fn delete_saved_command(db: &Pool<Sqlite>, id: i64) -> Result<bool> {
    let mut tx = db.begin().await?;
    sqlx::query("DELETE FROM saved_command_set_membership WHERE saved_command_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    let result = sqlx::query("DELETE FROM saved_command WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(result.rows_affected() > 0)
}

pub async fn list_command_sets(db: &Pool<Sqlite>) -> Result<Vec<SavedCommandSet>> {
    let rows = sqlx::query_as::<_, SavedCommandSet>("SELECT * FROM saved_command_set ORDER BY id")
        .fetch_all(db)
        .await?;
    Ok(rows)
}

pub async fn get_command_set(db: &Pool<Sqlite>, id: i64) -> Result<Option<SavedCommandSet>> {
    let row = sqlx::query_as::<_, SavedCommandSet>("SELECT * FROM saved_command_set WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(row)
}

/// Saved commands belonging to a set, in membership order
pub async fn command_set_members(db: &Pool<Sqlite>, set_id: i64) -> Result<Vec<SavedCommand>> {
    let rows = sqlx::query_as::<_, SavedCommand>(
        r#"
        SELECT sc.*
        FROM saved_command_set_membership m
        JOIN saved_command sc ON sc.id = m.saved_command_id
        WHERE m.set_id = ?
        ORDER BY m.id
        "#,
    )
    .bind(set_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn insert_command_set(db: &Pool<Sqlite>, new: &NewCommandSet) -> Result<i64> {
    let mut tx = db.begin().await?;
    let id = sqlx::query("INSERT INTO saved_command_set (name) VALUES (?)")
        .bind(&new.name)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();
    for command_id in &new.command_ids {
        sqlx::query("INSERT INTO saved_command_set_membership (saved_command_id, set_id) VALUES (?, ?)")
            .bind(command_id)
            .bind(id)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;
    Ok(id)
}

pub async fn update_command_set(db: &Pool<Sqlite>, id: i64, new: &NewCommandSet) -> Result<bool> {
    let mut tx = db.begin().await?;
    let result = sqlx::query("UPDATE saved_command_set SET name = ? WHERE id = ?")
        .bind(&new.name)
        .bind(id)
        .execute(&mut *tx)
        .await?;
    if result.rows_affected() == 0 {
        return Ok(false);
    }
    sqlx::query("DELETE FROM saved_command_set_membership WHERE set_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    for command_id in &new.command_ids {
        sqlx::query("INSERT INTO saved_command_set_membership (saved_command_id, set_id) VALUES (?, ?)")
            .bind(command_id)
            .bind(id)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;
    Ok(true)
}

pub async fn delete_command_set(db: &Pool<Sqlite>, id: i64) -> Result<bool> {
    let mut tx = db.begin().await?;
    sqlx::query("DELETE FROM saved_command_set_membership WHERE set_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    let result = sqlx::query("DELETE FROM saved_command_set WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::memory_db;

    fn saved(name: &str, sound_id: i64) -> NewSavedCommand {
        NewSavedCommand {
            name: name.to_string(),
            spec: CommandSpec {
                intercom_id: Some(1),
                intercom_group_id: None,
                announcement_id: None,
                sound_id: Some(sound_id),
                volume_modifier: 40,
                times_to_play: 2,
                loop_forever: false,
            },
        }
    }

    #[tokio::test]
    async fn test_set_members_in_membership_order() {
        let db = memory_db().await;
        let first = insert_saved_command(&db, &saved("first", 1)).await.unwrap();
        let second = insert_saved_command(&db, &saved("second", 2)).await.unwrap();
        let set = insert_command_set(
            &db,
            &NewCommandSet {
                name: "Evening".to_string(),
                command_ids: vec![second, first],
            },
        )
        .await
        .unwrap();

        let names: Vec<String> = command_set_members(&db, set)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["second", "first"]);
    }

    #[tokio::test]
    async fn test_delete_saved_command_leaves_set_consistent() {
        let db = memory_db().await;
        let first = insert_saved_command(&db, &saved("first", 1)).await.unwrap();
        let set = insert_command_set(
            &db,
            &NewCommandSet {
                name: "Morning".to_string(),
                command_ids: vec![first],
            },
        )
        .await
        .unwrap();

        assert!(delete_saved_command(&db, first).await.unwrap());
        assert!(command_set_members(&db, set).await.unwrap().is_empty());
        assert!(get_command_set(&db, set).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_update_saved_command() {
        let db = memory_db().await;
        let id = insert_saved_command(&db, &saved("bell", 1)).await.unwrap();
        let mut changed = saved("bell", 5);
        changed.spec.loop_forever = true;
        assert!(update_saved_command(&db, id, &changed).await.unwrap());

        let row = get_saved_command(&db, id).await.unwrap().unwrap();
        assert_eq!(row.spec.sound_id, Some(5));
        assert!(row.spec.loop_forever);
    }
}
