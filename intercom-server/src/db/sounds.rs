//! Sound and announcement queries

use crate::error::Result;
use intercom_common::db::{Announcement, Sound};
use intercom_common::SoundOrder;
use serde::Deserialize;
use sqlx::{Pool, Sqlite};

/// Fields for registering a sound already present on the devices
#[derive(Debug, Clone, Deserialize)]
pub struct NewSound {
    pub name: String,
    pub filename: String,
    pub play_duration_ms: i64,
    #[serde(default)]
    pub volume_modifier: i64,
}

/// Fields for creating or replacing an announcement
#[derive(Debug, Clone, Deserialize)]
pub struct NewAnnouncement {
    pub name: String,
    #[serde(default)]
    pub volume_modifier: i64,
    pub sound_order: SoundOrder,
}

pub async fn list_sounds(db: &Pool<Sqlite>) -> Result<Vec<Sound>> {
    let rows = sqlx::query_as::<_, Sound>("SELECT * FROM sound ORDER BY id")
        .fetch_all(db)
        .await?;
    Ok(rows)
}

pub async fn get_sound(db: &Pool<Sqlite>, id: i64) -> Result<Option<Sound>> {
    let row = sqlx::query_as::<_, Sound>("SELECT * FROM sound WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(row)
}

pub async fn insert_sound(db: &Pool<Sqlite>, new: &NewSound) -> Result<i64> {
    let id = sqlx::query(
        "INSERT INTO sound (name, filename, play_duration_ms, volume_modifier) VALUES (?, ?, ?, ?)",
    )
    .bind(&new.name)
    .bind(&new.filename)
    .bind(new.play_duration_ms)
    .bind(new.volume_modifier)
    .execute(db)
    .await?
    .last_insert_rowid();
    Ok(id)
}

pub async fn list_announcements(db: &Pool<Sqlite>) -> Result<Vec<Announcement>> {
    let rows = sqlx::query_as::<_, Announcement>("SELECT * FROM announcement ORDER BY id")
        .fetch_all(db)
        .await?;
    Ok(rows)
}

pub async fn get_announcement(db: &Pool<Sqlite>, id: i64) -> Result<Option<Announcement>> {
    let row = sqlx::query_as::<_, Announcement>("SELECT * FROM announcement WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(row)
}

pub async fn insert_announcement(db: &Pool<Sqlite>, new: &NewAnnouncement) -> Result<i64> {
    let id = sqlx::query(
        "INSERT INTO announcement (name, volume_modifier, sound_order) VALUES (?, ?, ?)",
    )
    .bind(&new.name)
    .bind(new.volume_modifier)
    .bind(new.sound_order.to_string())
    .execute(db)
    .await?
    .last_insert_rowid();
    Ok(id)
}

pub async fn update_announcement(db: &Pool<Sqlite>, id: i64, new: &NewAnnouncement) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE announcement SET name = ?, volume_modifier = ?, sound_order = ? WHERE id = ?",
    )
    .bind(&new.name)
    .bind(new.volume_modifier)
    .bind(new.sound_order.to_string())
    .bind(id)
    .execute(db)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete_announcement(db: &Pool<Sqlite>, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM announcement WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::memory_db;

    #[tokio::test]
    async fn test_sound_round_trip() {
        let db = memory_db().await;
        let id = insert_sound(
            &db,
            &NewSound {
                name: "Chime".to_string(),
                filename: "chime".to_string(),
                play_duration_ms: 1500,
                volume_modifier: -5,
            },
        )
        .await
        .unwrap();

        let sound = get_sound(&db, id).await.unwrap().unwrap();
        assert_eq!(sound.filename, "chime");
        assert_eq!(sound.play_duration_ms, 1500);
        assert_eq!(sound.volume_modifier, -5);
        assert!(get_sound(&db, id + 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_announcement_order_stored_delimited() {
        let db = memory_db().await;
        let id = insert_announcement(
            &db,
            &NewAnnouncement {
                name: "Closing".to_string(),
                volume_modifier: 3,
                sound_order: SoundOrder::new(vec![3, 1, 2]),
            },
        )
        .await
        .unwrap();

        let raw: String = sqlx::query_scalar("SELECT sound_order FROM announcement WHERE id = ?")
            .bind(id)
            .fetch_one(&db)
            .await
            .unwrap();
        assert_eq!(raw, "3,1,2");

        let ann = get_announcement(&db, id).await.unwrap().unwrap();
        assert_eq!(ann.order().unwrap().ids(), &[3, 1, 2]);
    }

    #[tokio::test]
    async fn test_delete_announcement() {
        let db = memory_db().await;
        let id = insert_announcement(
            &db,
            &NewAnnouncement {
                name: "A".to_string(),
                volume_modifier: 0,
                sound_order: SoundOrder::default(),
            },
        )
        .await
        .unwrap();
        assert!(delete_announcement(&db, id).await.unwrap());
        assert!(!delete_announcement(&db, id).await.unwrap());
    }
}
