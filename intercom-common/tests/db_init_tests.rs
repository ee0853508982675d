//! Tests for on-disk database initialization
//!
//! Covers first-run creation, reopening an existing database, and that the
//! catalog tables accept the rows the server writes.

use intercom_common::db::{init_database, Announcement, Intercom, PlaybackCommand};
use intercom_common::SoundOrder;

#[tokio::test]
async fn test_database_creation_when_missing() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("nested").join("intercom.db");
    assert!(!db_path.exists());

    let result = init_database(&db_path).await;
    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_opens_existing_and_keeps_rows() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("intercom.db");

    let pool = init_database(&db_path).await.unwrap();
    sqlx::query("INSERT INTO intercom (name, ip_address, volume_modifier) VALUES ('Lobby', '10.0.0.5', 5)")
        .execute(&pool)
        .await
        .unwrap();
    pool.close().await;

    let pool = init_database(&db_path).await.unwrap();
    let intercoms: Vec<Intercom> = sqlx::query_as("SELECT * FROM intercom")
        .fetch_all(&pool)
        .await
        .unwrap();
    assert_eq!(intercoms.len(), 1);
    assert_eq!(intercoms[0].name, "Lobby");
    assert_eq!(intercoms[0].volume_modifier, 5);
    assert!(!intercoms[0].disabled);
}

#[tokio::test]
async fn test_command_row_maps_to_model() {
    let dir = tempfile::tempdir().unwrap();
    let pool = init_database(&dir.path().join("intercom.db")).await.unwrap();

    sqlx::query(
        "INSERT INTO announcement_command (intercom_group_id, announcement_id, times_to_play, loop_forever) \
         VALUES (2, 3, 4, 1)",
    )
    .execute(&pool)
    .await
    .unwrap();

    let cmd: PlaybackCommand = sqlx::query_as("SELECT * FROM announcement_command")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(cmd.spec.intercom_id, None);
    assert_eq!(cmd.spec.intercom_group_id, Some(2));
    assert_eq!(cmd.spec.announcement_id, Some(3));
    assert_eq!(cmd.spec.volume_modifier, 50);
    assert_eq!(cmd.spec.times_to_play, 4);
    assert!(cmd.spec.loop_forever);
}

#[tokio::test]
async fn test_announcement_order_round_trips_through_storage() {
    let dir = tempfile::tempdir().unwrap();
    let pool = init_database(&dir.path().join("intercom.db")).await.unwrap();

    let order = SoundOrder::new(vec![3, 1, 2]);
    sqlx::query("INSERT INTO announcement (name, sound_order) VALUES ('Closing', ?)")
        .bind(order.to_string())
        .execute(&pool)
        .await
        .unwrap();

    let ann: Announcement = sqlx::query_as("SELECT * FROM announcement")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(ann.order().unwrap(), order);
}
