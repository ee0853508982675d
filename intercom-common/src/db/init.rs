//! Database initialization
//!
//! Opens (creating if needed) the catalog database and creates every table
//! the server reads or writes. Table creation is idempotent, so this runs on
//! every startup.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // WAL lets HTTP handlers read while the dispatcher deletes finished commands
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;

    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Create all catalog tables on an already-open pool
///
/// Used directly by tests running against `sqlite::memory:`.
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_intercom_table(pool).await?;
    create_intercom_group_table(pool).await?;
    create_group_membership_table(pool).await?;
    create_sound_table(pool).await?;
    create_announcement_table(pool).await?;
    create_announcement_command_table(pool).await?;
    create_saved_command_table(pool).await?;
    create_saved_command_set_table(pool).await?;
    create_saved_command_set_membership_table(pool).await?;

    Ok(())
}

async fn create_intercom_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS intercom (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL DEFAULT '',
            ip_address TEXT NOT NULL,
            volume_modifier INTEGER NOT NULL DEFAULT 0,
            disabled INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_intercom_group_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS intercom_group (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL DEFAULT ''
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_group_membership_table(pool: &SqlitePool) -> Result<()> {
    // No uniqueness constraint: a device listed twice is triggered twice
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS group_membership (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            intercom_id INTEGER NOT NULL REFERENCES intercom(id),
            intercom_group_id INTEGER NOT NULL REFERENCES intercom_group(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_group_membership_group ON group_membership(intercom_group_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_sound_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sound (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL DEFAULT '',
            filename TEXT NOT NULL,
            play_duration_ms INTEGER NOT NULL DEFAULT 0,
            volume_modifier INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_announcement_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS announcement (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL DEFAULT '',
            volume_modifier INTEGER NOT NULL DEFAULT 0,
            sound_order TEXT NOT NULL DEFAULT ''
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_announcement_command_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS announcement_command (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            intercom_id INTEGER,
            intercom_group_id INTEGER,
            announcement_id INTEGER,
            sound_id INTEGER,
            volume_modifier INTEGER NOT NULL DEFAULT 50,
            times_to_play INTEGER NOT NULL DEFAULT 1,
            loop_forever INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_saved_command_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS saved_command (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL DEFAULT '',
            intercom_id INTEGER,
            intercom_group_id INTEGER,
            announcement_id INTEGER,
            sound_id INTEGER,
            volume_modifier INTEGER NOT NULL DEFAULT 50,
            times_to_play INTEGER NOT NULL DEFAULT 1,
            loop_forever INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_saved_command_set_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS saved_command_set (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_saved_command_set_membership_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS saved_command_set_membership (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            saved_command_id INTEGER NOT NULL REFERENCES saved_command(id),
            set_id INTEGER NOT NULL REFERENCES saved_command_set(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
