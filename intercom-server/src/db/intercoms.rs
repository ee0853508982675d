//! Intercom and intercom group queries

use crate::error::Result;
use intercom_common::db::{Intercom, IntercomGroup};
use serde::Deserialize;
use sqlx::{Pool, Sqlite};

/// Fields for creating or replacing an intercom
#[derive(Debug, Clone, Deserialize)]
pub struct NewIntercom {
    pub name: String,
    pub ip_address: String,
    #[serde(default)]
    pub volume_modifier: i64,
    #[serde(default)]
    pub disabled: bool,
}

/// Fields for creating or replacing a group and its membership
#[derive(Debug, Clone, Deserialize)]
pub struct NewGroup {
    pub name: String,
    #[serde(default)]
    pub intercom_ids: Vec<i64>,
}

pub async fn list_intercoms(db: &Pool<Sqlite>) -> Result<Vec<Intercom>> {
    let rows = sqlx::query_as::<_, Intercom>("SELECT * FROM intercom ORDER BY id")
        .fetch_all(db)
        .await?;
    Ok(rows)
}

pub async fn get_intercom(db: &Pool<Sqlite>, id: i64) -> Result<Option<Intercom>> {
    let row = sqlx::query_as::<_, Intercom>("SELECT * FROM intercom WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(row)
}

pub async fn insert_intercom(db: &Pool<Sqlite>, new: &NewIntercom) -> Result<i64> {
    let id = sqlx::query(
        "INSERT INTO intercom (name, ip_address, volume_modifier, disabled) VALUES (?, ?, ?, ?)",
    )
    .bind(&new.name)
    .bind(&new.ip_address)
    .bind(new.volume_modifier)
    .bind(new.disabled)
    .execute(db)
    .await?
    .last_insert_rowid();
    Ok(id)
}

/// Replace an intercom's fields; returns false if it does not exist
pub async fn update_intercom(db: &Pool<Sqlite>, id: i64, new: &NewIntercom) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE intercom SET name = ?, ip_address = ?, volume_modifier = ?, disabled = ? WHERE id = ?",
    )
    .bind(&new.name)
    .bind(&new.ip_address)
    .bind(new.volume_modifier)
    .bind(new.disabled)
    .bind(id)
    .execute(db)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Delete an intercom along with its group memberships
pub async fn delete_intercom(db: &Pool<Sqlite>, id: i64) -> Result<bool> {
    let mut tx = db.begin().await?;
    sqlx::query("DELETE FROM group_membership WHERE intercom_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    let result = sqlx::query("DELETE FROM intercom WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(result.rows_affected() > 0)
}

pub async fn list_groups(db: &Pool<Sqlite>) -> Result<Vec<IntercomGroup>> {
    let rows = sqlx::query_as::<_, IntercomGroup>("SELECT * FROM intercom_group ORDER BY id")
        .fetch_all(db)
        .await?;
    Ok(rows)
}

pub async fn get_group(db: &Pool<Sqlite>, id: i64) -> Result<Option<IntercomGroup>> {
    let row = sqlx::query_as::<_, IntercomGroup>("SELECT * FROM intercom_group WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(row)
}

/// Member intercoms of a group in membership order
///
/// A device listed twice appears twice. Memberships pointing at a deleted
/// intercom are skipped. An unknown group yields an empty list.
pub async fn group_members(db: &Pool<Sqlite>, group_id: i64) -> Result<Vec<Intercom>> {
    let rows = sqlx::query_as::<_, Intercom>(
        r#"
        SELECT i.id, i.name, i.ip_address, i.volume_modifier, i.disabled
        FROM group_membership gm
        JOIN intercom i ON i.id = gm.intercom_id
        WHERE gm.intercom_group_id = ?
        ORDER BY gm.id
        "#,
    )
    .bind(group_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn insert_group(db: &Pool<Sqlite>, new: &NewGroup) -> Result<i64> {
    let mut tx = db.begin().await?;
    let id = sqlx::query("INSERT INTO intercom_group (name) VALUES (?)")
        .bind(&new.name)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();
    for intercom_id in &new.intercom_ids {
        sqlx::query("INSERT INTO group_membership (intercom_id, intercom_group_id) VALUES (?, ?)")
            .bind(intercom_id)
            .bind(id)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;
    Ok(id)
}

/// Rename a group and replace its membership; returns false if it does not exist
pub async fn update_group(db: &Pool<Sqlite>, id: i64, new: &NewGroup) -> Result<bool> {
    let mut tx = db.begin().await?;
    let result = sqlx::query("UPDATE intercom_group SET name = ? WHERE id = ?")
        .bind(&new.name)
        .bind(id)
        .execute(&mut *tx)
        .await?;
    if result.rows_affected() == 0 {
        return Ok(false);
    }
    sqlx::query("DELETE FROM group_membership WHERE intercom_group_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    for intercom_id in &new.intercom_ids {
        sqlx::query("INSERT INTO group_membership (intercom_id, intercom_group_id) VALUES (?, ?)")
            .bind(intercom_id)
            .bind(id)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;
    Ok(true)
}

/// Delete a group and its memberships
pub async fn delete_group(db: &Pool<Sqlite>, id: i64) -> Result<bool> {
    let mut tx = db.begin().await?;
    sqlx::query("DELETE FROM group_membership WHERE intercom_group_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    let result = sqlx::query("DELETE FROM intercom_group WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(result.rows_affected() > 0)
}

/// Declared member ids of a group, in membership order
pub async fn group_member_ids(db: &Pool<Sqlite>, group_id: i64) -> Result<Vec<i64>> {
    let ids = sqlx::query_scalar::<_, i64>(
        "SELECT intercom_id FROM group_membership WHERE intercom_group_id = ? ORDER BY id",
    )
    .bind(group_id)
    .fetch_all(db)
    .await?;
    Ok(ids)
}
