//! Configuration value store
//!
//! Values are stored as JSON text, one row per (tenant, key).

use sqlx::{Row, SqlitePool, sqlite::SqliteRow};

use crate::utils::*;
use fleetbase_types::meta_adapter::StoredSetting;
use fleetbase_types::prelude::*;

fn from_row(row: &SqliteRow) -> Result<StoredSetting, sqlx::Error> {
	let value: String = row.try_get("value")?;
	Ok(StoredSetting {
		key: row.try_get("name")?,
		value: serde_json::from_str(&value).map_err(|err| sqlx::Error::Decode(Box::new(err)))?,
		created_at: row.try_get("created_at").map(Timestamp)?,
		updated_at: row.try_get("updated_at").map(Timestamp)?,
	})
}

/// List all overrides of a tenant
pub(crate) async fn list(db: &SqlitePool, tn_id: TnId) -> FbResult<Vec<StoredSetting>> {
	let rows = sqlx::query(
		"SELECT name, value, created_at, updated_at FROM settings WHERE tn_id = ? ORDER BY name",
	)
	.bind(tn_id.0)
	.fetch_all(db)
	.await
	.map_err(db_err)?;

	collect_res(rows.iter().map(from_row))
}

/// Read a single override by key
pub(crate) async fn read(
	db: &SqlitePool,
	tn_id: TnId,
	name: &str,
) -> FbResult<Option<StoredSetting>> {
	let row = sqlx::query(
		"SELECT name, value, created_at, updated_at FROM settings WHERE tn_id = ? AND name = ?",
	)
	.bind(tn_id.0)
	.bind(name)
	.fetch_optional(db)
	.await
	.map_err(db_err)?;

	row.as_ref().map(from_row).transpose().inspect_err(inspect).map_err(|_| Error::DbError)
}

/// Insert or replace an override
pub(crate) async fn upsert(
	db: &SqlitePool,
	tn_id: TnId,
	name: &str,
	value: &serde_json::Value,
) -> FbResult<StoredSetting> {
	let res = sqlx::query(
		"INSERT INTO settings (tn_id, name, value, created_at, updated_at)
		VALUES (?, ?, ?, unixepoch(), unixepoch())
		ON CONFLICT(tn_id, name) DO UPDATE SET value = excluded.value, updated_at = unixepoch()
		RETURNING name, value, created_at, updated_at",
	)
	.bind(tn_id.0)
	.bind(name)
	.bind(value.to_string())
	.fetch_one(db)
	.await;

	map_res(res, |row| from_row(&row))
}

/// Delete an override, returning false if none existed
pub(crate) async fn delete(db: &SqlitePool, tn_id: TnId, name: &str) -> FbResult<bool> {
	let res = sqlx::query("DELETE FROM settings WHERE tn_id = ? AND name = ?")
		.bind(tn_id.0)
		.bind(name)
		.execute(db)
		.await
		.map_err(db_err)?;

	Ok(res.rows_affected() > 0)
}

// vim: ts=4
