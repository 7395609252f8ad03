//! Tenant name registry

use sqlx::{Row, SqlitePool};

use crate::utils::*;
use fleetbase_types::prelude::*;

/// Resolve a tenant name
pub(crate) async fn read_tn_id(db: &SqlitePool, name: &str) -> FbResult<TnId> {
	let res = sqlx::query("SELECT tn_id FROM tenants WHERE name = ?")
		.bind(name)
		.fetch_one(db)
		.await;

	map_res(res, |row| row.try_get("tn_id").map(TnId))
}

/// Register a tenant name, returning the existing id if already registered
pub(crate) async fn create(db: &SqlitePool, name: &str) -> FbResult<TnId> {
	let res = sqlx::query(
		"INSERT INTO tenants (name, created_at) VALUES (?, unixepoch())
		ON CONFLICT(name) DO UPDATE SET name = excluded.name
		RETURNING tn_id",
	)
	.bind(name)
	.fetch_one(db)
	.await;

	map_res(res, |row| row.try_get("tn_id").map(TnId))
}

// vim: ts=4
