//! Deployable set references
//!
//! Deployable sets themselves are not stored here; only which of them use
//! which type, keyed by an opaque reference id.

use sqlx::{Row, SqliteConnection, SqlitePool};

use crate::utils::*;
use fleetbase_types::prelude::*;

/// Kind of type a deployable set refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
	DistType,
	ModuleType,
}

impl RefKind {
	pub(crate) fn code(self) -> &'static str {
		match self {
			RefKind::DistType => "D",
			RefKind::ModuleType => "M",
		}
	}

	/// Table and id column of the referenced type
	fn table(self) -> (&'static str, &'static str) {
		match self {
			RefKind::DistType => ("dist_types", "dst_id"),
			RefKind::ModuleType => ("module_types", "smt_id"),
		}
	}
}

pub(crate) async fn type_exists(
	conn: &mut SqliteConnection,
	tn_id: TnId,
	kind: RefKind,
	type_id: i64,
) -> FbResult<bool> {
	let (table, id_col) = kind.table();
	let row = sqlx::query(&format!("SELECT 1 FROM {} WHERE tn_id = ? AND {} = ?", table, id_col))
		.bind(tn_id.0)
		.bind(type_id)
		.fetch_optional(&mut *conn)
		.await
		.map_err(db_err)?;
	Ok(row.is_some())
}

/// Record a reference; recording it twice is a no-op.
///
/// Referencing a distribution set type bumps its version in the same
/// transaction, so membership writes based on an earlier read go stale.
/// Fails with `Error::NotFound` if the type does not exist.
pub(crate) async fn add(
	db: &SqlitePool,
	tn_id: TnId,
	kind: RefKind,
	type_id: i64,
	ref_id: &str,
) -> FbResult<()> {
	let mut tx = db.begin().await.map_err(db_err)?;

	if kind == RefKind::DistType {
		let res = sqlx::query(
			"UPDATE dist_types SET version = version + 1, updated_at = unixepoch()
			WHERE tn_id = ? AND dst_id = ?",
		)
		.bind(tn_id.0)
		.bind(type_id)
		.execute(&mut *tx)
		.await
		.map_err(db_err)?;
		if res.rows_affected() == 0 {
			return Err(Error::NotFound);
		}
	}

	let (table, id_col) = kind.table();
	let res = sqlx::query(&format!(
		"INSERT INTO deployment_refs (tn_id, kind, type_id, ref_id, created_at)
		SELECT ?, ?, ?, ?, unixepoch()
		WHERE EXISTS (SELECT 1 FROM {} WHERE tn_id = ? AND {} = ?)
		ON CONFLICT DO NOTHING",
		table, id_col
	))
	.bind(tn_id.0)
	.bind(kind.code())
	.bind(type_id)
	.bind(ref_id)
	.bind(tn_id.0)
	.bind(type_id)
	.execute(&mut *tx)
	.await
	.map_err(db_err)?;

	if res.rows_affected() == 0 && !type_exists(&mut tx, tn_id, kind, type_id).await? {
		return Err(Error::NotFound);
	}

	tx.commit().await.map_err(db_err)?;
	Ok(())
}

/// Remove a reference, returning false if it was not recorded
pub(crate) async fn remove(
	db: &SqlitePool,
	tn_id: TnId,
	kind: RefKind,
	type_id: i64,
	ref_id: &str,
) -> FbResult<bool> {
	let res = sqlx::query(
		"DELETE FROM deployment_refs WHERE tn_id = ? AND kind = ? AND type_id = ? AND ref_id = ?",
	)
	.bind(tn_id.0)
	.bind(kind.code())
	.bind(type_id)
	.bind(ref_id)
	.execute(db)
	.await
	.map_err(db_err)?;
	Ok(res.rows_affected() > 0)
}

pub(crate) async fn is_in_use(
	db: &SqlitePool,
	tn_id: TnId,
	kind: RefKind,
	type_id: i64,
) -> FbResult<bool> {
	let res = sqlx::query(
		"SELECT EXISTS(SELECT 1 FROM deployment_refs WHERE tn_id = ? AND kind = ? AND type_id = ?) AS used",
	)
	.bind(tn_id.0)
	.bind(kind.code())
	.bind(type_id)
	.fetch_one(db)
	.await;

	map_res(res, |row| row.try_get("used"))
}

// vim: ts=4
