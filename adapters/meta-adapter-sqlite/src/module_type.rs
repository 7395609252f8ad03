//! Software module type storage

use sqlx::{Row, SqlitePool, sqlite::SqliteRow};

use crate::deployment::{RefKind, type_exists};
use crate::utils::*;
use fleetbase_types::meta_adapter::{CreateModuleType, ModuleType, UpdateModuleTypeData};
use fleetbase_types::prelude::*;

const COLUMNS: &str =
	"smt_id, key, name, description, colour, max_assignments, created_at, updated_at";

fn from_row(row: &SqliteRow) -> Result<ModuleType, sqlx::Error> {
	Ok(ModuleType {
		smt_id: row.try_get("smt_id")?,
		key: row.try_get("key")?,
		name: row.try_get("name")?,
		description: row.try_get("description")?,
		colour: row.try_get("colour")?,
		max_assignments: row.try_get("max_assignments")?,
		created_at: row.try_get("created_at").map(Timestamp)?,
		updated_at: row.try_get("updated_at").map(Timestamp)?,
	})
}

pub(crate) async fn list(db: &SqlitePool, tn_id: TnId) -> FbResult<Vec<ModuleType>> {
	let rows = sqlx::query(&format!(
		"SELECT {} FROM module_types WHERE tn_id = ? ORDER BY smt_id",
		COLUMNS
	))
	.bind(tn_id.0)
	.fetch_all(db)
	.await
	.map_err(db_err)?;

	collect_res(rows.iter().map(from_row))
}

pub(crate) async fn read(db: &SqlitePool, tn_id: TnId, smt_id: i64) -> FbResult<ModuleType> {
	let res = sqlx::query(&format!(
		"SELECT {} FROM module_types WHERE tn_id = ? AND smt_id = ?",
		COLUMNS
	))
	.bind(tn_id.0)
	.bind(smt_id)
	.fetch_one(db)
	.await;

	map_res(res, |row| from_row(&row))
}

/// Read the given ids, skipping unknown ones
pub(crate) async fn read_many(
	db: &SqlitePool,
	tn_id: TnId,
	smt_ids: &[i64],
) -> FbResult<Vec<ModuleType>> {
	if smt_ids.is_empty() {
		return Ok(Vec::new());
	}

	let mut query = sqlx::QueryBuilder::new(format!("SELECT {} FROM module_types WHERE tn_id = ", COLUMNS));
	query.push_bind(tn_id.0).push(" AND smt_id IN ");
	push_in_ids(&mut query, smt_ids);
	query.push(" ORDER BY smt_id");

	let rows = query.build().fetch_all(db).await.map_err(db_err)?;
	collect_res(rows.iter().map(from_row))
}

/// Create all or none
pub(crate) async fn create(
	db: &SqlitePool,
	tn_id: TnId,
	types: &[CreateModuleType],
) -> FbResult<Vec<ModuleType>> {
	let mut tx = db.begin().await.map_err(db_err)?;
	let mut created = Vec::with_capacity(types.len());

	for t in types {
		let row = sqlx::query(&format!(
			"INSERT INTO module_types (tn_id, key, name, description, colour, max_assignments, created_at, updated_at)
			VALUES (?, ?, ?, ?, ?, ?, unixepoch(), unixepoch())
			RETURNING {}",
			COLUMNS
		))
		.bind(tn_id.0)
		.bind(&*t.key)
		.bind(&*t.name)
		.bind(t.description.as_deref())
		.bind(t.colour.as_deref())
		.bind(t.max_assignments)
		.fetch_one(&mut *tx)
		.await
		.map_err(|err| write_err(err, || Error::Internal("unexpected foreign key".into())))?;

		created.push(from_row(&row).inspect_err(inspect).map_err(|_| Error::DbError)?);
	}

	tx.commit().await.map_err(db_err)?;
	Ok(created)
}

pub(crate) async fn update(
	db: &SqlitePool,
	tn_id: TnId,
	smt_id: i64,
	data: &UpdateModuleTypeData,
) -> FbResult<ModuleType> {
	let mut query = sqlx::QueryBuilder::new("UPDATE module_types SET ");
	let mut has_updates = false;

	has_updates = push_patch!(query, has_updates, "name", &data.name, |v| v.to_string());
	has_updates =
		push_patch!(query, has_updates, "description", &data.description, |v| v.to_string());
	has_updates = push_patch!(query, has_updates, "colour", &data.colour, |v| v.to_string());
	has_updates =
		push_patch!(query, has_updates, "max_assignments", &data.max_assignments, |v| *v);

	if !has_updates {
		return read(db, tn_id, smt_id).await;
	}

	query.push(", updated_at=unixepoch() WHERE tn_id = ");
	query.push_bind(tn_id.0).push(" AND smt_id = ").push_bind(smt_id);

	let res = query
		.build()
		.execute(db)
		.await
		.map_err(|err| write_err(err, || Error::Internal("unexpected foreign key".into())))?;
	if res.rows_affected() == 0 {
		return Err(Error::NotFound);
	}

	read(db, tn_id, smt_id).await
}

/// Delete unless a distribution set type or a deployable set references it
pub(crate) async fn delete(db: &SqlitePool, tn_id: TnId, smt_id: i64) -> FbResult<()> {
	let mut tx = db.begin().await.map_err(db_err)?;

	let res = sqlx::query(
		"DELETE FROM module_types WHERE tn_id = ? AND smt_id = ?
		AND NOT EXISTS (SELECT 1 FROM deployment_refs WHERE tn_id = ? AND kind = ? AND type_id = ?)",
	)
	.bind(tn_id.0)
	.bind(smt_id)
	.bind(tn_id.0)
	.bind(RefKind::ModuleType.code())
	.bind(smt_id)
	.execute(&mut *tx)
	.await
	.map_err(|err| {
		write_err(err, || {
			Error::InUse(format!("module type {} is referenced by distribution set types", smt_id))
		})
	})?;

	if res.rows_affected() == 0 {
		return Err(if type_exists(&mut tx, tn_id, RefKind::ModuleType, smt_id).await? {
			Error::InUse(format!("module type {} is used by deployable sets", smt_id))
		} else {
			Error::NotFound
		});
	}

	tx.commit().await.map_err(db_err)?;
	Ok(())
}

/// Members of one set of a distribution set type, sorted by id.
///
/// Runs in one transaction so the aggregate check and the member rows come
/// from the same snapshot.
pub(crate) async fn list_members(
	db: &SqlitePool,
	tn_id: TnId,
	dst_id: i64,
	mandatory: bool,
) -> FbResult<Vec<ModuleType>> {
	let mut tx = db.begin().await.map_err(db_err)?;

	if !type_exists(&mut tx, tn_id, RefKind::DistType, dst_id).await? {
		return Err(Error::NotFound);
	}

	let rows = sqlx::query(&format!(
		"SELECT {} FROM module_types WHERE tn_id = ? AND smt_id IN
			(SELECT smt_id FROM dist_type_modules WHERE tn_id = ? AND dst_id = ? AND mandatory = ?)
		ORDER BY smt_id",
		COLUMNS
	))
	.bind(tn_id.0)
	.bind(tn_id.0)
	.bind(dst_id)
	.bind(mandatory)
	.fetch_all(&mut *tx)
	.await
	.map_err(db_err)?;

	tx.commit().await.map_err(db_err)?;
	collect_res(rows.iter().map(from_row))
}

/// Ids of distribution set types referencing the module type
pub(crate) async fn list_referencing(
	db: &SqlitePool,
	tn_id: TnId,
	smt_id: i64,
) -> FbResult<Vec<i64>> {
	let rows = sqlx::query(
		"SELECT DISTINCT dst_id FROM dist_type_modules WHERE tn_id = ? AND smt_id = ? ORDER BY dst_id",
	)
	.bind(tn_id.0)
	.bind(smt_id)
	.fetch_all(db)
	.await
	.map_err(db_err)?;

	collect_res(rows.iter().map(|row| row.try_get("dst_id")))
}

// vim: ts=4
