//! Distribution set type storage, including membership
//!
//! Membership rows are only ever written as a whole, together with a bump of
//! the aggregate's `version`.

use sqlx::{Row, Sqlite, SqliteConnection, SqlitePool, sqlite::SqliteRow};

use crate::deployment::{RefKind, type_exists};
use crate::utils::*;
use fleetbase_types::meta_adapter::{CreateDistSetType, DistSetType, UpdateDistSetTypeData};
use fleetbase_types::prelude::*;

/// Aggregate select with the member id lists, followed by the given clause
macro_rules! select {
	($clause:literal) => {
		concat!(
			"SELECT d.dst_id, d.key, d.name, d.description, d.colour, d.version,
			d.created_at, d.updated_at,
			(SELECT group_concat(m.smt_id) FROM dist_type_modules m
				WHERE m.dst_id = d.dst_id AND m.mandatory = 1) AS mandatory,
			(SELECT group_concat(m.smt_id) FROM dist_type_modules m
				WHERE m.dst_id = d.dst_id AND m.mandatory = 0) AS optional
			FROM dist_types d ",
			$clause
		)
	};
}

fn from_row(row: &SqliteRow) -> Result<DistSetType, sqlx::Error> {
	Ok(DistSetType {
		dst_id: row.try_get("dst_id")?,
		key: row.try_get("key")?,
		name: row.try_get("name")?,
		description: row.try_get("description")?,
		colour: row.try_get("colour")?,
		mandatory: parse_id_list(row.try_get("mandatory")?)?,
		optional: parse_id_list(row.try_get("optional")?)?,
		version: row.try_get("version")?,
		created_at: row.try_get("created_at").map(Timestamp)?,
		updated_at: row.try_get("updated_at").map(Timestamp)?,
	})
}

fn on_unknown_member() -> Error {
	Error::NotFound
}

pub(crate) async fn list(db: &SqlitePool, tn_id: TnId) -> FbResult<Vec<DistSetType>> {
	let rows = sqlx::query(select!("WHERE d.tn_id = ? ORDER BY d.dst_id"))
		.bind(tn_id.0)
		.fetch_all(db)
		.await
		.map_err(db_err)?;

	collect_res(rows.iter().map(from_row))
}

pub(crate) async fn read<'e, E>(db: E, tn_id: TnId, dst_id: i64) -> FbResult<DistSetType>
where
	E: sqlx::Executor<'e, Database = Sqlite>,
{
	let res = sqlx::query(select!("WHERE d.tn_id = ? AND d.dst_id = ?"))
		.bind(tn_id.0)
		.bind(dst_id)
		.fetch_one(db)
		.await;

	map_res(res, |row| from_row(&row))
}

async fn insert_members(
	conn: &mut SqliteConnection,
	tn_id: TnId,
	dst_id: i64,
	ids: &[i64],
	mandatory: bool,
) -> FbResult<()> {
	for smt_id in ids {
		sqlx::query(
			"INSERT INTO dist_type_modules (tn_id, dst_id, smt_id, mandatory) VALUES (?, ?, ?, ?)",
		)
		.bind(tn_id.0)
		.bind(dst_id)
		.bind(smt_id)
		.bind(mandatory)
		.execute(&mut *conn)
		.await
		.map_err(|err| write_err(err, on_unknown_member))?;
	}
	Ok(())
}

/// Create all or none, including initial membership
pub(crate) async fn create(
	db: &SqlitePool,
	tn_id: TnId,
	types: &[CreateDistSetType],
) -> FbResult<Vec<DistSetType>> {
	let mut tx = db.begin().await.map_err(db_err)?;
	let mut ids = Vec::with_capacity(types.len());

	for t in types {
		let row = sqlx::query(
			"INSERT INTO dist_types (tn_id, key, name, description, colour, version, created_at, updated_at)
			VALUES (?, ?, ?, ?, ?, 0, unixepoch(), unixepoch())
			RETURNING dst_id",
		)
		.bind(tn_id.0)
		.bind(&*t.key)
		.bind(&*t.name)
		.bind(t.description.as_deref())
		.bind(t.colour.as_deref())
		.fetch_one(&mut *tx)
		.await
		.map_err(|err| write_err(err, || Error::Internal("unexpected foreign key".into())))?;
		let dst_id: i64 = row.try_get("dst_id").map_err(db_err)?;

		insert_members(&mut tx, tn_id, dst_id, &t.mandatory, true).await?;
		insert_members(&mut tx, tn_id, dst_id, &t.optional, false).await?;
		ids.push(dst_id);
	}

	let mut created = Vec::with_capacity(ids.len());
	for dst_id in ids {
		created.push(read(&mut *tx, tn_id, dst_id).await?);
	}

	tx.commit().await.map_err(db_err)?;
	Ok(created)
}

pub(crate) async fn update(
	db: &SqlitePool,
	tn_id: TnId,
	dst_id: i64,
	data: &UpdateDistSetTypeData,
) -> FbResult<DistSetType> {
	let mut query = sqlx::QueryBuilder::new("UPDATE dist_types SET ");
	let mut has_updates = false;

	has_updates = push_patch!(query, has_updates, "name", &data.name, |v| v.to_string());
	has_updates =
		push_patch!(query, has_updates, "description", &data.description, |v| v.to_string());
	has_updates = push_patch!(query, has_updates, "colour", &data.colour, |v| v.to_string());

	if !has_updates {
		return read(db, tn_id, dst_id).await;
	}

	query.push(", updated_at=unixepoch() WHERE tn_id = ");
	query.push_bind(tn_id.0).push(" AND dst_id = ").push_bind(dst_id);

	let res = query
		.build()
		.execute(db)
		.await
		.map_err(|err| write_err(err, || Error::Internal("unexpected foreign key".into())))?;
	if res.rows_affected() == 0 {
		return Err(Error::NotFound);
	}

	read(db, tn_id, dst_id).await
}

/// Delete, cascading to membership rows, unless a deployable set references it
pub(crate) async fn delete(db: &SqlitePool, tn_id: TnId, dst_id: i64) -> FbResult<()> {
	let mut tx = db.begin().await.map_err(db_err)?;

	let res = sqlx::query(
		"DELETE FROM dist_types WHERE tn_id = ? AND dst_id = ?
		AND NOT EXISTS (SELECT 1 FROM deployment_refs WHERE tn_id = ? AND kind = ? AND type_id = ?)",
	)
	.bind(tn_id.0)
	.bind(dst_id)
	.bind(tn_id.0)
	.bind(RefKind::DistType.code())
	.bind(dst_id)
	.execute(&mut *tx)
	.await
	.map_err(db_err)?;

	if res.rows_affected() == 0 {
		return Err(if type_exists(&mut tx, tn_id, RefKind::DistType, dst_id).await? {
			Error::InUse(format!("distribution set type {} is used by deployable sets", dst_id))
		} else {
			Error::NotFound
		});
	}

	tx.commit().await.map_err(db_err)?;
	Ok(())
}

/// Replace the membership if the stored version still equals `expected_version`
pub(crate) async fn write_modules(
	db: &SqlitePool,
	tn_id: TnId,
	dst_id: i64,
	expected_version: u32,
	mandatory: &[i64],
	optional: &[i64],
) -> FbResult<Option<DistSetType>> {
	let mut tx = db.begin().await.map_err(db_err)?;

	let res = sqlx::query(
		"UPDATE dist_types SET version = version + 1, updated_at = unixepoch()
		WHERE tn_id = ? AND dst_id = ? AND version = ?",
	)
	.bind(tn_id.0)
	.bind(dst_id)
	.bind(expected_version)
	.execute(&mut *tx)
	.await
	.map_err(db_err)?;

	if res.rows_affected() == 0 {
		let exists = sqlx::query("SELECT 1 FROM dist_types WHERE tn_id = ? AND dst_id = ?")
			.bind(tn_id.0)
			.bind(dst_id)
			.fetch_optional(&mut *tx)
			.await
			.map_err(db_err)?
			.is_some();
		return if exists { Ok(None) } else { Err(Error::NotFound) };
	}

	sqlx::query("DELETE FROM dist_type_modules WHERE dst_id = ?")
		.bind(dst_id)
		.execute(&mut *tx)
		.await
		.map_err(db_err)?;
	insert_members(&mut tx, tn_id, dst_id, mandatory, true).await?;
	insert_members(&mut tx, tn_id, dst_id, optional, false).await?;

	let dst = read(&mut *tx, tn_id, dst_id).await?;
	tx.commit().await.map_err(db_err)?;
	Ok(Some(dst))
}

// vim: ts=4
