//! Shared utilities for SQLite adapter
//!
//! This module contains helper functions, macros, and error mapping utilities
//! used across all domain modules.

use fleetbase_types::prelude::*;
use sqlx::sqlite::SqliteRow;

/// Helper for Patch fields - applies field to query with proper binding
/// Returns true if field was added (for tracking has_updates)
macro_rules! push_patch {
	($query:expr, $has_updates:expr, $field:literal, $patch:expr, |$v:ident| $convert:expr) => {{
		match $patch {
			Patch::Undefined => $has_updates,
			Patch::Null => {
				if $has_updates {
					$query.push(", ");
				}
				$query.push(concat!($field, "=NULL"));
				true
			}
			Patch::Value($v) => {
				if $has_updates {
					$query.push(", ");
				}
				$query.push(concat!($field, "=")).push_bind($convert);
				true
			}
		}
	}};
}

// Re-export for use in other modules
pub(crate) use push_patch;

/// Build an IN clause with parameterized ids
pub(crate) fn push_in_ids(query: &mut sqlx::QueryBuilder<'_, sqlx::Sqlite>, values: &[i64]) {
	query.push("(");
	let mut separated = query.separated(", ");
	for value in values {
		separated.push_bind(*value);
	}
	query.push(")");
}

/// Parse a `group_concat` id list, ascending
pub(crate) fn parse_id_list(s: Option<&str>) -> Result<Vec<i64>, sqlx::Error> {
	let mut ids = s
		.unwrap_or_default()
		.split(',')
		.map(str::trim)
		.filter(|s| !s.is_empty())
		.map(str::parse::<i64>)
		.collect::<Result<Vec<_>, _>>()
		.map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
	ids.sort_unstable();
	Ok(ids)
}

/// Log database error for debugging
pub(crate) fn inspect(err: &sqlx::Error) {
	warn!("DB: {:#?}", err);
}

/// Translate an error of a query that does not write
pub(crate) fn db_err(err: sqlx::Error) -> Error {
	match err {
		sqlx::Error::RowNotFound => Error::NotFound,
		err => {
			inspect(&err);
			Error::DbError
		}
	}
}

/// Translate an error of an insert or update.
///
/// Unique violations become `Conflict`, foreign key violations `on_fk`.
pub(crate) fn write_err(err: sqlx::Error, on_fk: impl FnOnce() -> Error) -> Error {
	if let sqlx::Error::Database(db_err) = &err {
		if db_err.is_unique_violation() {
			debug!("DB: unique violation: {}", db_err.message());
			return Error::Conflict("key or name is already in use".into());
		}
		if db_err.is_foreign_key_violation() {
			debug!("DB: foreign key violation: {}", db_err.message());
			return on_fk();
		}
	}
	db_err(err)
}

/// Map a single-row query result, translating SQL errors to FbResult
pub(crate) fn map_res<T, F>(row: Result<SqliteRow, sqlx::Error>, f: F) -> FbResult<T>
where
	F: FnOnce(SqliteRow) -> Result<T, sqlx::Error>,
{
	match row {
		Ok(row) => f(row).inspect_err(inspect).map_err(|_| Error::DbError),
		Err(err) => Err(db_err(err)),
	}
}

/// Collect an iterator of query results, translating errors
pub(crate) fn collect_res<T>(
	iter: impl Iterator<Item = Result<T, sqlx::Error>> + Unpin,
) -> FbResult<Vec<T>> {
	let mut items = Vec::new();
	for item in iter {
		items.push(item.inspect_err(inspect).map_err(|_| Error::DbError)?);
	}
	Ok(items)
}


// vim: ts=4
