//! Database schema initialization
//!
//! Tables are created idempotently in one transaction at adapter start.

use sqlx::SqlitePool;

/// Initialize the database schema with all required tables and indexes
pub(crate) async fn init_db(db: &SqlitePool) -> Result<(), sqlx::Error> {
	let mut tx = db.begin().await?;

	// Tenants
	//*********
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS tenants (
		tn_id integer NOT NULL,
		name text NOT NULL,
		created_at datetime DEFAULT (unixepoch()),
		PRIMARY KEY(tn_id)
	)",
	)
	.execute(&mut *tx)
	.await?;
	sqlx::query("CREATE UNIQUE INDEX IF NOT EXISTS idx_tenants_name ON tenants(name)")
		.execute(&mut *tx)
		.await?;

	// Configuration values
	//**********************
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS settings (
		tn_id integer NOT NULL,
		name text NOT NULL,
		value text NOT NULL,
		created_at datetime DEFAULT (unixepoch()),
		updated_at datetime DEFAULT (unixepoch()),
		PRIMARY KEY(tn_id, name)
	)",
	)
	.execute(&mut *tx)
	.await?;

	// Software module types
	//***********************
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS module_types (
		smt_id integer NOT NULL,
		tn_id integer NOT NULL,
		key text NOT NULL,
		name text NOT NULL,
		description text,
		colour text,
		max_assignments integer NOT NULL DEFAULT 1,
		created_at datetime DEFAULT (unixepoch()),
		updated_at datetime DEFAULT (unixepoch()),
		PRIMARY KEY(smt_id)
	)",
	)
	.execute(&mut *tx)
	.await?;
	sqlx::query(
		"CREATE UNIQUE INDEX IF NOT EXISTS idx_module_types_tnid ON module_types(tn_id, smt_id)",
	)
	.execute(&mut *tx)
	.await?;
	sqlx::query("CREATE UNIQUE INDEX IF NOT EXISTS idx_module_types_key ON module_types(tn_id, key)")
		.execute(&mut *tx)
		.await?;
	sqlx::query(
		"CREATE UNIQUE INDEX IF NOT EXISTS idx_module_types_name ON module_types(tn_id, name)",
	)
	.execute(&mut *tx)
	.await?;

	// Distribution set types
	//************************
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS dist_types (
		dst_id integer NOT NULL,
		tn_id integer NOT NULL,
		key text NOT NULL,
		name text NOT NULL,
		description text,
		colour text,
		version integer NOT NULL DEFAULT 0,
		created_at datetime DEFAULT (unixepoch()),
		updated_at datetime DEFAULT (unixepoch()),
		PRIMARY KEY(dst_id)
	)",
	)
	.execute(&mut *tx)
	.await?;
	sqlx::query("CREATE UNIQUE INDEX IF NOT EXISTS idx_dist_types_tnid ON dist_types(tn_id, dst_id)")
		.execute(&mut *tx)
		.await?;
	sqlx::query("CREATE UNIQUE INDEX IF NOT EXISTS idx_dist_types_key ON dist_types(tn_id, key)")
		.execute(&mut *tx)
		.await?;
	sqlx::query("CREATE UNIQUE INDEX IF NOT EXISTS idx_dist_types_name ON dist_types(tn_id, name)")
		.execute(&mut *tx)
		.await?;

	// A module type is in at most one of the two sets of a distribution set type
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS dist_type_modules (
		tn_id integer NOT NULL,
		dst_id integer NOT NULL,
		smt_id integer NOT NULL,
		mandatory boolean NOT NULL,
		PRIMARY KEY(dst_id, smt_id),
		FOREIGN KEY(tn_id, dst_id) REFERENCES dist_types(tn_id, dst_id) ON DELETE CASCADE,
		FOREIGN KEY(tn_id, smt_id) REFERENCES module_types(tn_id, smt_id) ON DELETE RESTRICT
	)",
	)
	.execute(&mut *tx)
	.await?;
	sqlx::query(
		"CREATE INDEX IF NOT EXISTS idx_dist_type_modules_smt ON dist_type_modules(tn_id, smt_id)",
	)
	.execute(&mut *tx)
	.await?;

	// Deployable set references
	//***************************
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS deployment_refs (
		tn_id integer NOT NULL,
		kind char(1) NOT NULL,
		type_id integer NOT NULL,
		ref_id text NOT NULL,
		created_at datetime DEFAULT (unixepoch()),
		PRIMARY KEY(tn_id, kind, type_id, ref_id)
	)",
	)
	.execute(&mut *tx)
	.await?;

	tx.commit().await?;

	Ok(())
}

// vim: ts=4
