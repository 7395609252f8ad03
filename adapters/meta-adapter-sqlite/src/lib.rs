//! SQLite implementation of the Fleetbase storage contract.
//!
//! One database file holds tenants, configuration overrides, the type catalog
//! and the deployable set references. Type catalog integrity (uniqueness,
//! disjoint membership, no orphaned members) is also enforced by the schema,
//! so it holds even against racing writers.

#![forbid(unsafe_code)]

use async_trait::async_trait;
use sqlx::sqlite::{self, SqlitePool};
use std::{fmt::Debug, path::Path};

use fleetbase_types::deployment_adapter::DeploymentRefAdapter;
use fleetbase_types::meta_adapter::{
	CreateDistSetType, CreateModuleType, DistSetType, MetaAdapter, ModuleType, StoredSetting,
	UpdateDistSetTypeData, UpdateModuleTypeData,
};
use fleetbase_types::prelude::*;

mod deployment;
mod dist_type;
mod module_type;
mod schema;
mod setting;
mod tenant;
mod utils;

pub use deployment::RefKind;

use crate::schema::init_db;

#[derive(Debug)]
pub struct MetaAdapterSqlite {
	db: SqlitePool,
}

impl MetaAdapterSqlite {
	/// Open (or create) `meta.db` inside `dir`
	pub async fn new(dir: impl AsRef<Path>) -> FbResult<Self> {
		tokio::fs::create_dir_all(dir.as_ref()).await?;
		let opts = sqlite::SqliteConnectOptions::new()
			.filename(dir.as_ref().join("meta.db"))
			.create_if_missing(true)
			.foreign_keys(true)
			.journal_mode(sqlite::SqliteJournalMode::Wal);
		let db = sqlite::SqlitePoolOptions::new()
			.max_connections(5)
			.connect_with(opts)
			.await
			.inspect_err(|err| error!("DB: {:#?}", err))
			.or(Err(Error::DbError))?;

		init_db(&db)
			.await
			.inspect_err(|err| error!("DB: {:#?}", err))
			.or(Err(Error::DbError))?;

		Ok(Self { db })
	}

	/// Record that a deployable set references a type.
	///
	/// A referenced distribution set type gets a new version, so a composition
	/// change racing with this call fails its version check and sees the lock
	/// on retry. Fails with `Error::NotFound` if the type does not exist.
	pub async fn add_deployment_ref(
		&self,
		tn_id: TnId,
		kind: RefKind,
		type_id: i64,
		ref_id: &str,
	) -> FbResult<()> {
		deployment::add(&self.db, tn_id, kind, type_id, ref_id).await
	}

	/// Forget a deployable set reference, returning false if it was not recorded
	pub async fn remove_deployment_ref(
		&self,
		tn_id: TnId,
		kind: RefKind,
		type_id: i64,
		ref_id: &str,
	) -> FbResult<bool> {
		deployment::remove(&self.db, tn_id, kind, type_id, ref_id).await
	}
}

#[async_trait]
impl MetaAdapter for MetaAdapterSqlite {
	// Tenants
	//*********
	async fn read_tn_id(&self, name: &str) -> FbResult<TnId> {
		tenant::read_tn_id(&self.db, name).await
	}

	async fn create_tenant(&self, name: &str) -> FbResult<TnId> {
		tenant::create(&self.db, name).await
	}

	// Configuration values
	//**********************
	async fn list_settings(&self, tn_id: TnId) -> FbResult<Vec<StoredSetting>> {
		setting::list(&self.db, tn_id).await
	}

	async fn read_setting(&self, tn_id: TnId, key: &str) -> FbResult<Option<StoredSetting>> {
		setting::read(&self.db, tn_id, key).await
	}

	async fn upsert_setting(
		&self,
		tn_id: TnId,
		key: &str,
		value: &serde_json::Value,
	) -> FbResult<StoredSetting> {
		setting::upsert(&self.db, tn_id, key, value).await
	}

	async fn delete_setting(&self, tn_id: TnId, key: &str) -> FbResult<bool> {
		setting::delete(&self.db, tn_id, key).await
	}

	// Software module types
	//***********************
	async fn list_module_types(&self, tn_id: TnId) -> FbResult<Vec<ModuleType>> {
		module_type::list(&self.db, tn_id).await
	}

	async fn read_module_type(&self, tn_id: TnId, smt_id: i64) -> FbResult<ModuleType> {
		module_type::read(&self.db, tn_id, smt_id).await
	}

	async fn read_module_types(&self, tn_id: TnId, smt_ids: &[i64]) -> FbResult<Vec<ModuleType>> {
		module_type::read_many(&self.db, tn_id, smt_ids).await
	}

	async fn create_module_types(
		&self,
		tn_id: TnId,
		types: &[CreateModuleType],
	) -> FbResult<Vec<ModuleType>> {
		module_type::create(&self.db, tn_id, types).await
	}

	async fn update_module_type(
		&self,
		tn_id: TnId,
		smt_id: i64,
		data: &UpdateModuleTypeData,
	) -> FbResult<ModuleType> {
		module_type::update(&self.db, tn_id, smt_id, data).await
	}

	async fn delete_module_type(&self, tn_id: TnId, smt_id: i64) -> FbResult<()> {
		module_type::delete(&self.db, tn_id, smt_id).await
	}

	async fn list_dist_types_referencing(&self, tn_id: TnId, smt_id: i64) -> FbResult<Vec<i64>> {
		module_type::list_referencing(&self.db, tn_id, smt_id).await
	}

	// Distribution set types
	//************************
	async fn list_dist_types(&self, tn_id: TnId) -> FbResult<Vec<DistSetType>> {
		dist_type::list(&self.db, tn_id).await
	}

	async fn read_dist_type(&self, tn_id: TnId, dst_id: i64) -> FbResult<DistSetType> {
		dist_type::read(&self.db, tn_id, dst_id).await
	}

	async fn create_dist_types(
		&self,
		tn_id: TnId,
		types: &[CreateDistSetType],
	) -> FbResult<Vec<DistSetType>> {
		dist_type::create(&self.db, tn_id, types).await
	}

	async fn update_dist_type(
		&self,
		tn_id: TnId,
		dst_id: i64,
		data: &UpdateDistSetTypeData,
	) -> FbResult<DistSetType> {
		dist_type::update(&self.db, tn_id, dst_id, data).await
	}

	async fn delete_dist_type(&self, tn_id: TnId, dst_id: i64) -> FbResult<()> {
		dist_type::delete(&self.db, tn_id, dst_id).await
	}

	async fn list_dist_type_members(
		&self,
		tn_id: TnId,
		dst_id: i64,
		mandatory: bool,
	) -> FbResult<Vec<ModuleType>> {
		module_type::list_members(&self.db, tn_id, dst_id, mandatory).await
	}

	async fn write_dist_type_modules(
		&self,
		tn_id: TnId,
		dst_id: i64,
		expected_version: u32,
		mandatory: &[i64],
		optional: &[i64],
	) -> FbResult<Option<DistSetType>> {
		dist_type::write_modules(&self.db, tn_id, dst_id, expected_version, mandatory, optional)
			.await
	}
}

#[async_trait]
impl DeploymentRefAdapter for MetaAdapterSqlite {
	async fn is_dist_type_in_use(&self, tn_id: TnId, dst_id: i64) -> FbResult<bool> {
		deployment::is_in_use(&self.db, tn_id, RefKind::DistType, dst_id).await
	}

	async fn is_module_type_in_use(&self, tn_id: TnId, smt_id: i64) -> FbResult<bool> {
		deployment::is_in_use(&self.db, tn_id, RefKind::ModuleType, smt_id).await
	}
}

// vim: ts=4
