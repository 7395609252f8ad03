//! Storage contract for configuration values and the type catalog.
//!
//! Implementations must make every method atomic. The only multi-step write,
//! [`MetaAdapter::write_dist_type_modules`], is additionally guarded by the
//! aggregate's `version`, which gives per-aggregate serializable isolation
//! without holding locks across calls.

use async_trait::async_trait;
use serde::Serialize;
use serde_with::skip_serializing_none;
use std::fmt::Debug;

use crate::prelude::*;

/// Stored per-tenant override of a configuration key
#[derive(Debug, Clone)]
pub struct StoredSetting {
	pub key: Box<str>,
	pub value: serde_json::Value,
	pub created_at: Timestamp,
	pub updated_at: Timestamp,
}

// Software module types //
//***********************//
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleType {
	#[serde(rename = "id")]
	pub smt_id: i64,
	pub key: Box<str>,
	pub name: Box<str>,
	pub description: Option<Box<str>>,
	pub colour: Option<Box<str>>,
	/// 1 means exactly one module of this type per deployable set
	pub max_assignments: u32,
	pub created_at: Timestamp,
	#[serde(rename = "lastModifiedAt")]
	pub updated_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct CreateModuleType {
	pub key: Box<str>,
	pub name: Box<str>,
	pub description: Option<Box<str>>,
	pub colour: Option<Box<str>>,
	pub max_assignments: u32,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateModuleTypeData {
	pub name: Patch<Box<str>>,
	pub description: Patch<Box<str>>,
	pub colour: Patch<Box<str>>,
	pub max_assignments: Patch<u32>,
}

// Distribution set types //
//************************//
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistSetType {
	#[serde(rename = "id")]
	pub dst_id: i64,
	pub key: Box<str>,
	pub name: Box<str>,
	pub description: Option<Box<str>>,
	pub colour: Option<Box<str>>,
	/// Mandatory module type ids, ascending
	#[serde(rename = "mandatoryModuleTypes")]
	pub mandatory: Vec<i64>,
	/// Optional module type ids, ascending
	#[serde(rename = "optionalModuleTypes")]
	pub optional: Vec<i64>,
	#[serde(skip)]
	pub version: u32,
	pub created_at: Timestamp,
	#[serde(rename = "lastModifiedAt")]
	pub updated_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct CreateDistSetType {
	pub key: Box<str>,
	pub name: Box<str>,
	pub description: Option<Box<str>>,
	pub colour: Option<Box<str>>,
	pub mandatory: Vec<i64>,
	pub optional: Vec<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateDistSetTypeData {
	pub name: Patch<Box<str>>,
	pub description: Patch<Box<str>>,
	pub colour: Patch<Box<str>>,
}

#[async_trait]
pub trait MetaAdapter: Debug + Send + Sync {
	// Tenants
	//*********
	/// Resolves a tenant name, `Error::NotFound` if it was never registered
	async fn read_tn_id(&self, name: &str) -> FbResult<TnId>;
	/// Registers a tenant name, returning the existing id if already known
	async fn create_tenant(&self, name: &str) -> FbResult<TnId>;

	// Configuration values
	//**********************
	async fn list_settings(&self, tn_id: TnId) -> FbResult<Vec<StoredSetting>>;
	async fn read_setting(&self, tn_id: TnId, key: &str) -> FbResult<Option<StoredSetting>>;
	/// Inserts or replaces the override, keeping the original creation time
	async fn upsert_setting(
		&self,
		tn_id: TnId,
		key: &str,
		value: &serde_json::Value,
	) -> FbResult<StoredSetting>;
	/// Returns false if no override existed
	async fn delete_setting(&self, tn_id: TnId, key: &str) -> FbResult<bool>;

	// Software module types
	//***********************
	async fn list_module_types(&self, tn_id: TnId) -> FbResult<Vec<ModuleType>>;
	async fn read_module_type(&self, tn_id: TnId, smt_id: i64) -> FbResult<ModuleType>;
	/// Reads the given ids, silently skipping unknown ones. Result is sorted by id.
	async fn read_module_types(&self, tn_id: TnId, smt_ids: &[i64]) -> FbResult<Vec<ModuleType>>;
	/// Creates all or none. Duplicate key or name fails with `Error::Conflict`.
	async fn create_module_types(
		&self,
		tn_id: TnId,
		types: &[CreateModuleType],
	) -> FbResult<Vec<ModuleType>>;
	async fn update_module_type(
		&self,
		tn_id: TnId,
		smt_id: i64,
		data: &UpdateModuleTypeData,
	) -> FbResult<ModuleType>;
	/// Fails with `Error::InUse` if a distribution set type or a deployable set
	/// still references it. The reference check and the delete are one atomic step.
	async fn delete_module_type(&self, tn_id: TnId, smt_id: i64) -> FbResult<()>;
	/// Ids of distribution set types referencing the module type in either set
	async fn list_dist_types_referencing(&self, tn_id: TnId, smt_id: i64) -> FbResult<Vec<i64>>;

	// Distribution set types
	//************************
	async fn list_dist_types(&self, tn_id: TnId) -> FbResult<Vec<DistSetType>>;
	async fn read_dist_type(&self, tn_id: TnId, dst_id: i64) -> FbResult<DistSetType>;
	/// Creates all or none, including initial membership
	async fn create_dist_types(
		&self,
		tn_id: TnId,
		types: &[CreateDistSetType],
	) -> FbResult<Vec<DistSetType>>;
	async fn update_dist_type(
		&self,
		tn_id: TnId,
		dst_id: i64,
		data: &UpdateDistSetTypeData,
	) -> FbResult<DistSetType>;
	/// Fails with `Error::InUse` if a deployable set references it. The
	/// reference check and the delete are one atomic step.
	async fn delete_dist_type(&self, tn_id: TnId, dst_id: i64) -> FbResult<()>;
	/// Members of one set of a distribution set type, sorted by id.
	///
	/// The aggregate and its members are read as one snapshot. Fails with
	/// `Error::NotFound` if the distribution set type does not exist.
	async fn list_dist_type_members(
		&self,
		tn_id: TnId,
		dst_id: i64,
		mandatory: bool,
	) -> FbResult<Vec<ModuleType>>;
	/// Replaces the full membership of a distribution set type.
	///
	/// The write happens only if the stored version still equals
	/// `expected_version`; the version is then incremented. Returns `None` when
	/// the version moved on (stale read), leaving the stored state unchanged.
	/// A member id that does not exist fails with `Error::NotFound`.
	async fn write_dist_type_modules(
		&self,
		tn_id: TnId,
		dst_id: i64,
		expected_version: u32,
		mandatory: &[i64],
		optional: &[i64],
	) -> FbResult<Option<DistSetType>>;
}

// vim: ts=4
