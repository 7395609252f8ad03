//! Catalog service with request validation and reference checks

use std::collections::HashSet;
use std::sync::Arc;

use fleetbase_types::deployment_adapter::DeploymentRefAdapter;
use fleetbase_types::meta_adapter::{
	CreateDistSetType, CreateModuleType, DistSetType, MetaAdapter, ModuleType, UpdateDistSetTypeData,
	UpdateModuleTypeData,
};

use crate::composition::{Composition, MemberKind};
use crate::prelude::*;
use crate::query::{ListParams, Page, PageRequest};

pub const MAX_KEY_LEN: usize = 64;
pub const MAX_NAME_LEN: usize = 64;
pub const MAX_DESCRIPTION_LEN: usize = 512;

fn check_text(field: &str, value: &str, max_len: usize) -> FbResult<()> {
	if value.trim().is_empty() {
		return Err(Error::ValidationError(format!("{} must not be empty", field)));
	}
	if value.chars().count() > max_len {
		return Err(Error::ValidationError(format!(
			"{} must be at most {} characters",
			field, max_len
		)));
	}
	Ok(())
}

fn check_description(description: Option<&str>) -> FbResult<()> {
	match description {
		Some(d) if d.chars().count() > MAX_DESCRIPTION_LEN => Err(Error::ValidationError(format!(
			"description must be at most {} characters",
			MAX_DESCRIPTION_LEN
		))),
		_ => Ok(()),
	}
}

/// Rejects a key or name used twice within one bulk request
fn check_batch_unique<'a>(entries: impl Iterator<Item = (&'a str, &'a str)>) -> FbResult<()> {
	let mut keys = HashSet::new();
	let mut names = HashSet::new();
	for (key, name) in entries {
		if !keys.insert(key) {
			return Err(Error::Conflict(format!("key '{}' is used more than once", key)));
		}
		if !names.insert(name) {
			return Err(Error::Conflict(format!("name '{}' is used more than once", name)));
		}
	}
	Ok(())
}

/// Validates the name and description fields of a patch
fn check_patch(name: &Patch<Box<str>>, description: &Patch<Box<str>>) -> FbResult<()> {
	match name {
		Patch::Null => return Err(Error::ValidationError("name must not be empty".into())),
		Patch::Value(name) => check_text("name", name, MAX_NAME_LEN)?,
		Patch::Undefined => {}
	}
	if let Patch::Value(description) = description {
		check_description(Some(description))?;
	}
	Ok(())
}

/// Catalog service - CRUD of module types and distribution set types
pub struct CatalogService {
	meta: Arc<dyn MetaAdapter>,
	refs: Arc<dyn DeploymentRefAdapter>,
	max_page_limit: u32,
}

impl CatalogService {
	pub fn new(
		meta: Arc<dyn MetaAdapter>,
		refs: Arc<dyn DeploymentRefAdapter>,
		max_page_limit: u32,
	) -> Self {
		Self { meta, refs, max_page_limit }
	}

	// Software module types
	//***********************
	pub async fn list_module_types(
		&self,
		tn_id: TnId,
		params: &ListParams,
	) -> FbResult<Page<ModuleType>> {
		let request = PageRequest::parse::<ModuleType>(params, self.max_page_limit)?;
		let types = self.meta.list_module_types(tn_id).await?;
		Ok(request.apply(types))
	}

	pub async fn get_module_type(&self, tn_id: TnId, smt_id: i64) -> FbResult<ModuleType> {
		self.meta.read_module_type(tn_id, smt_id).await
	}

	/// Create module types, all or none
	pub async fn create_module_types(
		&self,
		tn_id: TnId,
		types: &[CreateModuleType],
	) -> FbResult<Vec<ModuleType>> {
		for t in types {
			check_text("key", &t.key, MAX_KEY_LEN)?;
			check_text("name", &t.name, MAX_NAME_LEN)?;
			check_description(t.description.as_deref())?;
			if t.max_assignments < 1 {
				return Err(Error::ValidationError("maxAssignments must be at least 1".into()));
			}
		}
		check_batch_unique(types.iter().map(|t| (&*t.key, &*t.name)))?;
		if types.is_empty() {
			return Ok(Vec::new());
		}

		let created = self.meta.create_module_types(tn_id, types).await?;
		info!("Created {} module types for tn_id={}", created.len(), tn_id);
		Ok(created)
	}

	pub async fn update_module_type(
		&self,
		tn_id: TnId,
		smt_id: i64,
		data: &UpdateModuleTypeData,
	) -> FbResult<ModuleType> {
		check_patch(&data.name, &data.description)?;
		match data.max_assignments {
			Patch::Null | Patch::Value(0) => {
				return Err(Error::ValidationError("maxAssignments must be at least 1".into()));
			}
			Patch::Value(_) | Patch::Undefined => {}
		}
		self.meta.update_module_type(tn_id, smt_id, data).await
	}

	/// Delete a module type that no distribution set type or deployable set references
	pub async fn delete_module_type(&self, tn_id: TnId, smt_id: i64) -> FbResult<()> {
		self.meta.read_module_type(tn_id, smt_id).await?;

		let referencing = self.meta.list_dist_types_referencing(tn_id, smt_id).await?;
		if !referencing.is_empty() {
			return Err(Error::InUse(format!(
				"module type {} is a member of distribution set types {:?}",
				smt_id, referencing
			)));
		}
		if self.refs.is_module_type_in_use(tn_id, smt_id).await? {
			return Err(Error::InUse(format!(
				"module type {} is used by deployable sets",
				smt_id
			)));
		}

		self.meta.delete_module_type(tn_id, smt_id).await?;
		info!("Deleted module type {} for tn_id={}", smt_id, tn_id);
		Ok(())
	}

	// Distribution set types
	//************************
	pub async fn list_dist_types(
		&self,
		tn_id: TnId,
		params: &ListParams,
	) -> FbResult<Page<DistSetType>> {
		let request = PageRequest::parse::<DistSetType>(params, self.max_page_limit)?;
		let types = self.meta.list_dist_types(tn_id).await?;
		Ok(request.apply(types))
	}

	pub async fn get_dist_type(&self, tn_id: TnId, dst_id: i64) -> FbResult<DistSetType> {
		self.meta.read_dist_type(tn_id, dst_id).await
	}

	/// Create distribution set types with their initial membership, all or none
	pub async fn create_dist_types(
		&self,
		tn_id: TnId,
		types: &[CreateDistSetType],
	) -> FbResult<Vec<DistSetType>> {
		let mut member_ids = Vec::new();
		for t in types {
			check_text("key", &t.key, MAX_KEY_LEN)?;
			check_text("name", &t.name, MAX_NAME_LEN)?;
			check_description(t.description.as_deref())?;
			let composition = Composition::new(t.mandatory.iter().copied(), t.optional.iter().copied())?;
			member_ids.extend(composition.members(MemberKind::Mandatory));
			member_ids.extend(composition.members(MemberKind::Optional));
		}
		check_batch_unique(types.iter().map(|t| (&*t.key, &*t.name)))?;
		if types.is_empty() {
			return Ok(Vec::new());
		}

		member_ids.sort_unstable();
		member_ids.dedup();
		if !member_ids.is_empty() {
			let found = self.meta.read_module_types(tn_id, &member_ids).await?;
			if found.len() != member_ids.len() {
				debug!("Unknown module types among {:?} for tn_id={}", member_ids, tn_id);
				return Err(Error::NotFound);
			}
		}

		let created = self.meta.create_dist_types(tn_id, types).await?;
		info!("Created {} distribution set types for tn_id={}", created.len(), tn_id);
		Ok(created)
	}

	/// Update base fields; allowed even when the composition is locked
	pub async fn update_dist_type(
		&self,
		tn_id: TnId,
		dst_id: i64,
		data: &UpdateDistSetTypeData,
	) -> FbResult<DistSetType> {
		check_patch(&data.name, &data.description)?;
		self.meta.update_dist_type(tn_id, dst_id, data).await
	}

	/// Delete a distribution set type no deployable set references
	pub async fn delete_dist_type(&self, tn_id: TnId, dst_id: i64) -> FbResult<()> {
		self.meta.read_dist_type(tn_id, dst_id).await?;
		if self.refs.is_dist_type_in_use(tn_id, dst_id).await? {
			return Err(Error::InUse(format!(
				"distribution set type {} is used by deployable sets",
				dst_id
			)));
		}

		self.meta.delete_dist_type(tn_id, dst_id).await?;
		info!("Deleted distribution set type {} for tn_id={}", dst_id, tn_id);
		Ok(())
	}
}


// vim: ts=4
