//! Composition manager: mandatory and optional module types of distribution set types
//!
//! Every mutation reads the aggregate, checks the membership rules against
//! that fresh state and writes the whole membership back with the version it
//! read. A concurrent writer makes the write stale; the mutation then starts
//! over from a fresh read, so two racing calls can never both commit a state
//! the rules forbid. Recording a deployable set reference also moves the
//! version on, so a lock taken between the check and the write is seen on the
//! next attempt.

use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;

use fleetbase_types::deployment_adapter::DeploymentRefAdapter;
use fleetbase_types::meta_adapter::{DistSetType, MetaAdapter, ModuleType};

use crate::prelude::*;

/// Attempts of a version-checked write before giving up with `Error::DbError`
pub const MAX_WRITE_ATTEMPTS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberKind {
	Mandatory,
	Optional,
}

impl MemberKind {
	pub fn other(self) -> MemberKind {
		match self {
			MemberKind::Mandatory => MemberKind::Optional,
			MemberKind::Optional => MemberKind::Mandatory,
		}
	}

	pub fn name(self) -> &'static str {
		match self {
			MemberKind::Mandatory => "mandatory",
			MemberKind::Optional => "optional",
		}
	}
}

/// Membership of one distribution set type. The two sets are always disjoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Composition {
	mandatory: BTreeSet<i64>,
	optional: BTreeSet<i64>,
}

impl Composition {
	pub fn new<M, O>(mandatory: M, optional: O) -> FbResult<Self>
	where
		M: IntoIterator<Item = i64>,
		O: IntoIterator<Item = i64>,
	{
		let mandatory: BTreeSet<i64> = mandatory.into_iter().collect();
		let optional: BTreeSet<i64> = optional.into_iter().collect();
		if let Some(id) = mandatory.intersection(&optional).next() {
			return Err(Error::Conflict(format!(
				"module type {} cannot be both mandatory and optional",
				id
			)));
		}
		Ok(Self { mandatory, optional })
	}

	/// Composition of a stored aggregate
	pub fn of(dst: &DistSetType) -> FbResult<Self> {
		Self::new(dst.mandatory.iter().copied(), dst.optional.iter().copied()).map_err(|err| {
			error!("Stored composition of dst {} is inconsistent: {}", dst.dst_id, err);
			Error::Internal(format!("inconsistent composition of distribution set type {}", dst.dst_id))
		})
	}

	pub fn members(&self, kind: MemberKind) -> &BTreeSet<i64> {
		match kind {
			MemberKind::Mandatory => &self.mandatory,
			MemberKind::Optional => &self.optional,
		}
	}

	fn members_mut(&mut self, kind: MemberKind) -> &mut BTreeSet<i64> {
		match kind {
			MemberKind::Mandatory => &mut self.mandatory,
			MemberKind::Optional => &mut self.optional,
		}
	}

	pub fn contains(&self, kind: MemberKind, smt_id: i64) -> bool {
		self.members(kind).contains(&smt_id)
	}

	/// Add a member, returning false if it was already in that set
	pub fn add(&mut self, kind: MemberKind, smt_id: i64) -> FbResult<bool> {
		if self.contains(kind.other(), smt_id) {
			return Err(Error::Conflict(format!(
				"module type {} is already {}",
				smt_id,
				kind.other().name()
			)));
		}
		Ok(self.members_mut(kind).insert(smt_id))
	}

	pub fn remove(&mut self, kind: MemberKind, smt_id: i64) -> FbResult<()> {
		if self.members_mut(kind).remove(&smt_id) { Ok(()) } else { Err(Error::NotFound) }
	}

	pub fn ids(&self, kind: MemberKind) -> Vec<i64> {
		self.members(kind).iter().copied().collect()
	}
}

/// Composition service - mutates and queries membership of distribution set types
pub struct CompositionService {
	meta: Arc<dyn MetaAdapter>,
	refs: Arc<dyn DeploymentRefAdapter>,
}

impl CompositionService {
	pub fn new(meta: Arc<dyn MetaAdapter>, refs: Arc<dyn DeploymentRefAdapter>) -> Self {
		Self { meta, refs }
	}

	async fn ensure_unlocked(&self, tn_id: TnId, dst_id: i64) -> FbResult<()> {
		if self.refs.is_dist_type_in_use(tn_id, dst_id).await? {
			debug!("Composition of dst {} is locked for tn_id={}", dst_id, tn_id);
			return Err(Error::Immutable);
		}
		Ok(())
	}

	/// Add a module type to one set, idempotently
	pub async fn add_member(
		&self,
		tn_id: TnId,
		dst_id: i64,
		kind: MemberKind,
		smt_id: i64,
	) -> FbResult<DistSetType> {
		for attempt in 1..=MAX_WRITE_ATTEMPTS {
			let dst = self.meta.read_dist_type(tn_id, dst_id).await?;
			self.meta.read_module_type(tn_id, smt_id).await?;
			self.ensure_unlocked(tn_id, dst_id).await?;

			let mut composition = Composition::of(&dst)?;
			if !composition.add(kind, smt_id)? {
				return Ok(dst);
			}

			if let Some(updated) = self.write(tn_id, &dst, &composition).await? {
				info!("Module type {} added as {} to dst {}", smt_id, kind.name(), dst_id);
				return Ok(updated);
			}
			debug!("Stale composition of dst {} on attempt {}, retrying", dst_id, attempt);
		}
		Err(gave_up(dst_id))
	}

	/// Remove a module type from one set
	pub async fn remove_member(
		&self,
		tn_id: TnId,
		dst_id: i64,
		kind: MemberKind,
		smt_id: i64,
	) -> FbResult<DistSetType> {
		for attempt in 1..=MAX_WRITE_ATTEMPTS {
			let dst = self.meta.read_dist_type(tn_id, dst_id).await?;
			self.ensure_unlocked(tn_id, dst_id).await?;

			let mut composition = Composition::of(&dst)?;
			composition.remove(kind, smt_id)?;

			if let Some(updated) = self.write(tn_id, &dst, &composition).await? {
				info!("Module type {} removed from {} of dst {}", smt_id, kind.name(), dst_id);
				return Ok(updated);
			}
			debug!("Stale composition of dst {} on attempt {}, retrying", dst_id, attempt);
		}
		Err(gave_up(dst_id))
	}

	/// Members of one set, sorted by module type id, read as one snapshot
	pub async fn list_members(
		&self,
		tn_id: TnId,
		dst_id: i64,
		kind: MemberKind,
	) -> FbResult<Vec<ModuleType>> {
		self.meta.list_dist_type_members(tn_id, dst_id, kind == MemberKind::Mandatory).await
	}

	/// A single member of one set, `Error::NotFound` if it is not a member
	pub async fn get_member(
		&self,
		tn_id: TnId,
		dst_id: i64,
		kind: MemberKind,
		smt_id: i64,
	) -> FbResult<ModuleType> {
		self.list_members(tn_id, dst_id, kind)
			.await?
			.into_iter()
			.find(|t| t.smt_id == smt_id)
			.ok_or(Error::NotFound)
	}

	async fn write(
		&self,
		tn_id: TnId,
		dst: &DistSetType,
		composition: &Composition,
	) -> FbResult<Option<DistSetType>> {
		self.meta
			.write_dist_type_modules(
				tn_id,
				dst.dst_id,
				dst.version,
				&composition.ids(MemberKind::Mandatory),
				&composition.ids(MemberKind::Optional),
			)
			.await
	}

	pub async fn add_mandatory(&self, tn_id: TnId, dst_id: i64, smt_id: i64) -> FbResult<DistSetType> {
		self.add_member(tn_id, dst_id, MemberKind::Mandatory, smt_id).await
	}

	pub async fn add_optional(&self, tn_id: TnId, dst_id: i64, smt_id: i64) -> FbResult<DistSetType> {
		self.add_member(tn_id, dst_id, MemberKind::Optional, smt_id).await
	}

	pub async fn remove_mandatory(
		&self,
		tn_id: TnId,
		dst_id: i64,
		smt_id: i64,
	) -> FbResult<DistSetType> {
		self.remove_member(tn_id, dst_id, MemberKind::Mandatory, smt_id).await
	}

	pub async fn remove_optional(
		&self,
		tn_id: TnId,
		dst_id: i64,
		smt_id: i64,
	) -> FbResult<DistSetType> {
		self.remove_member(tn_id, dst_id, MemberKind::Optional, smt_id).await
	}

	pub async fn list_mandatory(&self, tn_id: TnId, dst_id: i64) -> FbResult<Vec<ModuleType>> {
		self.list_members(tn_id, dst_id, MemberKind::Mandatory).await
	}

	pub async fn list_optional(&self, tn_id: TnId, dst_id: i64) -> FbResult<Vec<ModuleType>> {
		self.list_members(tn_id, dst_id, MemberKind::Optional).await
	}

	pub async fn get_mandatory(&self, tn_id: TnId, dst_id: i64, smt_id: i64) -> FbResult<ModuleType> {
		self.get_member(tn_id, dst_id, MemberKind::Mandatory, smt_id).await
	}

	pub async fn get_optional(&self, tn_id: TnId, dst_id: i64, smt_id: i64) -> FbResult<ModuleType> {
		self.get_member(tn_id, dst_id, MemberKind::Optional, smt_id).await
	}
}

fn gave_up(dst_id: i64) -> Error {
	warn!(
		"Composition of dst {} kept changing, giving up after {} attempts",
		dst_id, MAX_WRITE_ATTEMPTS
	);
	Error::DbError
}


// vim: ts=4
