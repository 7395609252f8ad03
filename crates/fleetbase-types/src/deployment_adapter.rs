//! Deployable-set reference check.
//!
//! Deployable sets live outside this engine. The engine only asks whether any
//! of them references a given type, to lock compositions and block deletes.
//!
//! A store recording references next to the catalog must advance the version
//! of a distribution set type in the same transaction that records a
//! reference to it. A composition write based on an earlier check then fails
//! its version check and is retried against the new lock.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::prelude::*;

#[async_trait]
pub trait DeploymentRefAdapter: Debug + Send + Sync {
	/// Does any deployable set instantiate the distribution set type?
	async fn is_dist_type_in_use(&self, tn_id: TnId, dst_id: i64) -> FbResult<bool>;
	/// Does any deployable set contain a module of the software module type?
	async fn is_module_type_in_use(&self, tn_id: TnId, smt_id: i64) -> FbResult<bool>;
}

/// Reference check for installations without deployable sets: nothing is ever in use
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDeploymentRefs;

#[async_trait]
impl DeploymentRefAdapter for NoDeploymentRefs {
	async fn is_dist_type_in_use(&self, _tn_id: TnId, _dst_id: i64) -> FbResult<bool> {
		Ok(false)
	}

	async fn is_module_type_in_use(&self, _tn_id: TnId, _smt_id: i64) -> FbResult<bool> {
		Ok(false)
	}
}


// vim: ts=4
