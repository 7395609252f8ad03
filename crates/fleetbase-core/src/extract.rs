//! Custom extractors for Fleetbase-specific data

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::app::AppState;
use crate::prelude::*;

pub use fleetbase_types::extract::{TenantName, TnIdResolver};

// Implement TnIdResolver for AppState so TnId can be extracted from requests.
// The blanket impl `TnIdResolver for Arc<T>` in fleetbase-types makes this
// work for `App = Arc<AppState>` automatically.
#[async_trait]
impl TnIdResolver for AppState {
	async fn resolve_tn_id(&self, tenant: &str) -> Result<TnId, Error> {
		if let Some(tn_id) = self.tenants.get(tenant) {
			return Ok(tn_id);
		}

		let tn_id = if self.opts.auto_register_tenants {
			self.meta_adapter.create_tenant(tenant).await?
		} else {
			self.meta_adapter.read_tn_id(tenant).await.map_err(|err| match err {
				Error::NotFound => Error::PermissionDenied,
				err => err,
			})?
		};
		debug!("Resolved tenant {} to tn_id={}", tenant, tn_id);
		self.tenants.put(tenant, tn_id);
		Ok(tn_id)
	}
}

// RequestId //
//***********//
/// Request ID for tracing and debugging
#[derive(Clone, Debug)]
pub struct RequestId(pub String);

/// Optional Request ID extractor - always succeeds, returns None if not available
#[derive(Clone, Debug)]
pub struct OptionalRequestId(pub Option<String>);

impl<S> FromRequestParts<S> for OptionalRequestId
where
	S: Send + Sync,
{
	type Rejection = Error;

	async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
		let req_id = parts.extensions.get::<RequestId>().map(|r| r.0.clone());
		Ok(OptionalRequestId(req_id))
	}
}

// vim: ts=4
