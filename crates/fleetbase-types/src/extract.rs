//! Custom Axum extractors for tenant resolution.
//!
//! Tenant resolution is done by whatever sits in front of the engine. The
//! binding passes the tenant name in the `X-Tenant` header; `TnId` is then
//! resolved through any state implementing [`TnIdResolver`].

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::Error;
use crate::types::TnId;

pub const TENANT_HEADER: &str = "x-tenant";
const MAX_TENANT_NAME_LEN: usize = 128;

// TenantName //
//************//
/// Tenant name taken from the `X-Tenant` request header
#[derive(Clone, Debug)]
pub struct TenantName(pub Box<str>);

impl TenantName {
	pub fn new(name: &str) -> TenantName {
		TenantName(Box::from(name))
	}
}

fn tenant_name_from_parts(parts: &Parts) -> Result<TenantName, Error> {
	let name = parts
		.headers
		.get(TENANT_HEADER)
		.and_then(|h| h.to_str().ok())
		.map(str::trim)
		.filter(|name| !name.is_empty())
		.ok_or(Error::PermissionDenied)?;

	if name.len() > MAX_TENANT_NAME_LEN
		|| !name.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
	{
		return Err(Error::ValidationError(format!("invalid tenant name: {}", name)));
	}
	Ok(TenantName::new(name))
}

impl<S> FromRequestParts<S> for TenantName
where
	S: Send + Sync,
{
	type Rejection = Error;

	async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
		tenant_name_from_parts(parts)
	}
}

// TnId //
//******//
/// Trait for resolving `TnId` from a tenant name.
///
/// Implement this on your application state type to enable the
/// `TnId` Axum extractor.
#[async_trait]
pub trait TnIdResolver: Send + Sync {
	async fn resolve_tn_id(&self, tenant: &str) -> Result<TnId, Error>;
}

/// Blanket impl for `Arc<T>` so that `App = Arc<AppState>` works
/// when `AppState` implements `TnIdResolver`.
#[async_trait]
impl<T: TnIdResolver> TnIdResolver for Arc<T> {
	async fn resolve_tn_id(&self, tenant: &str) -> Result<TnId, Error> {
		(**self).resolve_tn_id(tenant).await
	}
}

impl<S> FromRequestParts<S> for TnId
where
	S: TnIdResolver + Send + Sync,
{
	type Rejection = Error;

	async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
		let tenant = tenant_name_from_parts(parts)?;
		state.resolve_tn_id(&tenant.0).await
	}
}


// vim: ts=4
