//! Configuration management handlers

use axum::{
	Json,
	extract::{Path, State},
	http::StatusCode,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use fleetbase_core::settings::ConfigEntry;

use crate::{prelude::*, response::ApiResponse};

/// A resolved configuration value together with its key
#[derive(Serialize)]
pub struct ConfigResponse {
	pub key: Box<str>,
	#[serde(flatten)]
	pub entry: ConfigEntry,
}

impl From<ConfigEntry> for ConfigResponse {
	fn from(entry: ConfigEntry) -> Self {
		Self { key: entry.key.clone(), entry }
	}
}

/// GET /system/configs - Every registered key with its value for the tenant
pub async fn list_configs(
	State(app): State<App>,
	tn_id: TnId,
	OptionalRequestId(req_id): OptionalRequestId,
) -> FbResult<(StatusCode, Json<ApiResponse<BTreeMap<Box<str>, ConfigEntry>>>)> {
	let configs = app.settings.list(tn_id).await?;
	let response = ApiResponse::new(configs).with_req_id(req_id);

	Ok((StatusCode::OK, Json(response)))
}

/// GET /system/configs/{key}
pub async fn get_config(
	State(app): State<App>,
	tn_id: TnId,
	Path(key): Path<String>,
	OptionalRequestId(req_id): OptionalRequestId,
) -> FbResult<(StatusCode, Json<ApiResponse<ConfigResponse>>)> {
	let entry = app.settings.get(tn_id, &key).await?;
	let response = ApiResponse::new(ConfigResponse::from(entry)).with_req_id(req_id);

	Ok((StatusCode::OK, Json(response)))
}

#[derive(Deserialize)]
pub struct UpdateConfigRequest {
	pub value: serde_json::Value,
}

/// PUT /system/configs/{key} - Store a tenant override
pub async fn put_config(
	State(app): State<App>,
	tn_id: TnId,
	Path(key): Path<String>,
	OptionalRequestId(req_id): OptionalRequestId,
	Json(req): Json<UpdateConfigRequest>,
) -> FbResult<(StatusCode, Json<ApiResponse<ConfigResponse>>)> {
	info!(tn_id = ?tn_id, key = %key, "PUT /system/configs - Setting configuration value");

	let entry = app.settings.set(tn_id, &key, &req.value).await?;
	let response = ApiResponse::new(ConfigResponse::from(entry)).with_req_id(req_id);

	Ok((StatusCode::OK, Json(response)))
}

/// DELETE /system/configs/{key} - Drop the tenant override, reverting to the default
pub async fn delete_config(
	State(app): State<App>,
	tn_id: TnId,
	Path(key): Path<String>,
) -> FbResult<StatusCode> {
	info!(tn_id = ?tn_id, key = %key, "DELETE /system/configs - Resetting configuration value");

	app.settings.delete(tn_id, &key).await?;
	Ok(StatusCode::NO_CONTENT)
}

// vim: ts=4
