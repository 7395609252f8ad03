//! Type catalog handlers

use axum::{
	Json,
	extract::{Path, Query, State},
	http::StatusCode,
};
use serde::Deserialize;

use fleetbase_core::query::ListParams;
use fleetbase_types::meta_adapter::{
	CreateDistSetType, CreateModuleType, DistSetType, ModuleType, UpdateDistSetTypeData,
	UpdateModuleTypeData,
};

use crate::{prelude::*, response::ApiResponse};

/// Reference to a catalog entry by id
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TypeRef {
	pub id: i64,
}

fn default_max_assignments() -> u32 {
	1
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateModuleTypeRequest {
	pub key: Box<str>,
	pub name: Box<str>,
	pub description: Option<Box<str>>,
	pub colour: Option<Box<str>>,
	#[serde(default = "default_max_assignments")]
	pub max_assignments: u32,
}

impl From<CreateModuleTypeRequest> for CreateModuleType {
	fn from(req: CreateModuleTypeRequest) -> Self {
		CreateModuleType {
			key: req.key,
			name: req.name,
			description: req.description,
			colour: req.colour,
			max_assignments: req.max_assignments,
		}
	}
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateModuleTypeRequest {
	#[serde(default)]
	pub name: Patch<Box<str>>,
	#[serde(default)]
	pub description: Patch<Box<str>>,
	#[serde(default)]
	pub colour: Patch<Box<str>>,
	#[serde(default)]
	pub max_assignments: Patch<u32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDistSetTypeRequest {
	pub key: Box<str>,
	pub name: Box<str>,
	pub description: Option<Box<str>>,
	pub colour: Option<Box<str>>,
	#[serde(default)]
	pub mandatory_module_types: Vec<TypeRef>,
	#[serde(default)]
	pub optional_module_types: Vec<TypeRef>,
}

impl From<CreateDistSetTypeRequest> for CreateDistSetType {
	fn from(req: CreateDistSetTypeRequest) -> Self {
		CreateDistSetType {
			key: req.key,
			name: req.name,
			description: req.description,
			colour: req.colour,
			mandatory: req.mandatory_module_types.iter().map(|r| r.id).collect(),
			optional: req.optional_module_types.iter().map(|r| r.id).collect(),
		}
	}
}

#[derive(Deserialize)]
pub struct UpdateDistSetTypeRequest {
	#[serde(default)]
	pub name: Patch<Box<str>>,
	#[serde(default)]
	pub description: Patch<Box<str>>,
	#[serde(default)]
	pub colour: Patch<Box<str>>,
}

// Software module types //
//***********************//
/// GET /softwaremoduletypes - Paged listing with `offset`, `limit`, `sort` and `q`
pub async fn list_module_types(
	State(app): State<App>,
	tn_id: TnId,
	OptionalRequestId(req_id): OptionalRequestId,
	Query(params): Query<ListParams>,
) -> FbResult<(StatusCode, Json<ApiResponse<Vec<ModuleType>>>)> {
	let page = app.catalog.list_module_types(tn_id, &params).await?;
	let response = ApiResponse::page(page).with_req_id(req_id);

	Ok((StatusCode::OK, Json(response)))
}

/// POST /softwaremoduletypes - Bulk create
pub async fn post_module_types(
	State(app): State<App>,
	tn_id: TnId,
	OptionalRequestId(req_id): OptionalRequestId,
	Json(req): Json<Vec<CreateModuleTypeRequest>>,
) -> FbResult<(StatusCode, Json<ApiResponse<Vec<ModuleType>>>)> {
	info!(tn_id = ?tn_id, count = req.len(), "POST /softwaremoduletypes - Creating module types");

	let types: Vec<CreateModuleType> = req.into_iter().map(CreateModuleType::from).collect();
	let created = app.catalog.create_module_types(tn_id, &types).await?;

	Ok((StatusCode::CREATED, Json(ApiResponse::new(created).with_req_id(req_id))))
}

pub async fn get_module_type(
	State(app): State<App>,
	tn_id: TnId,
	Path(smt_id): Path<i64>,
	OptionalRequestId(req_id): OptionalRequestId,
) -> FbResult<(StatusCode, Json<ApiResponse<ModuleType>>)> {
	let smt = app.catalog.get_module_type(tn_id, smt_id).await?;
	Ok((StatusCode::OK, Json(ApiResponse::new(smt).with_req_id(req_id))))
}

/// PUT /softwaremoduletypes/{id} - Partial update of base fields
pub async fn put_module_type(
	State(app): State<App>,
	tn_id: TnId,
	Path(smt_id): Path<i64>,
	OptionalRequestId(req_id): OptionalRequestId,
	Json(req): Json<UpdateModuleTypeRequest>,
) -> FbResult<(StatusCode, Json<ApiResponse<ModuleType>>)> {
	info!(tn_id = ?tn_id, smt_id = smt_id, "PUT /softwaremoduletypes - Updating module type");

	let data = UpdateModuleTypeData {
		name: req.name,
		description: req.description,
		colour: req.colour,
		max_assignments: req.max_assignments,
	};
	let smt = app.catalog.update_module_type(tn_id, smt_id, &data).await?;

	Ok((StatusCode::OK, Json(ApiResponse::new(smt).with_req_id(req_id))))
}

pub async fn delete_module_type(
	State(app): State<App>,
	tn_id: TnId,
	Path(smt_id): Path<i64>,
) -> FbResult<StatusCode> {
	info!(tn_id = ?tn_id, smt_id = smt_id, "DELETE /softwaremoduletypes - Deleting module type");

	app.catalog.delete_module_type(tn_id, smt_id).await?;
	Ok(StatusCode::NO_CONTENT)
}

// Distribution set types //
//************************//
/// GET /distributionsettypes - Paged listing with `offset`, `limit`, `sort` and `q`
pub async fn list_dist_types(
	State(app): State<App>,
	tn_id: TnId,
	OptionalRequestId(req_id): OptionalRequestId,
	Query(params): Query<ListParams>,
) -> FbResult<(StatusCode, Json<ApiResponse<Vec<DistSetType>>>)> {
	let page = app.catalog.list_dist_types(tn_id, &params).await?;
	let response = ApiResponse::page(page).with_req_id(req_id);

	Ok((StatusCode::OK, Json(response)))
}

/// POST /distributionsettypes - Bulk create with initial membership
pub async fn post_dist_types(
	State(app): State<App>,
	tn_id: TnId,
	OptionalRequestId(req_id): OptionalRequestId,
	Json(req): Json<Vec<CreateDistSetTypeRequest>>,
) -> FbResult<(StatusCode, Json<ApiResponse<Vec<DistSetType>>>)> {
	info!(tn_id = ?tn_id, count = req.len(), "POST /distributionsettypes - Creating distribution set types");

	let types: Vec<CreateDistSetType> = req.into_iter().map(CreateDistSetType::from).collect();
	let created = app.catalog.create_dist_types(tn_id, &types).await?;

	Ok((StatusCode::CREATED, Json(ApiResponse::new(created).with_req_id(req_id))))
}

pub async fn get_dist_type(
	State(app): State<App>,
	tn_id: TnId,
	Path(dst_id): Path<i64>,
	OptionalRequestId(req_id): OptionalRequestId,
) -> FbResult<(StatusCode, Json<ApiResponse<DistSetType>>)> {
	let dst = app.catalog.get_dist_type(tn_id, dst_id).await?;
	Ok((StatusCode::OK, Json(ApiResponse::new(dst).with_req_id(req_id))))
}

/// PUT /distributionsettypes/{id} - Partial update of base fields, membership is untouched
pub async fn put_dist_type(
	State(app): State<App>,
	tn_id: TnId,
	Path(dst_id): Path<i64>,
	OptionalRequestId(req_id): OptionalRequestId,
	Json(req): Json<UpdateDistSetTypeRequest>,
) -> FbResult<(StatusCode, Json<ApiResponse<DistSetType>>)> {
	info!(tn_id = ?tn_id, dst_id = dst_id, "PUT /distributionsettypes - Updating distribution set type");

	let data = UpdateDistSetTypeData {
		name: req.name,
		description: req.description,
		colour: req.colour,
	};
	let dst = app.catalog.update_dist_type(tn_id, dst_id, &data).await?;

	Ok((StatusCode::OK, Json(ApiResponse::new(dst).with_req_id(req_id))))
}

pub async fn delete_dist_type(
	State(app): State<App>,
	tn_id: TnId,
	Path(dst_id): Path<i64>,
) -> FbResult<StatusCode> {
	info!(tn_id = ?tn_id, dst_id = dst_id, "DELETE /distributionsettypes - Deleting distribution set type");

	app.catalog.delete_dist_type(tn_id, dst_id).await?;
	Ok(StatusCode::NO_CONTENT)
}

// vim: ts=4
