//! Composition handlers

use axum::{
	Json,
	extract::{Path, State},
	http::StatusCode,
};

use fleetbase_core::composition::MemberKind;
use fleetbase_types::meta_adapter::{DistSetType, ModuleType};

use crate::{catalog::handler::TypeRef, prelude::*, response::ApiResponse};

async fn list_members(
	app: &App,
	tn_id: TnId,
	dst_id: i64,
	kind: MemberKind,
	req_id: Option<String>,
) -> FbResult<(StatusCode, Json<ApiResponse<Vec<ModuleType>>>)> {
	let members = app.composition.list_members(tn_id, dst_id, kind).await?;
	let total = members.len() as u64;
	let limit = u32::try_from(members.len()).unwrap_or(u32::MAX);
	let response = ApiResponse::with_pagination(members, 0, limit, total).with_req_id(req_id);

	Ok((StatusCode::OK, Json(response)))
}

async fn get_member(
	app: &App,
	tn_id: TnId,
	(dst_id, smt_id): (i64, i64),
	kind: MemberKind,
	req_id: Option<String>,
) -> FbResult<(StatusCode, Json<ApiResponse<ModuleType>>)> {
	let smt = app.composition.get_member(tn_id, dst_id, kind, smt_id).await?;
	Ok((StatusCode::OK, Json(ApiResponse::new(smt).with_req_id(req_id))))
}

async fn add_member(
	app: &App,
	tn_id: TnId,
	dst_id: i64,
	kind: MemberKind,
	smt: TypeRef,
	req_id: Option<String>,
) -> FbResult<(StatusCode, Json<ApiResponse<DistSetType>>)> {
	info!(
		tn_id = ?tn_id, dst_id = dst_id, smt_id = smt.id, kind = kind.name(),
		"POST /distributionsettypes - Adding module type"
	);

	let dst = app.composition.add_member(tn_id, dst_id, kind, smt.id).await?;
	Ok((StatusCode::OK, Json(ApiResponse::new(dst).with_req_id(req_id))))
}

async fn remove_member(
	app: &App,
	tn_id: TnId,
	(dst_id, smt_id): (i64, i64),
	kind: MemberKind,
) -> FbResult<StatusCode> {
	info!(
		tn_id = ?tn_id, dst_id = dst_id, smt_id = smt_id, kind = kind.name(),
		"DELETE /distributionsettypes - Removing module type"
	);

	app.composition.remove_member(tn_id, dst_id, kind, smt_id).await?;
	Ok(StatusCode::NO_CONTENT)
}

// Mandatory //
//***********//
pub async fn list_mandatory(
	State(app): State<App>,
	tn_id: TnId,
	Path(dst_id): Path<i64>,
	OptionalRequestId(req_id): OptionalRequestId,
) -> FbResult<(StatusCode, Json<ApiResponse<Vec<ModuleType>>>)> {
	list_members(&app, tn_id, dst_id, MemberKind::Mandatory, req_id).await
}

pub async fn post_mandatory(
	State(app): State<App>,
	tn_id: TnId,
	Path(dst_id): Path<i64>,
	OptionalRequestId(req_id): OptionalRequestId,
	Json(smt): Json<TypeRef>,
) -> FbResult<(StatusCode, Json<ApiResponse<DistSetType>>)> {
	add_member(&app, tn_id, dst_id, MemberKind::Mandatory, smt, req_id).await
}

pub async fn get_mandatory(
	State(app): State<App>,
	tn_id: TnId,
	Path(ids): Path<(i64, i64)>,
	OptionalRequestId(req_id): OptionalRequestId,
) -> FbResult<(StatusCode, Json<ApiResponse<ModuleType>>)> {
	get_member(&app, tn_id, ids, MemberKind::Mandatory, req_id).await
}

pub async fn delete_mandatory(
	State(app): State<App>,
	tn_id: TnId,
	Path(ids): Path<(i64, i64)>,
) -> FbResult<StatusCode> {
	remove_member(&app, tn_id, ids, MemberKind::Mandatory).await
}

// Optional //
//**********//
pub async fn list_optional(
	State(app): State<App>,
	tn_id: TnId,
	Path(dst_id): Path<i64>,
	OptionalRequestId(req_id): OptionalRequestId,
) -> FbResult<(StatusCode, Json<ApiResponse<Vec<ModuleType>>>)> {
	list_members(&app, tn_id, dst_id, MemberKind::Optional, req_id).await
}

pub async fn post_optional(
	State(app): State<App>,
	tn_id: TnId,
	Path(dst_id): Path<i64>,
	OptionalRequestId(req_id): OptionalRequestId,
	Json(smt): Json<TypeRef>,
) -> FbResult<(StatusCode, Json<ApiResponse<DistSetType>>)> {
	add_member(&app, tn_id, dst_id, MemberKind::Optional, smt, req_id).await
}

pub async fn get_optional(
	State(app): State<App>,
	tn_id: TnId,
	Path(ids): Path<(i64, i64)>,
	OptionalRequestId(req_id): OptionalRequestId,
) -> FbResult<(StatusCode, Json<ApiResponse<ModuleType>>)> {
	get_member(&app, tn_id, ids, MemberKind::Optional, req_id).await
}

pub async fn delete_optional(
	State(app): State<App>,
	tn_id: TnId,
	Path(ids): Path<(i64, i64)>,
) -> FbResult<StatusCode> {
	remove_member(&app, tn_id, ids, MemberKind::Optional).await
}

// vim: ts=4
