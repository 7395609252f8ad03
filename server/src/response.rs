//! Response envelope shared by every API endpoint

use serde::Serialize;
use serde_with::skip_serializing_none;

use fleetbase_core::query::Page;

#[derive(Debug, Clone, Serialize)]
pub struct Pagination {
	pub offset: u64,
	pub limit: u32,
	pub total: u64,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
	pub data: T,
	pub pagination: Option<Pagination>,
	pub req_id: Option<String>,
}

impl<T> ApiResponse<T> {
	pub fn new(data: T) -> Self {
		Self { data, pagination: None, req_id: None }
	}

	pub fn with_pagination(data: T, offset: u64, limit: u32, total: u64) -> Self {
		Self { data, pagination: Some(Pagination { offset, limit, total }), req_id: None }
	}

	pub fn with_req_id(mut self, req_id: Option<String>) -> Self {
		self.req_id = req_id;
		self
	}
}

impl<T> ApiResponse<Vec<T>> {
	/// Envelope of one listing window
	pub fn page(page: Page<T>) -> Self {
		Self::with_pagination(page.items, page.offset, page.limit, page.total)
	}
}

// vim: ts=4
