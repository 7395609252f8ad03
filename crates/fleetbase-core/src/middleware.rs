//! Request middleware

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};

use crate::extract::RequestId;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Tag every request with an id, reusing one sent by the caller
pub async fn request_id(mut req: Request, next: Next) -> Response {
	let id = req
		.headers()
		.get(REQUEST_ID_HEADER)
		.and_then(|h| h.to_str().ok())
		.filter(|id| !id.is_empty() && id.len() <= 64)
		.map_or_else(|| uuid::Uuid::new_v4().to_string(), str::to_string);

	req.extensions_mut().insert(RequestId(id.clone()));
	let mut res = next.run(req).await;
	if let Ok(value) = HeaderValue::from_str(&id) {
		res.headers_mut().insert(REQUEST_ID_HEADER, value);
	}
	res
}

// vim: ts=4
