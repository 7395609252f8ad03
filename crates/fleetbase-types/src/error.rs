//! Error type shared by the engine, the adapters and the REST binding.
//!
//! Every failure the engine reports maps to exactly one variant here. The
//! binding renders each variant with its own machine-readable code, so callers
//! can tell e.g. a mandatory/optional overlap (`Conflict`) from a locked
//! composition (`Immutable`) without parsing messages.

use axum::{
	Json,
	http::{StatusCode, header},
	response::{IntoResponse, Response},
};
use serde::Serialize;

pub type FbResult<T> = std::result::Result<T, Error>;

/// Seconds a client should wait before retrying a transient failure
const RETRY_AFTER_SECS: &str = "1";

#[derive(Debug)]
pub enum Error {
	/// Configuration key is not part of the registry
	UnknownKey(Box<str>),
	/// Candidate value has a different runtime type than the key declares
	TypeMismatch(String),
	/// Value or request field rejected by a validator
	ValidationError(String),
	NotFound,
	/// Uniqueness violation or mandatory/optional overlap
	Conflict(String),
	/// Composition is locked because deployable sets reference the type
	Immutable,
	/// Deletion blocked by a remaining reference
	InUse(String),
	/// Malformed sort or filter expression
	InvalidQuery(String),
	/// Storage backend failed or is unavailable. The only retryable kind.
	DbError,

	PermissionDenied,
	ConfigError(String),
	Internal(String),

	// externals
	Io(std::io::Error),
}

impl Error {
	/// Stable machine-readable code of the error kind
	pub fn code(&self) -> &'static str {
		match self {
			Error::UnknownKey(_) => "E-CFG-UNKNOWN",
			Error::TypeMismatch(_) => "E-CFG-TYPE",
			Error::ValidationError(_) => "E-VALIDATION",
			Error::NotFound => "E-NOT-FOUND",
			Error::Conflict(_) => "E-CONFLICT",
			Error::Immutable => "E-IMMUTABLE",
			Error::InUse(_) => "E-IN-USE",
			Error::InvalidQuery(_) => "E-QUERY",
			Error::DbError => "E-STORAGE",
			Error::PermissionDenied => "E-AUTH",
			Error::ConfigError(_) => "E-CONFIG",
			Error::Internal(_) | Error::Io(_) => "E-INTERNAL",
		}
	}

	pub fn status(&self) -> StatusCode {
		match self {
			Error::UnknownKey(_) | Error::NotFound => StatusCode::NOT_FOUND,
			Error::TypeMismatch(_) => StatusCode::UNPROCESSABLE_ENTITY,
			Error::ValidationError(_) | Error::InvalidQuery(_) => StatusCode::BAD_REQUEST,
			Error::Conflict(_) | Error::InUse(_) => StatusCode::CONFLICT,
			Error::Immutable => StatusCode::LOCKED,
			Error::DbError => StatusCode::SERVICE_UNAVAILABLE,
			Error::PermissionDenied => StatusCode::UNAUTHORIZED,
			Error::ConfigError(_) | Error::Internal(_) | Error::Io(_) => {
				StatusCode::INTERNAL_SERVER_ERROR
			}
		}
	}

	/// Whether the caller may retry the same operation unchanged
	pub fn is_transient(&self) -> bool {
		matches!(self, Error::DbError)
	}
}

impl std::fmt::Display for Error {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Error::UnknownKey(key) => write!(f, "unknown configuration key: {}", key),
			Error::TypeMismatch(msg) => write!(f, "type mismatch: {}", msg),
			Error::ValidationError(msg) => write!(f, "validation failed: {}", msg),
			Error::NotFound => write!(f, "not found"),
			Error::Conflict(msg) => write!(f, "conflict: {}", msg),
			Error::Immutable => {
				write!(f, "composition is locked: the type is used by deployable sets")
			}
			Error::InUse(msg) => write!(f, "in use: {}", msg),
			Error::InvalidQuery(msg) => write!(f, "invalid query: {}", msg),
			Error::DbError => write!(f, "storage unavailable"),
			Error::PermissionDenied => write!(f, "permission denied"),
			Error::ConfigError(msg) => write!(f, "configuration error: {}", msg),
			Error::Internal(msg) => write!(f, "internal error: {}", msg),
			Error::Io(err) => write!(f, "io error: {}", err),
		}
	}
}

impl std::error::Error for Error {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			Error::Io(err) => Some(err),
			_ => None,
		}
	}
}

impl From<std::io::Error> for Error {
	fn from(err: std::io::Error) -> Self {
		Self::Io(err)
	}
}

#[derive(Serialize)]
struct ErrorBody<'a> {
	code: &'a str,
	message: String,
}

#[derive(Serialize)]
struct ErrorResponse<'a> {
	error: ErrorBody<'a>,
}

impl IntoResponse for Error {
	fn into_response(self) -> Response {
		let status = self.status();
		let transient = self.is_transient();
		if transient {
			tracing::warn!("request failed, may be retried: {}", self);
		} else if status.is_server_error() {
			tracing::error!("request failed: {}", self);
		}
		let body = ErrorResponse { error: ErrorBody { code: self.code(), message: self.to_string() } };
		if transient {
			return (status, [(header::RETRY_AFTER, RETRY_AFTER_SECS)], Json(body)).into_response();
		}
		(status, Json(body)).into_response()
	}
}


// vim: ts=4
