//! Mapping of service failures onto HTTP responses
//!
//! Every error leaves as `{"error": "<message>"}`.

use agrisync_core::service::{AnchorError, MediaError, SyncError};
use axum::{
	http::StatusCode,
	response::{IntoResponse, Response},
	Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum ApiError {
	#[error("missing or invalid bearer token")]
	Unauthorized,

	#[error("{0}")]
	Validation(String),

	#[error("{0}")]
	NotFound(String),

	#[error(transparent)]
	Sync(#[from] SyncError),

	#[error(transparent)]
	Media(#[from] MediaError),

	#[error(transparent)]
	Anchor(#[from] AnchorError),
}

impl ApiError {
	pub fn status(&self) -> StatusCode {
		match self {
			ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
			ApiError::Validation(_) => StatusCode::BAD_REQUEST,
			ApiError::NotFound(_) => StatusCode::NOT_FOUND,
			ApiError::Sync(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
			ApiError::Media(MediaError::SizeOutOfRange(_)) => StatusCode::BAD_REQUEST,
			ApiError::Anchor(AnchorError::InvalidDate(_) | AnchorError::DayOutOfRange(_)) => {
				StatusCode::BAD_REQUEST
			}
			ApiError::Sync(_) | ApiError::Media(_) | ApiError::Anchor(_) => {
				StatusCode::INTERNAL_SERVER_ERROR
			}
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let status = self.status();
		if status.is_server_error() {
			error!(error = %self, "Request failed");
		}

		(status, Json(json!({ "error": self.to_string() }))).into_response()
	}
}
