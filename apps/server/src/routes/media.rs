use super::AppState;
use crate::{auth::Authenticated, error::ApiError};
use agrisync_core::domain::{MediaDeclaration, PresignedUpload};
use axum::{
	extract::{rejection::JsonRejection, State},
	Json,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct PrepareRequest {
	files: Vec<MediaDeclaration>,
}

#[derive(Debug, Serialize)]
pub struct PrepareResponse {
	uploads: Vec<PresignedUpload>,
}

/// Upload slots for files not tied to a pushed event
pub async fn prepare(
	State(state): State<AppState>,
	Authenticated(principal): Authenticated,
	body: Result<Json<PrepareRequest>, JsonRejection>,
) -> Result<Json<PrepareResponse>, ApiError> {
	let Json(request) = body.map_err(|e| ApiError::Validation(e.body_text()))?;

	let uploads = state
		.core
		.sync()
		.media()
		.prepare(&principal.tenant, &request.files)
		.await?;

	Ok(Json(PrepareResponse { uploads }))
}
