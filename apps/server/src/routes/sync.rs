use super::AppState;
use crate::{auth::Authenticated, error::ApiError};
use agrisync_core::{
	domain::{PullPage, PushOutcome},
	service::PushRequest,
};
use axum::{
	extract::{
		rejection::{JsonRejection, QueryRejection},
		Query, State,
	},
	Json,
};
use serde::Deserialize;
use serde_json::Value;

pub async fn push(
	State(state): State<AppState>,
	Authenticated(principal): Authenticated,
	body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<PushOutcome>, ApiError> {
	let Json(body) = body.map_err(|e| ApiError::Validation(e.body_text()))?;
	let request = PushRequest::from_value(body)?;

	let outcome = state.core.sync().push(&principal, request).await?;

	Ok(Json(outcome))
}

#[derive(Debug, Deserialize)]
pub struct PullParams {
	since: Option<u64>,
}

pub async fn pull(
	State(state): State<AppState>,
	Authenticated(principal): Authenticated,
	params: Result<Query<PullParams>, QueryRejection>,
) -> Result<Json<PullPage>, ApiError> {
	let Query(params) = params.map_err(|e| ApiError::Validation(e.body_text()))?;

	let page = state
		.core
		.sync()
		.pull(&principal.tenant, params.since)
		.await?;

	Ok(Json(page))
}
