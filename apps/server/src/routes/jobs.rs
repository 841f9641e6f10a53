//! Audit anchor endpoints

use super::AppState;
use crate::{auth::Authenticated, error::ApiError};
use agrisync_core::service::{anchor::parse_anchor_date, AnchorReport, VerifyOutcome};
use axum::{
	extract::{rejection::QueryRejection, Query, State},
	Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct DateParams {
	date: Option<String>,
}

impl DateParams {
	fn from_query(params: Result<Query<DateParams>, QueryRejection>) -> Result<Self, ApiError> {
		params
			.map(|Query(params)| params)
			.map_err(|e| ApiError::Validation(e.body_text()))
	}

	fn date(&self) -> Result<Option<NaiveDate>, ApiError> {
		Ok(self.date.as_deref().map(parse_anchor_date).transpose()?)
	}

	fn date_or_today(&self) -> Result<NaiveDate, ApiError> {
		Ok(self.date()?.unwrap_or_else(|| Utc::now().date_naive()))
	}
}

pub async fn run(
	State(state): State<AppState>,
	Authenticated(principal): Authenticated,
	params: Result<Query<DateParams>, QueryRejection>,
) -> Result<Json<AnchorReport>, ApiError> {
	let date = DateParams::from_query(params)?.date()?;

	let report = state.core.anchor().run(&principal.tenant, date).await?;

	Ok(Json(report))
}

pub async fn get(
	State(state): State<AppState>,
	Authenticated(principal): Authenticated,
	params: Result<Query<DateParams>, QueryRejection>,
) -> Result<Json<AnchorReport>, ApiError> {
	let date = DateParams::from_query(params)?.date_or_today()?;

	state
		.core
		.anchor()
		.get(&principal.tenant, date)
		.await?
		.map(Json)
		.ok_or_else(|| ApiError::NotFound(format!("no anchor for {date}")))
}

pub async fn verify(
	State(state): State<AppState>,
	Authenticated(principal): Authenticated,
	params: Result<Query<DateParams>, QueryRejection>,
) -> Result<Json<VerifyOutcome>, ApiError> {
	let date = DateParams::from_query(params)?.date_or_today()?;

	let outcome = state.core.anchor().verify(&principal.tenant, date).await?;

	Ok(Json(outcome))
}
