use crate::auth::Authenticator;
use agrisync_core::Core;
use axum::{
	http::StatusCode,
	routing::{get, post},
	Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

mod jobs;
mod media;
mod sync;

#[derive(Clone)]
pub struct AppState {
	pub core: Arc<Core>,
	pub auth: Arc<dyn Authenticator>,
}

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(|| async { "OK" }))
		.route("/sync/push", post(sync::push))
		.route("/sync/pull", get(sync::pull))
		.route("/media/prepare", post(media::prepare))
		.route("/jobs/merkle", get(jobs::get))
		.route("/jobs/merkle/run", post(jobs::run))
		.route("/jobs/merkle/verify", get(jobs::verify))
		.fallback(|| async {
			(
				StatusCode::NOT_FOUND,
				Json(json!({ "error": "no such endpoint" })),
			)
		})
		.layer(TraceLayer::new_for_http())
		.layer(CorsLayer::permissive())
		.with_state(state)
}
