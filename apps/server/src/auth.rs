//! Bearer token resolution
//!
//! Credentials are issued elsewhere. All this server needs is the principal a
//! token stands for; tenant keys are never read from request bodies.

use crate::{error::ApiError, routes::AppState};
use agrisync_core::{config::AuthConfig, domain::Principal};
use axum::{async_trait, extract::FromRequestParts, http::request::Parts, RequestPartsExt};
use axum_extra::{
	headers::{authorization::Bearer, Authorization},
	TypedHeader,
};
use std::collections::HashMap;
use tracing::debug;

pub trait Authenticator: Send + Sync {
	fn authenticate(&self, token: &str) -> Option<Principal>;
}

/// Fixed token list from the config file
#[derive(Debug, Default)]
pub struct StaticTokens {
	grants: HashMap<String, Principal>,
}

impl StaticTokens {
	pub fn from_config(config: &AuthConfig) -> Self {
		let grants = config
			.tokens
			.iter()
			.map(|grant| {
				let principal = Principal::owner(grant.owner_role, grant.owner_identifier.clone())
					.acting_as(grant.actor_role.unwrap_or(grant.owner_role));
				(grant.token.clone(), principal)
			})
			.collect();

		Self { grants }
	}

	pub fn is_empty(&self) -> bool {
		self.grants.is_empty()
	}
}

impl Authenticator for StaticTokens {
	fn authenticate(&self, token: &str) -> Option<Principal> {
		self.grants.get(token).cloned()
	}
}

/// The caller, resolved from `Authorization: Bearer <token>`
pub struct Authenticated(pub Principal);

#[async_trait]
impl FromRequestParts<AppState> for Authenticated {
	type Rejection = ApiError;

	async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
		let TypedHeader(auth) = parts
			.extract::<TypedHeader<Authorization<Bearer>>>()
			.await
			.map_err(|_| ApiError::Unauthorized)?;

		match state.auth.authenticate(auth.token()) {
			Some(principal) => Ok(Authenticated(principal)),
			None => {
				debug!(path = %parts.uri.path(), "Rejected unknown bearer token");
				Err(ApiError::Unauthorized)
			}
		}
	}
}
