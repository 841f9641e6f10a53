//! Tenant partitioning
//!
//! Every read and write is scoped to a `(ownerRole, ownerIdentifier)` pair handed
//! to us by the authentication layer. Nothing here validates credentials.

use sea_orm::entity::prelude::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Roles a principal can hold on the platform
#[derive(
	Debug,
	Clone,
	Copy,
	PartialEq,
	Eq,
	Hash,
	EnumIter,
	DeriveActiveEnum,
	Serialize,
	Deserialize,
	strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
	#[sea_orm(string_value = "farmer")]
	Farmer,
	#[sea_orm(string_value = "cooperative")]
	Cooperative,
	#[sea_orm(string_value = "exporter")]
	Exporter,
	#[sea_orm(string_value = "field_agent")]
	FieldAgent,
	#[sea_orm(string_value = "admin")]
	Admin,
}

/// The partition key for all synced data
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantKey {
	#[serde(rename = "ownerRole")]
	pub role: Role,
	#[serde(rename = "ownerIdentifier")]
	pub identifier: String,
}

impl TenantKey {
	pub fn new(role: Role, identifier: impl Into<String>) -> Self {
		Self {
			role,
			identifier: identifier.into(),
		}
	}
}

impl fmt::Display for TenantKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}", self.role, self.identifier)
	}
}

/// An authenticated caller
///
/// `actor_role` is recorded on every event the principal submits and may differ
/// from the tenant's owner role (e.g. a field agent acting for a cooperative).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
	pub tenant: TenantKey,
	pub actor_role: Role,
}

impl Principal {
	/// A principal acting as the owner of its own tenant
	pub fn owner(role: Role, identifier: impl Into<String>) -> Self {
		Self {
			tenant: TenantKey::new(role, identifier),
			actor_role: role,
		}
	}

	pub fn acting_as(mut self, actor_role: Role) -> Self {
		self.actor_role = actor_role;
		self
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn role_uses_snake_case_everywhere() {
		assert_eq!(Role::FieldAgent.to_string(), "field_agent");
		assert_eq!(
			serde_json::to_value(Role::FieldAgent).unwrap(),
			serde_json::json!("field_agent")
		);
		assert_eq!(
			serde_json::from_value::<Role>(serde_json::json!("cooperative")).unwrap(),
			Role::Cooperative
		);
		assert!(serde_json::from_value::<Role>(serde_json::json!("superuser")).is_err());
	}

	#[test]
	fn acting_as_keeps_tenant() {
		let principal = Principal::owner(Role::Cooperative, "coop-17").acting_as(Role::FieldAgent);
		assert_eq!(principal.tenant, TenantKey::new(Role::Cooperative, "coop-17"));
		assert_eq!(principal.actor_role, Role::FieldAgent);
		assert_eq!(principal.tenant.to_string(), "cooperative:coop-17");
	}
}
