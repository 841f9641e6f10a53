//! Sync event entity
//!
//! The event log is append-only: rows are inserted by push and never updated
//! or deleted. `seq` comes from the global sequencer and is unique across all
//! tenants; `client_id` is unique within a tenant.

use crate::domain::{PulledEvent, Role};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sync_event")]
pub struct Model {
	/// Server-assigned identity (`serverId`)
	#[sea_orm(primary_key, auto_increment = false)]
	pub id: Uuid,

	#[sea_orm(indexed)]
	pub owner_role: Role,
	#[sea_orm(indexed)]
	pub owner_identifier: String,

	/// Client idempotency key
	pub client_id: String,

	pub event_type: String,
	pub actor_role: Role,

	#[sea_orm(column_type = "Json")]
	pub payload: Json,

	pub occurred_at: DateTimeUtc,

	/// Global sequence number
	#[sea_orm(unique)]
	pub seq: i64,

	pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
	pub fn sequence(&self) -> u64 {
		self.seq as u64
	}

	/// Leaf string folded into the daily audit digest
	pub fn audit_leaf(&self) -> String {
		format!("{}:{}", self.id, self.seq)
	}
}

impl From<Model> for PulledEvent {
	fn from(model: Model) -> Self {
		Self {
			seq: model.sequence(),
			id: model.client_id,
			event_type: model.event_type,
			payload: model.payload,
			occurred_at: model.occurred_at,
			actor_role: model.actor_role,
		}
	}
}
